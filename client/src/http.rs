use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::endpoints::ApiRequest;
use crate::error::{ClientError, Result};

/// Timed-out JSON requests with failures folded into [`ClientError`].
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl JsonClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stockdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            timeout: cfg.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `req` and returns the parsed body.
    ///
    /// The whole exchange, body included, runs under one deadline. When it
    /// elapses the request future is dropped, which closes the connection.
    pub async fn fetch_json(&self, req: &ApiRequest) -> Result<Value> {
        debug!("{} {}", req.method, req.url);
        match tokio::time::timeout(self.timeout, self.exchange(req)).await {
            Ok(result) => {
                if let Err(err) = &result {
                    debug!("{} {} failed: {err}", req.method, req.url);
                }
                result
            }
            Err(_) => {
                debug!("{} {} timed out after {:?}", req.method, req.url, self.timeout);
                Err(ClientError::Timeout)
            }
        }
    }

    pub async fn fetch<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T> {
        let value = self.fetch_json(req).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn exchange(&self, req: &ApiRequest) -> Result<Value> {
        let mut builder = self.http.request(req.method.clone(), req.url.clone());
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{dead_addr, serve, Canned};
    use super::*;
    use crate::endpoints::Endpoint;
    use serde_json::json;

    fn client_for(addr: std::net::SocketAddr, timeout: Duration) -> (JsonClient, ClientConfig) {
        let cfg = ClientConfig::new(format!("http://{addr}")).with_timeout(timeout);
        (JsonClient::new(&cfg).unwrap(), cfg)
    }

    #[tokio::test]
    async fn returns_parsed_json_on_success() {
        let (addr, seen) = serve(vec![Canned::json(
            200,
            json!({"last": 150.0, "high": 152.0, "low": 148.5, "volume": 1000000}),
        )]);
        let (client, cfg) = client_for(addr, Duration::from_secs(5));
        let req = Endpoint::Stats { symbol: "AAPL" }.request(&cfg).unwrap();

        let value = client.fetch_json(&req).await.unwrap();
        assert_eq!(value["last"], json!(150.0));
        let seen = seen.recv().unwrap();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.url, "/stock-stats?symbol=AAPL");
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let (addr, seen) = serve(vec![Canned::json(200, json!({}))]);
        let (client, cfg) = client_for(addr, Duration::from_secs(5));
        let req = Endpoint::Predict { symbol: "AAPL" }.request(&cfg).unwrap();

        client.fetch_json(&req).await.unwrap();
        let seen = seen.recv().unwrap();
        assert_eq!(seen.method, "POST");
        let body: Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body, json!({"symbol": "AAPL"}));
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let (addr, _seen) = serve(vec![Canned::json(500, json!({"detail": "boom"}))]);
        let (client, cfg) = client_for(addr, Duration::from_secs(5));
        let req = Endpoint::Stats { symbol: "AAPL" }.request(&cfg).unwrap();

        let err = client.fetch_json(&req).await.unwrap_err();
        assert_eq!(err, ClientError::Http { status: 500 });
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let (addr, _seen) =
            serve(vec![Canned::json(200, json!([])).delayed(Duration::from_millis(800))]);
        let (client, cfg) = client_for(addr, Duration::from_millis(100));
        let req = Endpoint::TopStocks.request(&cfg).unwrap();

        let err = client.fetch_json(&req).await.unwrap_err();
        assert_eq!(err, ClientError::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let (client, cfg) = client_for(dead_addr(), Duration::from_secs(5));
        let req = Endpoint::Indexes.request(&cfg).unwrap();

        let err = client.fetch_json(&req).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let (addr, _seen) = serve(vec![Canned::raw(200, "<html>oops</html>")]);
        let (client, cfg) = client_for(addr, Duration::from_secs(5));
        let req = Endpoint::Indexes.request(&cfg).unwrap();

        let err = client.fetch_json(&req).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "got {err:?}");
    }
}
