use async_trait::async_trait;
use log::info;

use crate::config::ClientConfig;
use crate::endpoints::Endpoint;
use crate::error::Result;
use crate::http::JsonClient;
use crate::sentiment;
use crate::types::{
    Health, Indexes, PredictionSet, PriceBar, SentimentReading, StockStats, TopStocks,
};

/// Everything the dashboard asks of the outside world.
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn health(&self) -> Result<Health>;
    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>>;
    async fn stats(&self, symbol: &str) -> Result<StockStats>;
    async fn predict(&self, symbol: &str) -> Result<PredictionSet>;
    async fn top_stocks(&self) -> Result<TopStocks>;
    async fn indexes(&self) -> Result<Indexes>;
    /// Provider-side outcomes (throttling, empty feed) come back as `Ok`
    /// readings; only transport and HTTP failures are errors.
    async fn sentiment(&self, symbol: &str) -> Result<SentimentReading>;
}

/// [`MarketApi`] over HTTP: the prediction backend plus the sentiment provider.
#[derive(Debug, Clone)]
pub struct HttpMarketApi {
    cfg: ClientConfig,
    client: JsonClient,
}

impl HttpMarketApi {
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let client = JsonClient::new(&cfg)?;
        info!(
            "market api at {} (sentiment via {}, timeout {:?})",
            cfg.api_url,
            cfg.sentiment_url,
            client.timeout()
        );
        Ok(Self { cfg, client })
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn health(&self) -> Result<Health> {
        let req = Endpoint::Health.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        let req = Endpoint::History { symbol, days }.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn stats(&self, symbol: &str) -> Result<StockStats> {
        let req = Endpoint::Stats { symbol }.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn predict(&self, symbol: &str) -> Result<PredictionSet> {
        let req = Endpoint::Predict { symbol }.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn top_stocks(&self) -> Result<TopStocks> {
        let req = Endpoint::TopStocks.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn indexes(&self) -> Result<Indexes> {
        let req = Endpoint::Indexes.request(&self.cfg)?;
        self.client.fetch(&req).await
    }

    async fn sentiment(&self, symbol: &str) -> Result<SentimentReading> {
        let req = Endpoint::Sentiment { symbol }.request(&self.cfg)?;
        let outcome = match self.client.fetch_json(&req).await {
            Ok(body) => sentiment::parse_feed(&body),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(reading) => Ok(reading),
            Err(err) => sentiment::reading_for(&err).ok_or(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::http::testing::{serve, Canned};
    use crate::types::SentimentLabel;
    use serde_json::json;

    fn api_for(addr: std::net::SocketAddr) -> HttpMarketApi {
        let base = format!("http://{addr}");
        let cfg = ClientConfig::new(base.clone()).with_sentiment(base, "demo");
        HttpMarketApi::new(cfg).unwrap()
    }

    #[tokio::test]
    async fn stats_decode_into_typed_record() {
        let (addr, _seen) = serve(vec![Canned::json(
            200,
            json!({"last": 150.0, "high": 152.0, "low": 148.5, "volume": 1000000}),
        )]);
        let stats = api_for(addr).stats("AAPL").await.unwrap();
        assert_eq!(
            stats,
            StockStats {
                last: Some(150.0),
                high: Some(152.0),
                low: Some(148.5),
                volume: Some(1_000_000),
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn history_hits_stock_data_with_days() {
        let (addr, seen) = serve(vec![Canned::json(
            200,
            json!([{"date": "2024-05-01", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10}]),
        )]);
        let bars = api_for(addr).history("AAPL", 7).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(seen.recv().unwrap().url, "/stock-data?symbol=AAPL&days=7");
    }

    #[tokio::test]
    async fn rate_limited_sentiment_is_a_reading() {
        let (addr, _seen) = serve(vec![Canned::json(
            200,
            json!({"Note": "API call frequency is 5 calls per minute"}),
        )]);
        let reading = api_for(addr).sentiment("AAPL").await.unwrap();
        assert_eq!(reading.score, None);
        assert_eq!(reading.label, SentimentLabel::RateLimited);
    }

    #[tokio::test]
    async fn sentiment_server_error_stays_an_error() {
        let (addr, _seen) = serve(vec![Canned::json(502, json!({}))]);
        let err = api_for(addr).sentiment("AAPL").await.unwrap_err();
        assert_eq!(err, ClientError::Http { status: 502 });
    }

    #[tokio::test]
    async fn malformed_stats_is_decode_error() {
        let (addr, _seen) = serve(vec![Canned::json(200, json!(["not", "stats"]))]);
        let err = api_for(addr).stats("AAPL").await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
