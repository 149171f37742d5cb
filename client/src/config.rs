use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_SENTIMENT_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_SENTIMENT_API_KEY: &str = "demo";
/// Upper bound on a single request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the client talks to and how long it waits.
///
/// Deserializes from the `[client]` table of the dashboard config file; every
/// field is optional there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub sentiment_url: String,
    pub sentiment_api_key: String,
    #[serde(rename = "timeout_secs", deserialize_with = "de_secs")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sentiment_url: DEFAULT_SENTIMENT_URL.to_string(),
            sentiment_api_key: DEFAULT_SENTIMENT_API_KEY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn with_sentiment(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.sentiment_url = url.into();
        self.sentiment_api_key = api_key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn de_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(serde::de::Error::custom("timeout_secs must be a positive number"));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ClientConfig = toml::from_str(r#"api_url = "http://api.internal:9000""#).unwrap();
        assert_eq!(cfg.api_url, "http://api.internal:9000");
        assert_eq!(cfg.sentiment_api_key, DEFAULT_SENTIMENT_API_KEY);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_is_read_in_seconds() {
        let cfg: ClientConfig = toml::from_str("timeout_secs = 2.5").unwrap();
        assert_eq!(cfg.timeout, Duration::from_millis(2500));
        assert!(toml::from_str::<ClientConfig>("timeout_secs = 0").is_err());
    }
}
