use thiserror::Error;

/// Failures surfaced by [`crate::JsonClient`] and the typed API on top of it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("server responded with status {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limit exceeded or invalid API key")]
    ProviderRateLimited,
    #[error("provider returned no data")]
    ProviderEmptyResult,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
