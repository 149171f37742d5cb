//! Logical operations mapped onto concrete requests.

use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Health,
    History { symbol: &'a str, days: u32 },
    Stats { symbol: &'a str },
    Predict { symbol: &'a str },
    TopStocks,
    Indexes,
    Sentiment { symbol: &'a str },
}

/// A fully resolved request, ready for [`crate::JsonClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Predict { .. } => Method::POST,
            _ => Method::GET,
        }
    }

    pub fn request(&self, cfg: &ClientConfig) -> Result<ApiRequest> {
        let url = match *self {
            Endpoint::Health => join(&cfg.api_url, &[], &[])?,
            Endpoint::History { symbol, days } => join(
                &cfg.api_url,
                &["stock-data"],
                &[("symbol", symbol), ("days", days.to_string().as_str())],
            )?,
            Endpoint::Stats { symbol } => {
                join(&cfg.api_url, &["stock-stats"], &[("symbol", symbol)])?
            }
            Endpoint::Predict { .. } => join(&cfg.api_url, &["predict"], &[])?,
            Endpoint::TopStocks => join(&cfg.api_url, &["top-stocks"], &[])?,
            Endpoint::Indexes => join(&cfg.api_url, &["indexes"], &[])?,
            Endpoint::Sentiment { symbol } => join(
                &cfg.sentiment_url,
                &["query"],
                &[
                    ("function", "NEWS_SENTIMENT"),
                    ("tickers", symbol),
                    ("apikey", cfg.sentiment_api_key.as_str()),
                ],
            )?,
        };

        let body = match self {
            Endpoint::Predict { symbol } => Some(json!({ "symbol": symbol })),
            _ => None,
        };

        Ok(ApiRequest {
            method: self.method(),
            url,
            body,
        })
    }
}

/// Appends `segments` to whatever path `base` already carries (so a proxied
/// base like `https://host/api` keeps its prefix) and sets the query.
fn join(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{base}: cannot be a base")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
