//! News-sentiment provider (Alpha Vantage `NEWS_SENTIMENT`).
//!
//! The provider answers throttling and bad keys with a 200 carrying a
//! `Note` / `Information` / `Error Message` field instead of a feed, so the
//! body has to be inspected before it can be trusted.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::types::{SentimentLabel, SentimentReading};

const MARKER_KEYS: &[&str] = &["Note", "Information", "Error Message"];

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    overall_sentiment_score: Option<Value>,
    #[serde(default)]
    overall_sentiment_label: Option<String>,
}

/// Turns a provider body into a reading, or the provider-side failure it encodes.
pub fn parse_feed(body: &Value) -> Result<SentimentReading> {
    if let Some(marker) = MARKER_KEYS.iter().find_map(|k| body.get(*k)) {
        debug!("sentiment provider marker: {marker}");
        return Err(ClientError::ProviderRateLimited);
    }

    let feed = body
        .get("feed")
        .and_then(Value::as_array)
        .ok_or(ClientError::ProviderEmptyResult)?;
    let first = feed.first().ok_or(ClientError::ProviderEmptyResult)?;
    let item: FeedItem = serde_json::from_value(first.clone())?;

    let score = item.overall_sentiment_score.as_ref().and_then(score_of);
    let label = match item.overall_sentiment_label.as_deref() {
        Some(raw) => classify(raw),
        None => score.map(classify_score).unwrap_or(SentimentLabel::Neutral),
    };
    Ok(SentimentReading { score, label })
}

/// Maps a failed provider call onto the reading the sentiment panel shows.
///
/// Only provider-side outcomes become readings; transport and HTTP failures
/// stay errors so the caller can record them against the source.
pub fn reading_for(err: &ClientError) -> Option<SentimentReading> {
    match err {
        ClientError::ProviderRateLimited | ClientError::Http { status: 429 } => {
            Some(SentimentReading::outcome(SentimentLabel::RateLimited))
        }
        ClientError::ProviderEmptyResult => Some(SentimentReading::outcome(SentimentLabel::NoData)),
        _ => None,
    }
}

/// The provider scores in [-1, 1] and labels with Bullish/Bearish variants.
fn classify(raw: &str) -> SentimentLabel {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("bullish") || lower.contains("positive") {
        SentimentLabel::Positive
    } else if lower.contains("bearish") || lower.contains("negative") {
        SentimentLabel::Negative
    } else {
        if lower != "neutral" {
            warn!("unknown sentiment label {raw:?}, treating as neutral");
        }
        SentimentLabel::Neutral
    }
}

fn classify_score(score: f64) -> SentimentLabel {
    if score >= 0.15 {
        SentimentLabel::Positive
    } else if score <= -0.15 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

fn score_of(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|s: &f64| s.is_finite())
}
