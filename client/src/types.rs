use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One daily bar from the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: String,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockStats {
    pub last: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
    /// Set by the backend, with all numbers null, when it has nothing for the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<ConfidenceInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Horizon label ("1_hour", "next_day", ...) to estimate.
pub type PredictionSet = BTreeMap<String, Prediction>;

/// Display order for the horizons the backend is known to emit; anything else sorts after.
pub const KNOWN_HORIZONS: &[&str] = &[
    "1_hour",
    "next_hour",
    "1_day",
    "next_day",
    "1_week",
    "next_week",
];

pub fn horizon_rank(label: &str) -> usize {
    KNOWN_HORIZONS
        .iter()
        .position(|h| *h == label)
        .unwrap_or(KNOWN_HORIZONS.len())
}

/// "next_day" / "1_day" -> "1 day"
pub fn horizon_title(label: &str) -> String {
    let trimmed = label.strip_prefix("next_").map(|rest| format!("1_{rest}"));
    trimmed.as_deref().unwrap_or(label).replace('_', " ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopStock {
    pub symbol: String,
    pub price: Option<f64>,
}

/// Top-stocks listing. The backend has shipped both a list of records and a
/// symbol -> price object; both decode into the same shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct TopStocks(pub Vec<TopStock>);

#[derive(Deserialize)]
#[serde(untagged)]
enum TopStocksWire {
    List(Vec<TopStock>),
    Map(BTreeMap<String, Option<f64>>),
}

impl<'de> Deserialize<'de> for TopStocks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match TopStocksWire::deserialize(deserializer)? {
            TopStocksWire::List(items) => TopStocks(items),
            TopStocksWire::Map(map) => TopStocks(
                map.into_iter()
                    .map(|(symbol, price)| TopStock { symbol, price })
                    .collect(),
            ),
        })
    }
}

/// Index name ("DOW", "S&P500") to latest close.
pub type Indexes = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    RateLimited,
    NoData,
    Error,
}

impl SentimentLabel {
    /// Labels describing what happened to the request rather than the market.
    pub fn is_outcome(self) -> bool {
        matches!(
            self,
            SentimentLabel::RateLimited | SentimentLabel::NoData | SentimentLabel::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::RateLimited => "Rate limit exceeded or invalid API key",
            SentimentLabel::NoData => "No sentiment data available",
            SentimentLabel::Error => "Error fetching sentiment",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub score: Option<f64>,
    pub label: SentimentLabel,
}

impl SentimentReading {
    pub fn outcome(label: SentimentLabel) -> Self {
        Self { score: None, label }
    }
}
