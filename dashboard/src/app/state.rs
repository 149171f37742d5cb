use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use stockdash_client::{
    Indexes, PredictionSet, PriceBar, SentimentReading, StockStats, TopStocks,
};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const MIN_REFRESH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 300_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("ticker is empty")]
    Empty,
    #[error("ticker {0:?} contains characters other than letters, digits, '.', '-' or '^'")]
    Invalid(String),
    #[error("ticker {0:?} is longer than 12 characters")]
    TooLong(String),
}

/// Upper-cased ticker, e.g. `AAPL`, `BRK-B`, `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let s = raw.trim().to_ascii_uppercase();
        if s.is_empty() {
            return Err(SymbolError::Empty);
        }
        if s.len() > 12 {
            return Err(SymbolError::TooLong(s));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
        {
            return Err(SymbolError::Invalid(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self(DEFAULT_SYMBOL.to_string())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.0
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DataSource {
    History,
    Stats,
    Predictions,
    Sentiment,
    TopStocks,
    Indexes,
}

impl DataSource {
    pub const COUNT: usize = 6;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Keyed off the selected symbol, as opposed to market-wide listings.
    pub fn is_symbol_scoped(self) -> bool {
        !matches!(self, DataSource::TopStocks | DataSource::Indexes)
    }

    pub fn symbol_scoped() -> impl Iterator<Item = DataSource> {
        DataSource::iter().filter(|s| s.is_symbol_scoped())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// The palette actually in effect once `Theme::Auto` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualMode {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn resolve(self, system_dark: bool) -> VisualMode {
        match self {
            Theme::Light => VisualMode::Light,
            Theme::Dark => VisualMode::Dark,
            Theme::Auto if system_dark => VisualMode::Dark,
            Theme::Auto => VisualMode::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub auto_refresh: bool,
    pub refresh_interval_ms: u64,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            theme: Theme::default(),
        }
    }
}

pub fn clamp_interval(ms: u64) -> u64 {
    ms.max(MIN_REFRESH_INTERVAL_MS)
}

/// What a panel should show for its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Error,
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSlot {
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence of the most recent fetch issued for this source.
    pub latest_seq: u64,
    pub updated_at: Option<DateTime<Local>>,
}

/// Identifies one fetch; responses whose tag went stale are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub source: DataSource,
    /// Selection at issue time; `None` for market-wide sources.
    pub symbol: Option<Symbol>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    History(Vec<PriceBar>),
    Stats(StockStats),
    Predictions(PredictionSet),
    Sentiment(SentimentReading),
    TopStocks(TopStocks),
    Indexes(Indexes),
}

impl Payload {
    pub fn source(&self) -> DataSource {
        match self {
            Payload::History(_) => DataSource::History,
            Payload::Stats(_) => DataSource::Stats,
            Payload::Predictions(_) => DataSource::Predictions,
            Payload::Sentiment(_) => DataSource::Sentiment,
            Payload::TopStocks(_) => DataSource::TopStocks,
            Payload::Indexes(_) => DataSource::Indexes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub history: Option<Vec<PriceBar>>,
    pub stats: Option<StockStats>,
    pub predictions: Option<PredictionSet>,
    pub sentiment: Option<SentimentReading>,
    pub top_stocks: Option<TopStocks>,
    pub indexes: Option<Indexes>,
}

impl DashboardData {
    pub fn has(&self, source: DataSource) -> bool {
        match source {
            DataSource::History => self.history.is_some(),
            DataSource::Stats => self.stats.is_some(),
            DataSource::Predictions => self.predictions.is_some(),
            DataSource::Sentiment => self.sentiment.is_some(),
            DataSource::TopStocks => self.top_stocks.is_some(),
            DataSource::Indexes => self.indexes.is_some(),
        }
    }

    pub fn set(&mut self, payload: Payload) {
        match payload {
            Payload::History(v) => self.history = Some(v),
            Payload::Stats(v) => self.stats = Some(v),
            Payload::Predictions(v) => self.predictions = Some(v),
            Payload::Sentiment(v) => self.sentiment = Some(v),
            Payload::TopStocks(v) => self.top_stocks = Some(v),
            Payload::Indexes(v) => self.indexes = Some(v),
        }
    }

    pub fn clear(&mut self, source: DataSource) {
        match source {
            DataSource::History => self.history = None,
            DataSource::Stats => self.stats = None,
            DataSource::Predictions => self.predictions = None,
            DataSource::Sentiment => self.sentiment = None,
            DataSource::TopStocks => self.top_stocks = None,
            DataSource::Indexes => self.indexes = None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub symbol: Symbol,
    pub data: DashboardData,
    pub slots: [SourceSlot; DataSource::COUNT],
    pub prefs: Preferences,
    pub visual_mode: VisualMode,
    /// Set while the failure guard's fallback view is showing.
    pub crashed: Option<String>,
    pub status_line: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            symbol: Symbol::default(),
            data: DashboardData::default(),
            slots: Default::default(),
            prefs: Preferences::default(),
            visual_mode: VisualMode::default(),
            crashed: None,
            status_line: String::new(),
        }
    }
}

impl AppState {
    pub fn slot(&self, source: DataSource) -> &SourceSlot {
        &self.slots[source.index()]
    }

    pub fn slot_mut(&mut self, source: DataSource) -> &mut SourceSlot {
        &mut self.slots[source.index()]
    }

    pub fn loading(&self, source: DataSource) -> bool {
        self.slot(source).loading
    }

    pub fn error(&self, source: DataSource) -> Option<&str> {
        self.slot(source).error.as_deref()
    }

    pub fn status(&self, source: DataSource) -> FetchStatus {
        let slot = self.slot(source);
        if slot.loading {
            FetchStatus::Loading
        } else if slot.error.is_some() {
            FetchStatus::Error
        } else if self.data.has(source) {
            FetchStatus::Ready
        } else {
            FetchStatus::Idle
        }
    }

    pub fn any_loading(&self) -> bool {
        self.slots.iter().any(|s| s.loading)
    }
}
