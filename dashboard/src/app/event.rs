use stockdash_client::ClientError;

use super::state::{DataSource, Payload, RequestTag, Symbol, Theme};

#[derive(Debug, Clone)]
pub enum AppEvent {
    Ui(UiEvent),
    Fetch(FetchEvent),
    Timer(TimerEvent),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SymbolSelected { symbol: Symbol },
    AutoRefreshChanged { enabled: bool },
    RefreshIntervalChanged { ms: u64 },
    ThemeChanged { theme: Theme },
    RefreshRequested,
    RetryRequested { source: DataSource },
    ClearErrors,
    /// Leave the fallback view shown after a render failure.
    ResetView,
    HelpRequested,
}

/// A finished fetch, posted back by the task that ran it.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Succeeded { tag: RequestTag, payload: Payload },
    Failed { tag: RequestTag, error: ClientError },
}

impl FetchEvent {
    pub fn tag(&self) -> &RequestTag {
        match self {
            FetchEvent::Succeeded { tag, .. } | FetchEvent::Failed { tag, .. } => tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Auto-refresh tick from the timer identified by `generation`.
    Refresh { generation: u64 },
}

/// Transitions the reducer understands. Every change to [`super::AppState`]
/// goes through one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectSymbol(Symbol),
    BeginFetch(DataSource),
    FetchSucceeded(Payload),
    FetchFailed { source: DataSource, message: String },
    SetAutoRefresh(bool),
    SetRefreshInterval(u64),
    SetTheme { theme: Theme, system_dark: bool },
    ClearErrors,
    Crashed(String),
    ResetView,
}
