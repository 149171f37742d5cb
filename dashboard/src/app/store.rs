use serde_json::json;
use tracing::{debug, info};

use super::event::{Action, FetchEvent};
use super::reducer;
use super::state::*;
use crate::debug_hooks;
use crate::persist::{
    Persistence, KEY_AUTO_REFRESH, KEY_REFRESH_INTERVAL, KEY_SYMBOL, KEY_THEME,
};

/// The application state plus the named actions allowed to change it.
///
/// Owned by the runtime loop; nothing else holds a mutable reference, so the
/// transitions apply strictly in dispatch order.
pub struct Store {
    state: AppState,
    prefs: Persistence,
    system_dark: bool,
}

impl Store {
    /// Seeds state from stored preferences, falling back to defaults per key.
    pub fn boot(prefs: Persistence, default_symbol: Symbol, system_dark: bool) -> Self {
        let mut state = AppState {
            symbol: prefs.load_as::<Symbol>(KEY_SYMBOL).unwrap_or(default_symbol),
            ..AppState::default()
        };
        if let Some(enabled) = prefs.load_as::<bool>(KEY_AUTO_REFRESH) {
            state.prefs.auto_refresh = enabled;
        }
        if let Some(ms) = prefs.load_as::<u64>(KEY_REFRESH_INTERVAL) {
            state.prefs.refresh_interval_ms = clamp_interval(ms);
        }
        let theme = prefs.load_as::<Theme>(KEY_THEME).unwrap_or_default();
        reducer::reduce(&mut state, Action::SetTheme { theme, system_dark });

        info!(
            symbol = %state.symbol,
            theme = %state.prefs.theme,
            auto_refresh = state.prefs.auto_refresh,
            interval_ms = state.prefs.refresh_interval_ms,
            "store booted"
        );
        Self {
            state,
            prefs,
            system_dark,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn symbol(&self) -> &Symbol {
        &self.state.symbol
    }

    pub fn preferences(&self) -> Preferences {
        self.state.prefs
    }

    fn dispatch(&mut self, action: Action) -> bool {
        reducer::reduce(&mut self.state, action)
    }

    pub fn select_symbol(&mut self, symbol: Symbol) -> bool {
        let changed = self.dispatch(Action::SelectSymbol(symbol));
        self.prefs
            .save_preference(KEY_SYMBOL, json!(self.state.symbol.as_str()));
        changed
    }

    /// Marks `source` in flight and returns the tag its response must carry.
    pub fn begin_fetch(&mut self, source: DataSource) -> RequestTag {
        self.dispatch(Action::BeginFetch(source));
        let tag = RequestTag {
            source,
            symbol: source
                .is_symbol_scoped()
                .then(|| self.state.symbol.clone()),
            seq: self.state.slot(source).latest_seq,
        };
        debug_hooks::log_fetch_issued(&tag);
        tag
    }

    pub fn fetch_succeeded(&mut self, payload: Payload) -> bool {
        self.dispatch(Action::FetchSucceeded(payload))
    }

    pub fn fetch_failed(&mut self, source: DataSource, message: impl Into<String>) -> bool {
        let message = message.into();
        debug_hooks::log_fetch_failure(source, &self.state.symbol, &message);
        self.dispatch(Action::FetchFailed { source, message })
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) -> bool {
        let changed = self.dispatch(Action::SetAutoRefresh(enabled));
        if changed {
            self.prefs.save_preference(KEY_AUTO_REFRESH, json!(enabled));
        }
        changed
    }

    pub fn set_refresh_interval(&mut self, ms: u64) -> bool {
        let changed = self.dispatch(Action::SetRefreshInterval(ms));
        if changed {
            self.prefs.save_preference(
                KEY_REFRESH_INTERVAL,
                json!(self.state.prefs.refresh_interval_ms),
            );
        }
        changed
    }

    pub fn set_theme(&mut self, theme: Theme) -> bool {
        let changed = self.dispatch(Action::SetTheme {
            theme,
            system_dark: self.system_dark,
        });
        self.prefs.save_preference(KEY_THEME, json!(theme));
        changed
    }

    pub fn clear_errors(&mut self) -> bool {
        self.dispatch(Action::ClearErrors)
    }

    pub fn crashed(&mut self, reason: impl Into<String>) -> bool {
        self.dispatch(Action::Crashed(reason.into()))
    }

    pub fn reset_view(&mut self) -> bool {
        self.dispatch(Action::ResetView)
    }

    /// A response still matters if it was issued for the current selection
    /// and no newer fetch for the same source has been issued since.
    pub fn is_current(&self, tag: &RequestTag) -> bool {
        let symbol_ok = match &tag.symbol {
            Some(symbol) => *symbol == self.state.symbol,
            None => true,
        };
        symbol_ok && tag.seq == self.state.slot(tag.source).latest_seq
    }

    /// Routes a finished fetch to `fetch_succeeded` / `fetch_failed`, or
    /// drops it when stale. Returns true if state changed.
    pub fn resolve(&mut self, event: FetchEvent) -> bool {
        let tag = event.tag().clone();
        if !self.is_current(&tag) {
            debug_hooks::log_stale_discard(
                &tag,
                &self.state.symbol,
                self.state.slot(tag.source).latest_seq,
            );
            return false;
        }
        match event {
            FetchEvent::Succeeded {
                payload: Payload::Stats(stats),
                ..
            } if stats.error.is_some() => {
                let message = stats.error.unwrap_or_default();
                self.fetch_failed(tag.source, message)
            }
            FetchEvent::Succeeded { payload, .. } => {
                debug!(source = %tag.source, "fetch landed");
                self.fetch_succeeded(payload)
            }
            FetchEvent::Failed { error, .. } => self.fetch_failed(tag.source, error.to_string()),
        }
    }
}

/// Terminal background hint for `Theme::Auto`, read from `COLORFGBG`
/// ("fg;bg", where bg 0-6 or 8 is a dark palette entry).
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()))
        .map(|bg| bg < 7 || bg == 8)
        .unwrap_or(false)
}
