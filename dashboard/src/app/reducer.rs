use chrono::Local;

use super::event::Action;
use super::state::*;

/// Applies one transition. Returns true if anything visible changed.
pub fn reduce(state: &mut AppState, action: Action) -> bool {
    match action {
        Action::SelectSymbol(symbol) => {
            state.symbol = symbol;
            for source in DataSource::symbol_scoped() {
                state.data.clear(source);
                let slot = state.slot_mut(source);
                slot.loading = false;
                slot.error = None;
                slot.updated_at = None;
            }
            state.status_line = format!("Showing {}", state.symbol);
            true
        }
        Action::BeginFetch(source) => {
            let slot = state.slot_mut(source);
            slot.loading = true;
            slot.latest_seq += 1;
            true
        }
        Action::FetchSucceeded(payload) => {
            let source = payload.source();
            state.data.set(payload);
            let slot = state.slot_mut(source);
            slot.error = None;
            slot.loading = false;
            slot.updated_at = Some(Local::now());
            true
        }
        Action::FetchFailed { source, message } => {
            let slot = state.slot_mut(source);
            slot.error = Some(message);
            slot.loading = false;
            true
        }
        Action::SetAutoRefresh(enabled) => {
            if state.prefs.auto_refresh == enabled {
                return false;
            }
            state.prefs.auto_refresh = enabled;
            state.status_line = if enabled {
                format!(
                    "Auto-refresh every {}s",
                    state.prefs.refresh_interval_ms / 1000
                )
            } else {
                "Auto-refresh off".to_string()
            };
            true
        }
        Action::SetRefreshInterval(ms) => {
            let ms = clamp_interval(ms);
            if state.prefs.refresh_interval_ms == ms {
                return false;
            }
            state.prefs.refresh_interval_ms = ms;
            state.status_line = format!("Refresh interval set to {}s", ms / 1000);
            true
        }
        Action::SetTheme { theme, system_dark } => {
            let mode = theme.resolve(system_dark);
            let changed = state.prefs.theme != theme || state.visual_mode != mode;
            state.prefs.theme = theme;
            state.visual_mode = mode;
            changed
        }
        Action::ClearErrors => {
            let mut changed = false;
            for slot in state.slots.iter_mut() {
                changed |= slot.error.take().is_some();
            }
            changed
        }
        Action::Crashed(reason) => {
            state.crashed = Some(reason);
            true
        }
        Action::ResetView => {
            let was_crashed = state.crashed.take().is_some();
            reduce(state, Action::ClearErrors) || was_crashed
        }
    }
}
