pub mod commands;
pub mod event;
pub mod fetch;
pub mod reducer;
pub mod render;
pub mod state;
pub mod store;

pub use event::*;
pub use state::*;
pub use store::Store;

use std::sync::Arc;

use stockdash_client::MarketApi;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::debug_hooks;
use crate::guard;
use crate::poller::Poller;
use self::fetch::Fetcher;

/// Owns the store and is its only mutator. Fetch tasks, the poller, stdin
/// and Ctrl-C all talk to it through one channel of [`AppEvent`]s.
pub struct AppRuntime {
    store: Store,
    fetcher: Fetcher,
    poller: Poller,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
    view: fn(&AppState) -> String,
    dirty: bool,
    show_help: bool,
}

impl AppRuntime {
    pub fn new(store: Store, api: Arc<dyn MarketApi>, history_days: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store,
            fetcher: Fetcher::new(api, tx.clone(), history_days),
            poller: Poller::new(tx.clone()),
            tx,
            rx,
            view: render::render,
            dirty: true,
            show_help: false,
        }
    }

    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Initial load: health probe, every panel, and the timer if enabled.
    pub fn boot(&mut self) {
        let api = Arc::clone(self.fetcher.api());
        tokio::spawn(async move {
            match api.health().await {
                Ok(h) => tracing::info!(status = %h.status, "backend reachable"),
                Err(err) => tracing::warn!("backend health check failed: {err}"),
            }
        });
        self.fetcher.fetch_all(&mut self.store);
        self.sync_poller();
        self.dirty = true;
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Applies one event. Returns false once the app should exit.
    pub fn handle_event(&mut self, ev: AppEvent) -> bool {
        let changed = match ev {
            AppEvent::Quit => return false,
            AppEvent::Ui(ui) => self.handle_ui(ui),
            AppEvent::Fetch(done) => {
                tracing::trace!(fetch = %fetch::describe(done.tag()), "fetch event");
                self.store.resolve(done)
            }
            AppEvent::Timer(TimerEvent::Refresh { generation }) => {
                if self.poller.is_live(generation) {
                    tracing::debug!(generation, "auto-refresh");
                    self.fetcher.fetch_all(&mut self.store);
                    true
                } else {
                    let live = self
                        .poller
                        .is_running()
                        .then(|| self.poller.generation());
                    debug_hooks::log_tick_ignored(generation, live);
                    false
                }
            }
        };
        self.dirty |= changed;
        true
    }

    fn handle_ui(&mut self, ev: UiEvent) -> bool {
        match ev {
            UiEvent::SymbolSelected { symbol } => {
                let changed = self.store.select_symbol(symbol);
                self.fetcher.refresh_symbol_sources(&mut self.store);
                self.sync_poller();
                changed
            }
            UiEvent::AutoRefreshChanged { enabled } => {
                let changed = self.store.set_auto_refresh(enabled);
                self.sync_poller();
                changed
            }
            UiEvent::RefreshIntervalChanged { ms } => {
                let changed = self.store.set_refresh_interval(ms);
                self.sync_poller();
                changed
            }
            UiEvent::ThemeChanged { theme } => self.store.set_theme(theme),
            UiEvent::RefreshRequested => {
                self.fetcher.fetch_all(&mut self.store);
                true
            }
            UiEvent::RetryRequested { source } => {
                self.fetcher.retry(&mut self.store, source);
                true
            }
            UiEvent::ClearErrors => self.store.clear_errors(),
            UiEvent::ResetView => {
                self.store.reset_view();
                true
            }
            UiEvent::HelpRequested => {
                self.show_help = true;
                true
            }
        }
    }

    fn sync_poller(&mut self) {
        let prefs = self.store.preferences();
        self.poller.reconcile(
            prefs.auto_refresh,
            prefs.refresh_interval_ms,
            self.store.symbol(),
        );
    }

    /// Next frame, if anything changed since the last one.
    pub fn render_if_dirty(&mut self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        let view = self.view;
        let mut frame = match guard::guarded(|| view(self.store.state())) {
            Ok(frame) => frame,
            Err(reason) => {
                self.store.crashed(reason.clone());
                render::render_fallback(&reason)
            }
        };
        if std::mem::take(&mut self.show_help) {
            frame.push('\n');
            frame.push_str(commands::HELP);
            frame.push('\n');
        }
        Some(frame)
    }

    pub async fn run(mut self) {
        self.boot();
        loop {
            if let Some(frame) = self.render_if_dirty() {
                println!("{frame}");
            }
            let Some(ev) = self.next_event().await else {
                break;
            };
            if !self.handle_event(ev) {
                break;
            }
            // Coalesce whatever else is already queued into one frame.
            let mut quit = false;
            while let Ok(ev) = self.rx.try_recv() {
                if !self.handle_event(ev) {
                    quit = true;
                    break;
                }
            }
            if quit {
                break;
            }
        }
        self.poller.stop();
        tracing::info!("bye");
    }
}
