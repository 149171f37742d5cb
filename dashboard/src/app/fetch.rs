use std::sync::Arc;

use stockdash_client::{ClientError, MarketApi};
use strum::IntoEnumIterator;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::event::{AppEvent, FetchEvent};
use super::state::{DataSource, Payload, RequestTag, Symbol};
use super::store::Store;

/// Issues fetches: marks the source loading in the store, runs the call on
/// its own task and posts the outcome back as an [`AppEvent::Fetch`].
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn MarketApi>,
    tx: UnboundedSender<AppEvent>,
    history_days: u32,
}

impl Fetcher {
    pub fn new(api: Arc<dyn MarketApi>, tx: UnboundedSender<AppEvent>, history_days: u32) -> Self {
        Self {
            api,
            tx,
            history_days,
        }
    }

    pub fn fetch(&self, store: &mut Store, source: DataSource) -> JoinHandle<()> {
        let tag = store.begin_fetch(source);
        let symbol = store.symbol().clone();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let days = self.history_days;
        tokio::spawn(async move {
            let event = match load(api.as_ref(), source, &symbol, days).await {
                Ok(payload) => FetchEvent::Succeeded { tag, payload },
                Err(error) => FetchEvent::Failed { tag, error },
            };
            // Receiver gone means the app is shutting down.
            let _ = tx.send(AppEvent::Fetch(event));
        })
    }

    pub fn fetch_all(&self, store: &mut Store) -> Vec<JoinHandle<()>> {
        DataSource::iter().map(|s| self.fetch(store, s)).collect()
    }

    /// Just the sources keyed off the selection; used after a symbol change.
    pub fn refresh_symbol_sources(&self, store: &mut Store) -> Vec<JoinHandle<()>> {
        DataSource::symbol_scoped()
            .map(|s| self.fetch(store, s))
            .collect()
    }

    pub fn retry(&self, store: &mut Store, source: DataSource) -> JoinHandle<()> {
        tracing::info!(%source, symbol = %store.symbol(), "retrying");
        self.fetch(store, source)
    }

    pub fn api(&self) -> &Arc<dyn MarketApi> {
        &self.api
    }
}

async fn load(
    api: &dyn MarketApi,
    source: DataSource,
    symbol: &Symbol,
    days: u32,
) -> Result<Payload, ClientError> {
    let sym = symbol.as_str();
    Ok(match source {
        DataSource::History => Payload::History(api.history(sym, days).await?),
        DataSource::Stats => Payload::Stats(api.stats(sym).await?),
        DataSource::Predictions => Payload::Predictions(api.predict(sym).await?),
        DataSource::Sentiment => Payload::Sentiment(api.sentiment(sym).await?),
        DataSource::TopStocks => Payload::TopStocks(api.top_stocks().await?),
        DataSource::Indexes => Payload::Indexes(api.indexes().await?),
    })
}

/// Short label for a fetch, e.g. `stats[AAPL]#3`.
pub fn describe(tag: &RequestTag) -> String {
    match &tag.symbol {
        Some(symbol) => format!("{}[{}]#{}", tag.source, symbol, tag.seq),
        None => format!("{}#{}", tag.source, tag.seq),
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::testing::*;
    use super::*;
    use crate::persist::Persistence;

    fn setup() -> (
        Store,
        Arc<FakeApi>,
        Fetcher,
        mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let api = Arc::new(FakeApi::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let fetcher = Fetcher::new(api.clone(), tx, 30);
        let store = Store::boot(Persistence::in_memory(), Symbol::default(), false);
        (store, api, fetcher, rx)
    }

    async fn drain(store: &mut Store, rx: &mut mpsc::UnboundedReceiver<AppEvent>, n: usize) {
        for _ in 0..n {
            match rx.recv().await {
                Some(AppEvent::Fetch(ev)) => {
                    store.resolve(ev);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn fetch_all_fills_every_panel() {
        let (mut store, api, fetcher, mut rx) = setup();
        let handles = fetcher.fetch_all(&mut store);
        assert_eq!(handles.len(), DataSource::COUNT);
        assert!(store.state().any_loading());

        drain(&mut store, &mut rx, DataSource::COUNT).await;
        for source in DataSource::iter() {
            assert!(store.state().data.has(source), "{source} missing");
            assert!(!store.state().loading(source));
        }
        assert_eq!(api.call_count(), DataSource::COUNT);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_for_old_symbol_is_discarded() {
        let (mut store, api, fetcher, mut rx) = setup();
        api.delay("AAPL", Duration::from_secs(5));

        fetcher.fetch(&mut store, DataSource::Stats);
        store.select_symbol(Symbol::parse("MSFT").unwrap());
        fetcher.fetch(&mut store, DataSource::Stats);

        // MSFT answers first, AAPL lands afterwards and must not win.
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(store.state().data.stats, Some(stats_for("MSFT")));
        assert!(!store.state().loading(DataSource::Stats));
    }

    #[tokio::test]
    async fn failure_is_recorded_per_source() {
        let (mut store, api, fetcher, mut rx) = setup();
        api.fail_with(ClientError::Timeout);
        fetcher.fetch(&mut store, DataSource::Predictions);
        drain(&mut store, &mut rx, 1).await;

        assert_eq!(store.state().error(DataSource::Predictions), Some("request timed out"));
        assert_eq!(store.state().error(DataSource::Stats), None);
        assert!(!store.state().loading(DataSource::Predictions));
    }

    #[tokio::test]
    async fn symbol_refresh_skips_global_sources() {
        let (mut store, api, fetcher, mut rx) = setup();
        let handles = fetcher.refresh_symbol_sources(&mut store);
        assert_eq!(handles.len(), 4);
        drain(&mut store, &mut rx, 4).await;
        assert!(!store.state().data.has(DataSource::TopStocks));
        assert!(!api.calls.lock().unwrap().iter().any(|c| c.starts_with("top")));
    }

    #[tokio::test]
    async fn retry_clears_previous_error() {
        let (mut store, api, fetcher, mut rx) = setup();
        api.fail_with(ClientError::Http { status: 500 });
        fetcher.fetch(&mut store, DataSource::Stats);
        drain(&mut store, &mut rx, 1).await;
        assert!(store.state().error(DataSource::Stats).is_some());

        *api.failing.lock().unwrap() = None;
        fetcher.retry(&mut store, DataSource::Stats);
        drain(&mut store, &mut rx, 1).await;
        assert_eq!(store.state().error(DataSource::Stats), None);
        assert!(store.state().data.stats.is_some());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_request_stays_quiet_outside_development() {
        use stockdash_client::{ClientConfig, HttpMarketApi};
        use tracing_subscriber::EnvFilter;

        let captured = Captured::default();
        let writer = captured.clone();
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info,hyper=info,reqwest=info"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .try_init()
            .unwrap();
        crate::debug_hooks::set_enabled(false);

        let dead = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let cfg = ClientConfig::new(format!("http://{dead}")).with_timeout(Duration::from_secs(2));
        let api = HttpMarketApi::new(cfg).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = Fetcher::new(Arc::new(api), tx, 30);
        let mut store = Store::boot(Persistence::in_memory(), Symbol::default(), false);

        fetcher.fetch(&mut store, DataSource::Stats).await.unwrap();
        drain(&mut store, &mut rx, 1).await;
        assert!(store
            .state()
            .error(DataSource::Stats)
            .is_some_and(|e| e.starts_with("network error")));

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        // Info records from the client do come through the bridge...
        assert!(out.contains("market api at"), "{out}");
        // ...but the failure itself is not reported.
        assert!(!out.contains("stockdash_client::http"), "{out}");
        assert!(!out.contains("fetch failed"), "{out}");
    }

    #[test]
    fn describe_includes_symbol_only_when_scoped() {
        let scoped = RequestTag {
            source: DataSource::Stats,
            symbol: Some(Symbol::default()),
            seq: 3,
        };
        let global = RequestTag {
            source: DataSource::Indexes,
            symbol: None,
            seq: 1,
        };
        assert_eq!(describe(&scoped), "stats[AAPL]#3");
        assert_eq!(describe(&global), "indexes#1");
    }
}
