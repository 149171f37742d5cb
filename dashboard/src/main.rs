// dashboard/src/main.rs
//
// Terminal stock dashboard. Panels are printed to stdout whenever state
// changes; commands are read from stdin (type `help`). Logs go to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use stockdash::app::{commands, store, AppEvent, AppRuntime, Store};
use stockdash::config::DashboardConfig;
use stockdash::debug_hooks;
use stockdash::persist::Persistence;
use stockdash_client::HttpMarketApi;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = DashboardConfig::load().context("loading configuration")?;

    let default_level = if cfg.dev_mode() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_level},hyper=info,reqwest=info"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug_hooks::set_enabled(cfg.dev_mode());

    tracing::info!(
        api = %cfg.client.api_url,
        environment = ?cfg.environment,
        "stockdash starting"
    );

    let prefs = Persistence::new();
    if let Some(path) = prefs.path() {
        tracing::debug!("preferences at {}", path.display());
    }
    let store = Store::boot(prefs, cfg.default_symbol.clone(), store::system_prefers_dark());

    let api = HttpMarketApi::new(cfg.client.clone()).context("building http client")?;
    let runtime = AppRuntime::new(store, Arc::new(api), cfg.history_days);

    let tx = runtime.sender();
    ctrlc::set_handler(move || {
        let _ = tx.send(AppEvent::Quit);
    })
    .context("installing Ctrl-C handler")?;

    // Not joined: a blocked stdin read must not hold up shutdown.
    let _stdin = commands::wire_stdin(runtime.sender());
    println!("{}", commands::HELP);

    runtime.run().await;
    Ok(())
}
