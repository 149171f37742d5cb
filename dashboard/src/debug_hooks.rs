//! Development-mode diagnostics. Silent unless [`set_enabled`] was called
//! with `true` (the binary does so when running in development mode).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::app::state::{DataSource, RequestTag, Symbol};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

fn log_line(topic: &str, msg: impl AsRef<str>) {
    if !enabled() {
        return;
    }
    tracing::debug!(target: "stockdash::dev", topic, "{}", msg.as_ref());
}

pub fn log_fetch_failure(source: DataSource, symbol: &Symbol, message: &str) {
    if !enabled() {
        return;
    }
    tracing::warn!(target: "stockdash::dev", %source, %symbol, "fetch failed: {message}");
}

pub fn log_fetch_issued(tag: &RequestTag) {
    log_line(
        "fetch.issue",
        format!(
            "{} seq={} symbol={}",
            tag.source,
            tag.seq,
            tag.symbol.as_ref().map(Symbol::as_str).unwrap_or("-")
        ),
    );
}

pub fn log_stale_discard(tag: &RequestTag, current: &Symbol, latest_seq: u64) {
    static COUNT: AtomicU64 = AtomicU64::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    log_line(
        "fetch.stale",
        format!(
            "discard #{n} {} seq={} (latest {latest_seq}) issued_for={} current={current}",
            tag.source,
            tag.seq,
            tag.symbol.as_ref().map(Symbol::as_str).unwrap_or("-"),
        ),
    );
}

pub fn log_timer(action: &str, generation: u64, interval_ms: u64) {
    log_line(
        "poll.timer",
        format!("{action} generation={generation} interval={interval_ms}ms"),
    );
}

pub fn log_tick_ignored(generation: u64, live: Option<u64>) {
    log_line(
        "poll.tick",
        format!("ignoring tick from generation {generation}; live={live:?}"),
    );
}
