use std::fmt::Write as _;

use stockdash_client::{
    horizon_rank, horizon_title, PriceBar, SentimentLabel, SentimentReading, StockStats,
};

use super::state::*;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 48;
const TOP_ROWS: usize = 10;

/// Whole dashboard as text. Panels only branch on their source's status.
pub fn render(state: &AppState) -> String {
    if let Some(reason) = &state.crashed {
        return render_fallback(reason);
    }

    let mut out = String::new();
    header(&mut out, state);

    panel(&mut out, state, DataSource::History, "Price history", |d| {
        d.history.as_deref().map(history_body)
    });
    panel(&mut out, state, DataSource::Stats, "Statistics", |d| {
        d.stats.as_ref().map(stats_body)
    });
    panel(&mut out, state, DataSource::Predictions, "Predictions", |d| {
        d.predictions.as_ref().map(|p| {
            let mut rows: Vec<_> = p.iter().collect();
            rows.sort_by_key(|(label, _)| (horizon_rank(label), label.to_string()));
            rows.iter()
                .map(|(label, pred)| {
                    let title = horizon_title(label);
                    if let Some(err) = &pred.error {
                        return format!("  {title:<10} {err}");
                    }
                    let mut line = format!("  {title:<10} {}", price(pred.value));
                    if let Some(ci) = &pred.confidence_interval {
                        let _ = write!(line, "  ({} .. {})", price(ci.low), price(ci.high));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    });
    panel(&mut out, state, DataSource::Sentiment, "Sentiment", |d| {
        d.sentiment.as_ref().map(sentiment_body).or_else(|| {
            state
                .error(DataSource::Sentiment)
                .map(|_| sentiment_body(&SentimentReading::outcome(SentimentLabel::Error)))
        })
    });
    panel(&mut out, state, DataSource::TopStocks, "Top stocks", |d| {
        d.top_stocks.as_ref().map(|top| {
            top.0
                .iter()
                .take(TOP_ROWS)
                .map(|s| format!("  {:<8} {}", s.symbol, price(s.price)))
                .collect::<Vec<_>>()
                .join("\n")
        })
    });
    panel(&mut out, state, DataSource::Indexes, "Indexes", |d| {
        d.indexes.as_ref().map(|idx| {
            idx.iter()
                .map(|(name, value)| format!("  {name:<12} {}", price(*value)))
                .collect::<Vec<_>>()
                .join("\n")
        })
    });

    if !state.status_line.is_empty() {
        let _ = writeln!(out, "\n{}", state.status_line);
    }
    out
}

pub fn render_fallback(reason: &str) -> String {
    format!(
        "Something went wrong while drawing the dashboard.\n  {reason}\n\
         Type `reset` to clear errors and try again, or `quit` to exit.\n"
    )
}

fn header(out: &mut String, state: &AppState) {
    let mode = match state.visual_mode {
        VisualMode::Dark => "dark",
        VisualMode::Light => "light",
    };
    let auto = if state.prefs.auto_refresh {
        format!("every {}s", state.prefs.refresh_interval_ms / 1000)
    } else {
        "off".to_string()
    };
    let _ = writeln!(
        out,
        "== {} ==  theme {} ({mode})  auto-refresh {auto}{}",
        state.symbol,
        state.prefs.theme,
        if state.any_loading() { "  [loading]" } else { "" }
    );
}

fn panel<F>(out: &mut String, state: &AppState, source: DataSource, title: &str, body: F)
where
    F: FnOnce(&DashboardData) -> Option<String>,
{
    let slot = state.slot(source);
    let tag = match state.status(source) {
        FetchStatus::Idle => "no data".to_string(),
        FetchStatus::Loading => "loading...".to_string(),
        FetchStatus::Error => format!(
            "error: {}  (retry {source})",
            slot.error.as_deref().unwrap_or_default()
        ),
        FetchStatus::Ready => match slot.updated_at {
            Some(at) => format!("updated {}", at.format("%H:%M:%S")),
            None => String::new(),
        },
    };
    let _ = writeln!(out, "\n-- {title} -- {tag}");
    // Old data stays visible under a loading or error tag.
    if let Some(text) = body(&state.data) {
        if !text.is_empty() {
            let _ = writeln!(out, "{text}");
        }
    }
}

fn history_body(bars: &[PriceBar]) -> String {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return "  (empty)".to_string();
    };
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    format!(
        "  {}\n  {} {:.2} -> {} {:.2}",
        sparkline(&closes, SPARK_WIDTH),
        first.date,
        first.close,
        last.date,
        last.close
    )
}

fn stats_body(s: &StockStats) -> String {
    format!(
        "  last {}  high {}  low {}  volume {}",
        price(s.last),
        price(s.high),
        price(s.low),
        s.volume.map(thousands).unwrap_or_else(|| "-".into())
    )
}

fn sentiment_body(r: &SentimentReading) -> String {
    if r.label.is_outcome() {
        return format!("  {}", r.label.as_str());
    }
    match r.score {
        Some(score) => format!("  {} ({score:+.3})", r.label),
        None => format!("  {}", r.label),
    }
}

/// Samples down to `width` points and maps each onto a block glyph.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let step = (values.len() as f64 / width as f64).max(1.0);
    let sampled: Vec<f64> = (0..width.min(values.len()))
        .map(|i| values[((i as f64 * step) as usize).min(values.len() - 1)])
        .collect();
    let lo = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    sampled
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK[SPARK.len() / 2]
            } else {
                let idx = ((v - lo) / span * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[idx.min(SPARK.len() - 1)]
            }
        })
        .collect()
}

fn price(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
