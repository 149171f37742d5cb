use std::io::BufRead;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::event::{AppEvent, UiEvent};
use super::state::{DataSource, Symbol, SymbolError, Theme};

pub const HELP: &str = "\
commands:
  symbol <TICKER>      select a ticker (a bare ticker works too)
  refresh              fetch every panel now
  auto on|off          toggle auto-refresh
  interval <secs>      auto-refresh period (minimum 60)
  theme light|dark|auto
  retry <source>       history, stats, predictions, sentiment, top-stocks, indexes
  clear                dismiss error messages
  reset                leave the error view after a display failure
  help                 show this text
  quit                 exit";

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error("{command} expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

fn bad(command: &'static str, expected: &'static str) -> CommandError {
    CommandError::BadArgument { command, expected }
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<AppEvent>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let ui = |e: UiEvent| -> Result<Option<AppEvent>, CommandError> { Ok(Some(AppEvent::Ui(e))) };

    match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Ok(Some(AppEvent::Quit)),
        "help" | "?" => ui(UiEvent::HelpRequested),
        "refresh" => ui(UiEvent::RefreshRequested),
        "clear" => ui(UiEvent::ClearErrors),
        "reset" => ui(UiEvent::ResetView),
        "symbol" => {
            let symbol = Symbol::parse(arg.unwrap_or_default())?;
            ui(UiEvent::SymbolSelected { symbol })
        }
        // `s` alone is the ticker S, handled by the bare-ticker arm below.
        "s" if arg.is_some() => {
            let symbol = Symbol::parse(arg.unwrap_or_default())?;
            ui(UiEvent::SymbolSelected { symbol })
        }
        "auto" => {
            let enabled = match arg.map(str::to_ascii_lowercase).as_deref() {
                Some("on" | "true" | "1") => true,
                Some("off" | "false" | "0") => false,
                _ => return Err(bad("auto", "on or off")),
            };
            ui(UiEvent::AutoRefreshChanged { enabled })
        }
        "interval" => {
            let secs: u64 = arg
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| bad("interval", "a number of seconds"))?;
            ui(UiEvent::RefreshIntervalChanged {
                ms: secs.saturating_mul(1000),
            })
        }
        "theme" => {
            let theme = arg
                .and_then(|a| a.parse::<Theme>().ok())
                .ok_or_else(|| bad("theme", "light, dark or auto"))?;
            ui(UiEvent::ThemeChanged { theme })
        }
        "retry" => {
            let source = arg
                .and_then(|a| a.parse::<DataSource>().ok())
                .ok_or_else(|| bad("retry", "a panel name"))?;
            ui(UiEvent::RetryRequested { source })
        }
        _ if arg.is_none() => {
            let symbol = Symbol::parse(head)?;
            ui(UiEvent::SymbolSelected { symbol })
        }
        _ => Err(bad("input", "a command; type `help`")),
    }
}

/// Reads commands from stdin on a plain thread and forwards them.
pub fn wire_stdin(tx: UnboundedSender<AppEvent>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(err) => {
                    tracing::warn!("stdin read failed: {err}");
                    break;
                }
            };
            match parse(&line) {
                Ok(Some(ev)) => {
                    let quit = matches!(ev, AppEvent::Quit);
                    if tx.send(ev).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => println!("{err}"),
            }
        }
        tracing::debug!("stdin closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui(line: &str) -> UiEvent {
        match parse(line) {
            Ok(Some(AppEvent::Ui(e))) => e,
            other => panic!("{line:?} parsed to {other:?}"),
        }
    }

    #[test]
    fn symbol_forms() {
        let want = UiEvent::SymbolSelected {
            symbol: Symbol::parse("MSFT").unwrap(),
        };
        assert_eq!(ui("symbol msft"), want);
        assert_eq!(ui("  msft  "), want);
        assert_eq!(ui("S MSFT"), want);
        assert!(matches!(parse("symbol"), Err(CommandError::Symbol(SymbolError::Empty))));
        assert!(parse("symbol $$$").is_err());
    }

    #[test]
    fn one_letter_tickers_select_themselves() {
        for raw in ["s", "S", "f"] {
            assert_eq!(
                ui(raw),
                UiEvent::SymbolSelected {
                    symbol: Symbol::parse(raw).unwrap()
                }
            );
        }
    }

    #[test]
    fn preferences() {
        assert_eq!(ui("auto on"), UiEvent::AutoRefreshChanged { enabled: true });
        assert_eq!(ui("AUTO Off"), UiEvent::AutoRefreshChanged { enabled: false });
        assert_eq!(ui("interval 90"), UiEvent::RefreshIntervalChanged { ms: 90_000 });
        assert_eq!(ui("theme Dark"), UiEvent::ThemeChanged { theme: Theme::Dark });
        assert!(parse("auto maybe").is_err());
        assert!(parse("interval soon").is_err());
        assert!(parse("theme sepia").is_err());
    }

    #[test]
    fn actions() {
        assert_eq!(ui("refresh"), UiEvent::RefreshRequested);
        assert_eq!(ui("retry top-stocks"), UiEvent::RetryRequested { source: DataSource::TopStocks });
        assert_eq!(ui("clear"), UiEvent::ClearErrors);
        assert_eq!(ui("reset"), UiEvent::ResetView);
        assert_eq!(ui("help"), UiEvent::HelpRequested);
        assert!(matches!(parse("quit"), Ok(Some(AppEvent::Quit))));
        assert!(matches!(parse("   "), Ok(None)));
        assert!(parse("retry everything").is_err());
        assert!(parse("buy 100 AAPL").is_err());
    }
}
