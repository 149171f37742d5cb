use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::app::event::{AppEvent, TimerEvent};
use crate::app::state::Symbol;
use crate::debug_hooks;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running { interval_ms: u64, symbol: Symbol },
}

/// Auto-refresh timer. At most one timer task is alive; replacing it bumps
/// the generation so ticks already queued by the old one can be recognized.
pub struct Poller {
    tx: UnboundedSender<AppEvent>,
    phase: Phase,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            tx,
            phase: Phase::Stopped,
            generation: 0,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Only ticks from the current timer, while running, should be honored.
    pub fn is_live(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }

    /// Brings the timer in line with the preferences. Returns true if a new
    /// timer was started.
    pub fn reconcile(&mut self, enabled: bool, interval_ms: u64, symbol: &Symbol) -> bool {
        if !enabled {
            self.stop();
            return false;
        }
        let wanted = Phase::Running {
            interval_ms,
            symbol: symbol.clone(),
        };
        if self.phase == wanted {
            return false;
        }
        self.start(interval_ms);
        self.phase = wanted;
        true
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug_hooks::log_timer("stop", self.generation, 0);
        }
        self.phase = Phase::Stopped;
    }

    fn start(&mut self, interval_ms: u64) {
        if let Some(old) = self.task.take() {
            old.abort();
        }
        self.generation += 1;
        let generation = self.generation;
        let period = Duration::from_millis(interval_ms.max(1));
        let tx = self.tx.clone();

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx
                    .send(AppEvent::Timer(TimerEvent::Refresh { generation }))
                    .is_err()
                {
                    break;
                }
            }
        }));
        tracing::debug!(generation, interval_ms, "auto-refresh timer started");
        debug_hooks::log_timer("start", generation, interval_ms);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
