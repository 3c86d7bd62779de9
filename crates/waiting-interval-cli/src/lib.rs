//! Runs a single waiting interval on a Tokio local task set and reports when it fired.

mod config;

pub use config::{Config, DEFAULT_DELAYS_MS, DEFAULT_FIRINGS};

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tokio::time::Instant;
use waiting_interval::host::TokioTimer;
use waiting_interval::{DelaySequence, WaitingIntervals};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Time since scheduling at which each firing ran.
    pub fired_at: Vec<Duration>,
    /// The handler failed and the interval stopped before reaching `Config::firings`.
    pub halted: bool,
    /// What was left of the delay list when the run ended.
    pub remaining_delays: Vec<Duration>,
}

pub async fn run(config: &Config) -> anyhow::Result<Report> {
    LocalSet::new().run_until(run_local(config)).await
}

async fn run_local(config: &Config) -> anyhow::Result<Report> {
    let intervals = WaitingIntervals::new(TokioTimer::new());
    let delays = DelaySequence::new(config.delays.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let start = Instant::now();
    let fail_on = config.fail_on;
    let mut count = 0usize;
    let id = intervals.schedule(
        move |_: &()| -> Result<(), String> {
            count += 1;
            let _ = tx.send(start.elapsed());
            if fail_on == Some(count) {
                return Err(format!("simulated failure on firing {count}"));
            }
            Ok(())
        },
        delays.clone(),
        (),
    )?;
    tracing::info!(interval = %id, delays = ?delays.snapshot(), "scheduled");

    let mut fired_at = Vec::with_capacity(config.firings);
    let mut halted = false;
    while fired_at.len() < config.firings {
        // The sender lives inside the interval's task, so the channel closes once the interval
        // stops re-arming.
        let Some(elapsed) = rx.recv().await else {
            halted = true;
            break;
        };
        fired_at.push(elapsed);
        tracing::info!(
            interval = %id,
            firing = fired_at.len(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            remaining_delays = delays.len(),
            "fired"
        );
    }

    if halted {
        tracing::warn!(
            interval = %id,
            firings = fired_at.len(),
            still_registered = intervals.is_scheduled(id),
            "interval halted before reaching the requested firings"
        );
    }
    intervals.cancel(id);

    Ok(Report {
        fired_at,
        halted,
        remaining_delays: delays.snapshot(),
    })
}
