//! The generator tick loop.
//!
//! [`run`] drives the weather model at a fixed interval until the shutdown
//! signal fires. Each tick:
//!
//! 1. advances the state with [`WeatherState::step`],
//! 2. appends the new state to the [`ReadingSink`] and waits for the write,
//! 3. logs one console line with the UTC time and the four values,
//! 4. sleeps for the configured interval (woken early by shutdown).
//!
//! The period is interval plus write time; there is no drift correction.
//!
//! A failed write is logged and counted, and the loop carries on with the
//! advanced state. The write itself is never retried.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};
use weather_db::{DbError, PostgresPool, ReadingStore, WeatherReading};
use weather_model::{NoiseSource, WeatherState};

use crate::shutdown::Shutdown;

/// Destination for one reading per tick.
pub trait ReadingSink {
    /// Durably append `state` and return the stored reading.
    async fn record(&self, state: &WeatherState) -> Result<WeatherReading, DbError>;
}

impl ReadingSink for PostgresPool {
    async fn record(&self, state: &WeatherState) -> Result<WeatherReading, DbError> {
        ReadingStore::new(self.pool()).insert(state).await
    }
}

/// Counters and final state of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// State transitions performed.
    pub ticks: u64,
    /// Ticks whose reading was stored.
    pub persisted: u64,
    /// Ticks whose reading could not be stored.
    pub failed: u64,
    /// The current state when the loop stopped.
    pub last_state: WeatherState,
}

/// Run the tick loop until `shutdown` is requested.
///
/// Shutdown is checked before every tick; a tick that has started always
/// completes.
pub async fn run<S, N>(
    initial: WeatherState,
    noise: &mut N,
    sink: &S,
    interval: Duration,
    shutdown: &Shutdown,
) -> RunSummary
where
    S: ReadingSink,
    N: NoiseSource,
{
    let mut summary = RunSummary {
        ticks: 0,
        persisted: 0,
        failed: 0,
        last_state: initial,
    };

    info!(
        interval_secs = interval.as_secs_f64(),
        initial = %initial,
        "{}",
        started_line(interval)
    );

    while !shutdown.is_requested() {
        let next = summary.last_state.step(noise);
        summary.ticks = summary.ticks.saturating_add(1);

        match sink.record(&next).await {
            Ok(reading) => {
                summary.persisted = summary.persisted.saturating_add(1);
                info!(
                    reading_id = reading.id,
                    "{}",
                    tick_line(Utc::now(), &next)
                );
            }
            Err(e) => {
                summary.failed = summary.failed.saturating_add(1);
                error!(
                    tick = summary.ticks,
                    error = %e,
                    "Failed to persist weather reading, skipping record"
                );
            }
        }

        summary.last_state = next;

        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = shutdown.wait() => {}
            }
        }
    }

    summary
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        ticks = summary.ticks,
        persisted = summary.persisted,
        failed = summary.failed,
        last_state = %summary.last_state,
        "{}",
        stopped_line(summary)
    );
}

/// Startup announcement. The interval always shows a fractional part.
pub fn started_line(interval: Duration) -> String {
    format!(
        "Weather generator started. Writing 1 record each {:?} seconds.",
        interval.as_secs_f64()
    )
}

/// Shutdown announcement followed by the run's counters.
pub fn stopped_line(summary: &RunSummary) -> String {
    format!(
        "Weather generator stopped. {} ticks, {} persisted, {} failed.",
        summary.ticks, summary.persisted, summary.failed
    )
}

/// Console line for one tick: `[<UTC time, seconds>] temp=..°C, hum=..%, ...`.
pub fn tick_line(at: DateTime<Utc>, state: &WeatherState) -> String {
    format!("[{}] {state}", at.to_rfc3339_opts(SecondsFormat::Secs, false))
}
