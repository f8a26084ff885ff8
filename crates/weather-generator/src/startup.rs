//! Startup guard: block until the database answers.
//!
//! The generator is usually started alongside its database, so the first
//! connection attempts may fail. [`StartupGuard::wait_for`] polls a
//! [`LivenessProbe`] once per second until it succeeds or the overall wait
//! elapses. Neither a single probe nor the retry sleep may run past the
//! deadline, so an unreachable database is reported after `max_wait`, not
//! later.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use weather_db::{DbError, PostgresPool};

/// Pause between failed probes.
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Time allowed for a single probe.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the startup guard.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The store did not answer within the allowed wait.
    #[error("database is not available after {max_wait:?} ({attempts} attempts): {last_error}")]
    Unavailable {
        /// The wait that elapsed.
        max_wait: Duration,
        /// Number of probes issued.
        attempts: u32,
        /// Message of the last probe failure.
        last_error: String,
    },
}

/// Something that can be asked whether the store is reachable.
pub trait LivenessProbe {
    /// Issue one trivial query against the store.
    async fn ping(&self) -> Result<(), DbError>;
}

impl LivenessProbe for PostgresPool {
    async fn ping(&self) -> Result<(), DbError> {
        Self::ping(self).await
    }
}

/// Polls a [`LivenessProbe`] until it succeeds or a deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct StartupGuard {
    max_wait: Duration,
    retry_interval: Duration,
    probe_timeout: Duration,
}

impl StartupGuard {
    /// Guard that gives up after `max_wait`.
    pub const fn new(max_wait: Duration) -> Self {
        Self {
            max_wait,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Set the pause between failed probes.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the timeout applied to each probe.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Wait until `probe` succeeds.
    ///
    /// Returns the number of probes issued, including the successful one.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Unavailable`] carrying the last failure if no
    /// probe succeeded within the maximum wait.
    pub async fn wait_for<P: LivenessProbe>(&self, probe: &P) -> Result<u32, StartupError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut last_error = String::from("no probe was attempted");

        while started.elapsed() < self.max_wait {
            attempts = attempts.saturating_add(1);
            let remaining = self.max_wait.saturating_sub(started.elapsed());

            match tokio::time::timeout(self.probe_timeout.min(remaining), probe.ping()).await {
                Ok(Ok(())) => {
                    info!(
                        attempts,
                        waited_ms = started.elapsed().as_millis(),
                        "Database is reachable"
                    );
                    return Ok(attempts);
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(elapsed) => last_error = format!("liveness probe timed out: {elapsed}"),
            }

            debug!(attempt = attempts, error = %last_error, "Database not reachable yet");

            let remaining = self.max_wait.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(self.retry_interval.min(remaining)).await;
        }

        Err(StartupError::Unavailable {
            max_wait: self.max_wait,
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails until `succeed_on` probes have been made.
    struct FlakyProbe {
        calls: AtomicU32,
        succeed_on: Option<u32>,
    }

    impl FlakyProbe {
        const fn never() -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: None,
            }
        }

        const fn succeeds_on(attempt: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: Some(attempt),
            }
        }
    }

    impl LivenessProbe for FlakyProbe {
        async fn ping(&self) -> Result<(), DbError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            match self.succeed_on {
                Some(n) if call >= n => Ok(()),
                _ => Err(DbError::Config(format!("connection refused (call {call})"))),
            }
        }
    }

    /// Never answers.
    struct HangingProbe;

    impl LivenessProbe for HangingProbe {
        async fn ping(&self) -> Result<(), DbError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_store_fails_after_the_deadline() {
        let probe = FlakyProbe::never();
        let started = Instant::now();

        let err = StartupGuard::new(Duration::from_secs(2))
            .wait_for(&probe)
            .await
            .unwrap_err();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2), "gave up early after {waited:?}");
        assert!(waited < Duration::from_secs(3), "gave up late after {waited:?}");

        let StartupError::Unavailable {
            attempts,
            last_error,
            ..
        } = err;
        assert_eq!(attempts, 2);
        assert!(last_error.contains("call 2"), "unexpected last error: {last_error}");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_is_cut_off_at_the_deadline() {
        let started = Instant::now();

        let result = StartupGuard::new(Duration::from_secs(2))
            .with_probe_timeout(Duration::from_secs(30))
            .wait_for(&HangingProbe)
            .await;

        assert!(result.is_err());
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2), "gave up early after {waited:?}");
        assert!(waited < Duration::from_secs(3), "gave up late after {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn store_that_comes_up_is_accepted() {
        let probe = FlakyProbe::succeeds_on(3);
        let started = Instant::now();

        let attempts = StartupGuard::new(Duration::from_secs(60))
            .wait_for(&probe)
            .await
            .unwrap();

        assert_eq!(attempts, 3);
        // Two failed probes, each followed by a one-second pause.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_interval_is_configurable() {
        let probe = FlakyProbe::succeeds_on(5);
        let attempts = StartupGuard::new(Duration::from_secs(1))
            .with_retry_interval(Duration::from_millis(100))
            .wait_for(&probe)
            .await
            .unwrap();
        assert_eq!(attempts, 5);
    }

    #[tokio::test]
    async fn zero_wait_fails_without_probing() {
        let probe = FlakyProbe::succeeds_on(1);
        let err = StartupGuard::new(Duration::ZERO).wait_for(&probe).await.unwrap_err();
        let StartupError::Unavailable { attempts, .. } = err;
        assert_eq!(attempts, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unavailable_message_names_the_last_error() {
        let err = StartupError::Unavailable {
            max_wait: Duration::from_secs(60),
            attempts: 60,
            last_error: "connection refused".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains("60s"));
        assert!(message.contains("connection refused"));
    }
}
