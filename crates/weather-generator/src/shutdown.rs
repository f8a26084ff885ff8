//! Cooperative shutdown signal shared by the tick loop and the interrupt
//! listener.
//!
//! The loop checks [`Shutdown::is_requested`] between ticks and races its
//! inter-tick sleep against [`Shutdown::wait`], so an interrupt never cuts a
//! tick short but does not have to wait out a long interval either.
//!
//! A second interrupt exits the process at once, abandoning whatever write is
//! in flight.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shared stop flag with a wake-up for sleeping waiters.
#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    /// A signal that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current tick.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn wait(&self) {
        while !self.is_requested() {
            self.notify.notified().await;
        }
    }
}

/// Exit status used when a second interrupt forces the process down.
const FORCED_EXIT_CODE: i32 = 130;

/// Why [`watch_interrupts`] stopped watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// An interrupt arrived after a stop had already been requested.
    Forced,
    /// The signal source failed; no further interrupts will be seen.
    ListenerFailed,
}

/// Feed interrupts from `next_interrupt` into `shutdown`.
///
/// The first interrupt requests a graceful stop and watching continues. The
/// next one returns [`InterruptOutcome::Forced`].
pub async fn watch_interrupts<F, Fut>(
    shutdown: &Shutdown,
    mut next_interrupt: F,
) -> InterruptOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    loop {
        if let Err(e) = next_interrupt().await {
            warn!(error = %e, "failed to listen for interrupt signal");
            return InterruptOutcome::ListenerFailed;
        }
        if shutdown.is_requested() {
            warn!("Second interrupt received, exiting without waiting for the current tick");
            return InterruptOutcome::Forced;
        }
        info!("Interrupt received, stopping after the current tick (interrupt again to force)");
        shutdown.request();
    }
}

/// Spawn a task that triggers `shutdown` on Ctrl-C / SIGINT and exits the
/// process on a repeated one.
pub fn listen_for_interrupt(shutdown: Arc<Shutdown>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if watch_interrupts(&shutdown, tokio::signal::ctrl_c).await == InterruptOutcome::Forced {
            std::process::exit(FORCED_EXIT_CODE);
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use tokio::sync::{Mutex, mpsc};

    use super::*;

    /// Replays `script` one entry per call; an exhausted script reports an error.
    async fn replay(shutdown: &Shutdown, script: Vec<io::Result<()>>) -> InterruptOutcome {
        let mut script = VecDeque::from(script);
        watch_interrupts(shutdown, || {
            std::future::ready(
                script
                    .pop_front()
                    .unwrap_or_else(|| Err(io::Error::other("script exhausted"))),
            )
        })
        .await
    }

    #[test]
    fn starts_unrequested() {
        assert!(!Shutdown::new().is_requested());
    }

    #[tokio::test]
    async fn request_before_wait_is_not_lost() {
        let shutdown = Shutdown::new();
        shutdown.request();
        assert!(shutdown.is_requested());
        let waited = tokio::time::timeout(Duration::from_secs(1), shutdown.wait()).await;
        assert!(waited.is_ok(), "wait did not observe an earlier request");
    }

    #[tokio::test]
    async fn request_wakes_a_waiting_task() {
        let shutdown = Arc::new(Shutdown::new());
        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { shutdown.wait().await })
        };
        tokio::task::yield_now().await;
        shutdown.request();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn second_interrupt_forces_exit() {
        let shutdown = Shutdown::new();
        let outcome = replay(&shutdown, vec![Ok(()), Ok(())]).await;
        assert_eq!(outcome, InterruptOutcome::Forced);
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn listener_failure_after_first_interrupt_keeps_the_stop() {
        let shutdown = Shutdown::new();
        let outcome = replay(&shutdown, vec![Ok(()), Err(io::Error::other("gone"))]).await;
        assert_eq!(outcome, InterruptOutcome::ListenerFailed);
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn listener_failure_requests_nothing() {
        let shutdown = Shutdown::new();
        let outcome = replay(&shutdown, vec![Err(io::Error::other("no signal support"))]).await;
        assert_eq!(outcome, InterruptOutcome::ListenerFailed);
        assert!(!shutdown.is_requested());
    }

    #[tokio::test]
    async fn watching_continues_after_the_first_interrupt() {
        let shutdown = Arc::new(Shutdown::new());
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let rx = Arc::new(Mutex::new(rx));

        let watcher = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move {
                watch_interrupts(&shutdown, || {
                    let rx = Arc::clone(&rx);
                    async move {
                        rx.lock()
                            .await
                            .recv()
                            .await
                            .ok_or_else(|| io::Error::other("closed"))
                    }
                })
                .await
            })
        };

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert!(!watcher.is_finished(), "watcher stopped after one interrupt");

        tx.send(()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, InterruptOutcome::Forced);
    }
}
