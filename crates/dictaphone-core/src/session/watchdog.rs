use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Armed one-shot timer bounding how long a session waits for the backend.
///
/// Dropping the watchdog disarms it, so a released session can never leave a
/// live timer behind.
#[derive(Debug)]
pub struct Watchdog {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
    deadline: Instant,
}

impl Watchdog {
    /// Schedule `on_fire` to run once `duration` has elapsed.
    pub fn arm<F>(duration: Duration, on_fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let fired = Arc::new(AtomicBool::new(false));
        let deadline = Instant::now() + duration;

        let task_cancel = cancel.clone();
        let task_fired = Arc::clone(&fired);

        tokio::spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    trace!("Watchdog disarmed before expiry");
                }
                _ = sleep_until(deadline) => {
                    task_fired.store(true, Ordering::Release);
                    on_fire.await;
                }
            }
        });

        Self {
            cancel,
            fired,
            deadline,
        }
    }

    /// When the watchdog fires if left armed.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the timer already expired.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Cancel the timer.
    ///
    /// Returns `true` if this call prevented the timer from firing, `false` if
    /// it had already fired.
    pub fn disarm(self) -> bool {
        self.cancel.cancel();
        !self.has_fired()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
