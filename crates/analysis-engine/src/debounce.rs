//! Quiet-period gate for analysis requests.
//!
//! Each `schedule` replaces the pending value and restarts the timer, so only
//! the last value of a burst comes out of `fire`.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T) {
        self.pending = Some((Instant::now() + self.delay, value));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve with the pending value once its quiet period has elapsed.
    /// Never resolves while nothing is scheduled. Cancel-safe: dropping the
    /// future keeps the value pending.
    pub async fn fire(&mut self) -> T {
        loop {
            let deadline = match &self.pending {
                Some((deadline, _)) => *deadline,
                None => return std::future::pending().await,
            };
            sleep_until(deadline).await;
            if let Some((_, value)) = self.pending.take() {
                return value;
            }
        }
    }
}
