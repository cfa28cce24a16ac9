//! One-shot, restartable delay timer.
//!
//! The timer owns a single deadline. Starting it always replaces the
//! previous deadline, so at most one window is outstanding. Expiry is
//! observed by awaiting [`DelayTimer::expired`] from the owner's event loop;
//! the timer never runs code on its own.

use tokio::time::{Duration, Instant};

/// What the owner must do after re-arming the timer.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Nothing now; the routine runs when the window expires.
    Deferred,
    /// Run the bound routine immediately.
    Immediate,
}

/// A cancelable one-shot delayed trigger.
#[derive(Debug)]
pub struct DelayTimer {
    delay: Duration,
    deadline: Option<Instant>,
    opened: u64,
    cancelled: u64,
    fired: u64,
}

impl DelayTimer {
    /// Creates a disarmed timer with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            opened: 0,
            cancelled: 0,
            fired: 0,
        }
    }

    /// Returns the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms a fresh window, cancelling any pending one first.
    pub fn start(&mut self) {
        self.stop();
        self.deadline = Some(Instant::now() + self.delay);
        self.opened += 1;
    }

    /// Cancels the pending window, if any.
    pub fn stop(&mut self) {
        if self.deadline.take().is_some() {
            self.cancelled += 1;
        }
    }

    /// Same as [`stop`](Self::stop).
    pub fn pause(&mut self) {
        self.stop();
    }

    /// Re-arms the timer. With `run_now`, the owner is told to run the bound
    /// routine right away as well.
    pub fn resume(&mut self, run_now: bool) -> Firing {
        self.start();
        if run_now {
            Firing::Immediate
        } else {
            Firing::Deferred
        }
    }

    /// Stops, then starts.
    pub fn reset(&mut self) {
        self.stop();
        self.start();
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The instant the pending window expires.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of windows armed over the timer's life.
    pub fn windows_opened(&self) -> u64 {
        self.opened
    }

    /// Number of windows cancelled before expiry.
    pub fn windows_cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Number of windows that expired.
    pub fn windows_fired(&self) -> u64 {
        self.fired
    }

    /// Completes when the pending window expires, disarming the timer.
    ///
    /// Never completes while disarmed. Cancel-safe: dropping the future
    /// before it completes leaves the deadline in place.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;
        self.deadline = None;
        self.fired += 1;
    }
}
