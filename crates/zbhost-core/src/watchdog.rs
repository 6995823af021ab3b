//! Liveness watchdog for the transport.
//!
//! The watchdog is a single restartable countdown, independent of the
//! per-wait timers. The scheduler kicks it on every successful transmission.
//! If the countdown elapses without a kick the watchdog trips once and stays
//! disarmed until kicked again. A trip means the link has stopped producing
//! any outbound activity, as opposed to a single unanswered request.

use std::time::{Duration, Instant};

/// A restartable liveness countdown.
#[derive(Debug, Clone)]
pub struct Watchdog {
    /// Countdown length.
    timeout: Duration,
    /// When the countdown elapses; `None` once tripped.
    deadline: Option<Instant>,
    /// Count of trips so far.
    trip_count: u64,
}

impl Watchdog {
    /// Create a watchdog whose countdown starts at `now`.
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Watchdog {
            timeout,
            deadline: Some(now + timeout),
            trip_count: 0,
        }
    }

    /// Restart the countdown from `now`. Re-arms a tripped watchdog.
    pub fn kick(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    /// Check the countdown.
    ///
    /// Returns `true` exactly once per expiry; the watchdog is disarmed
    /// afterwards.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.trip_count += 1;
                true
            }
            _ => false,
        }
    }

    /// When the watchdog will trip, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the countdown is running.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of times the watchdog has tripped.
    pub fn trip_count(&self) -> u64 {
        self.trip_count
    }
}
