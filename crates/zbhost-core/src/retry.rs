//! Wait lifecycle.
//!
//! Each event a pending wait can see is handled by a pure function returning
//! the next state, so the transitions can be checked without a scheduler.
//!
//! ```text
//!              frame matches
//!   Active ──────────────────────▶ Matched
//!     │
//!     │ timer expires, attempt < max
//!     ▼
//!   Retrying ── resend + rewait ──▶ Active
//!     │
//!     │ timer expires, attempt >= max
//!     ▼
//!   Exhausted
//! ```

use std::time::Instant;

use zbhost_frame::Frame;

use crate::WaitSpec;

/// Where a wait is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Installed, timer running.
    Active,
    /// Timed out; a resend has been queued.
    Retrying,
    /// A matching frame arrived.
    Matched,
    /// Every attempt timed out.
    Exhausted,
}

/// What to do when a wait's timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Send the last frame again and wait once more.
    Resend {
        /// Attempt number of the resend.
        attempt: u32,
        /// Attempt ceiling.
        max: u32,
    },
    /// Give up.
    Exhaust {
        /// Attempts made.
        attempts: u32,
    },
}

impl TimeoutAction {
    /// The state a wait enters after this action.
    pub fn state(self) -> WaitState {
        match self {
            TimeoutAction::Resend { .. } => WaitState::Retrying,
            TimeoutAction::Exhaust { .. } => WaitState::Exhausted,
        }
    }
}

/// Decide what happens when attempt `retry_count` of `retry_max` times out.
pub fn on_wait_expired(retry_count: u32, retry_max: u32) -> TimeoutAction {
    if retry_count >= retry_max {
        TimeoutAction::Exhaust {
            attempts: retry_count,
        }
    } else {
        TimeoutAction::Resend {
            attempt: retry_count + 1,
            max: retry_max,
        }
    }
}

/// Decide whether `frame` resolves a wait on `spec`.
pub fn on_wait_frame<D>(spec: &WaitSpec<D>, frame: &Frame) -> WaitState {
    if spec.matches(frame) {
        WaitState::Matched
    } else {
        WaitState::Active
    }
}

/// The wait currently stalling the scheduler.
pub(crate) struct PendingWait<D> {
    pub spec: WaitSpec<D>,
    /// Priority of the `WaitFrame` command, reused for resends.
    pub priority: Option<i32>,
    pub started: Instant,
    pub deadline: Instant,
}

impl<D> PendingWait<D> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_frame::FrameType;

    #[test]
    fn test_default_ceiling_gives_two_resends() {
        assert_eq!(
            on_wait_expired(1, 3),
            TimeoutAction::Resend { attempt: 2, max: 3 }
        );
        assert_eq!(
            on_wait_expired(2, 3),
            TimeoutAction::Resend { attempt: 3, max: 3 }
        );
        assert_eq!(on_wait_expired(3, 3), TimeoutAction::Exhaust { attempts: 3 });
    }

    #[test]
    fn test_single_attempt_exhausts_immediately() {
        assert_eq!(on_wait_expired(1, 1).state(), WaitState::Exhausted);
    }

    #[test]
    fn test_frame_transition() {
        let spec: WaitSpec<()> = WaitSpec::for_type(FrameType::Version);
        assert_eq!(
            on_wait_frame(&spec, &Frame::new(FrameType::Version)),
            WaitState::Matched
        );
        assert_eq!(
            on_wait_frame(&spec, &Frame::new(FrameType::DeviceState)),
            WaitState::Active
        );
    }
}
