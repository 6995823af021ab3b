//! Scheduler configuration.
//!
//! The configuration is passed to the scheduler at construction and is
//! read-only afterwards. It replaces process-wide debug switches: the
//! [`DebugFlags`] decide at which level the engine reports its activity.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time to wait for a matching frame before retrying.
pub const WAIT_TIMEOUT_MS: u64 = 1000;

/// Default number of attempts per wait, initial send included.
pub const WAIT_RETRY_MAX: u32 = 3;

/// Default liveness interval of the watchdog.
pub const WATCHDOG_TIMEOUT_MS: u64 = 5000;

/// Which parts of the engine's activity are logged at `info`.
///
/// Anything not selected here is still logged, at `trace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    /// Queue and run-loop flow (enqueue, stall, queue dumps).
    pub flow: bool,
    /// Every frame sent and received.
    pub frames: bool,
    /// Wait details (timeouts, match results, exec labels).
    pub frame_detail: bool,
    /// Inbound frames before device-logic dispatch.
    pub frame_parsing: bool,
    /// Raw encoded bytes on the transport.
    pub raw_frames: bool,
}

impl Default for DebugFlags {
    fn default() -> Self {
        DebugFlags {
            flow: false,
            frames: true,
            frame_detail: false,
            frame_parsing: false,
            raw_frames: false,
        }
    }
}

impl DebugFlags {
    /// All flags off.
    pub fn quiet() -> Self {
        DebugFlags {
            frames: false,
            ..Default::default()
        }
    }
}

/// Configuration for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Time to wait for a matching frame, per attempt (milliseconds).
    pub wait_timeout_ms: u64,

    /// Attempts per wait including the initial send.
    pub wait_retry_max: u32,

    /// Watchdog interval (milliseconds). The transport is closed when no
    /// frame has been sent for this long.
    pub watchdog_timeout_ms: u64,

    /// Logging switches.
    pub debug: DebugFlags,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            wait_timeout_ms: WAIT_TIMEOUT_MS,
            wait_retry_max: WAIT_RETRY_MAX,
            watchdog_timeout_ms: WATCHDOG_TIMEOUT_MS,
            debug: DebugFlags::default(),
        }
    }
}

impl SchedulerConfig {
    /// Per-attempt wait timeout.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Watchdog interval.
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms)
    }

    /// Set the per-attempt wait timeout.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the default retry ceiling.
    pub fn with_wait_retry_max(mut self, retry_max: u32) -> Self {
        self.wait_retry_max = retry_max;
        self
    }

    /// Set the watchdog interval.
    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the logging switches.
    pub fn with_debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }
}

fn saturating_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.wait_timeout(), Duration::from_secs(1));
        assert_eq!(config.wait_retry_max, 3);
        assert_eq!(config.watchdog_timeout(), Duration::from_secs(5));
        assert!(config.debug.frames);
        assert!(!config.debug.flow);
    }

    #[test]
    fn test_oversized_timeouts_saturate() {
        let config = SchedulerConfig::default()
            .with_wait_timeout(Duration::MAX)
            .with_watchdog_timeout(Duration::MAX);
        assert_eq!(config.wait_timeout_ms, u64::MAX);
        assert_eq!(config.watchdog_timeout_ms, u64::MAX);

        let config = SchedulerConfig::default().with_wait_timeout(Duration::from_millis(1500));
        assert_eq!(config.wait_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "wait_timeout_ms: 250\ndebug:\n  flow: true\n";
        let config: SchedulerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.wait_timeout_ms, 250);
        assert_eq!(config.wait_retry_max, WAIT_RETRY_MAX);
        assert!(config.debug.flow);
        assert!(config.debug.frames);
    }
}
