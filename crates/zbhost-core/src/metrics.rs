//! Metric declarations for the engine.
//!
//! Every metric the scheduler records is declared once here as a [`Metric`]
//! constant, so names cannot drift between the recording site and the
//! description registered at startup. Recording goes through the `metrics`
//! facade; without an installed recorder it is a no-op.
//!
//! ```rust
//! use zbhost_core::metrics::{metric_defs, MetricKind};
//!
//! assert_eq!(metric_defs::FRAMES_SENT.name, "zbhost.frames.sent");
//! assert_eq!(metric_defs::QUEUE_DEPTH.kind, MetricKind::Gauge);
//! ```

use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name.
    pub name: &'static str,
    /// Counter, gauge or histogram.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement.
    pub unit: Option<Unit>,
}

impl Metric {
    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Metric {
            name,
            kind,
            description: "",
            unit: None,
        }
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// Every metric the engine records.
pub mod metric_defs {
    use super::Metric;
    use ::metrics::Unit;

    pub const FRAMES_SENT: Metric = Metric::counter("zbhost.frames.sent")
        .with_description("Frames transmitted, resends included")
        .with_unit(Unit::Count);

    pub const FRAMES_RESENT: Metric = Metric::counter("zbhost.frames.resent")
        .with_description("Frames re-transmitted after a wait timed out")
        .with_unit(Unit::Count);

    pub const FRAMES_RECEIVED: Metric = Metric::counter("zbhost.frames.received")
        .with_description("Frames received from the device")
        .with_unit(Unit::Count);

    pub const WAIT_MATCHED: Metric = Metric::counter("zbhost.wait.matched")
        .with_description("Waits satisfied by a matching frame")
        .with_unit(Unit::Count);

    pub const WAIT_RETRIED: Metric = Metric::counter("zbhost.wait.retried")
        .with_description("Wait timeouts that led to a resend")
        .with_unit(Unit::Count);

    pub const WAIT_EXHAUSTED: Metric = Metric::counter("zbhost.wait.exhausted")
        .with_description("Waits that ran out of attempts")
        .with_unit(Unit::Count);

    pub const WAIT_LATENCY: Metric = Metric::histogram("zbhost.wait.latency")
        .with_description("Time from wait start to matching frame")
        .with_unit(Unit::Seconds);

    pub const DRAIN_INJECTED: Metric = Metric::counter("zbhost.drain.injected")
        .with_description("Drain cycles started on device signal")
        .with_unit(Unit::Count);

    pub const WATCHDOG_TRIPPED: Metric = Metric::counter("zbhost.watchdog.tripped")
        .with_description("Watchdog expiries that closed the transport")
        .with_unit(Unit::Count);

    pub const QUEUE_DEPTH: Metric = Metric::gauge("zbhost.queue.depth")
        .with_description("Commands waiting in the queue")
        .with_unit(Unit::Count);

    /// All declared metrics.
    pub const ALL: &[Metric] = &[
        FRAMES_SENT,
        FRAMES_RESENT,
        FRAMES_RECEIVED,
        WAIT_MATCHED,
        WAIT_RETRIED,
        WAIT_EXHAUSTED,
        WAIT_LATENCY,
        DRAIN_INJECTED,
        WATCHDOG_TRIPPED,
        QUEUE_DEPTH,
    ];
}

/// Register descriptions for every engine metric.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for metric in metric_defs::ALL {
            assert!(metric.name.starts_with("zbhost."), "{}", metric.name);
            assert!(seen.insert(metric.name), "duplicate {}", metric.name);
            assert!(!metric.description.is_empty());
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
