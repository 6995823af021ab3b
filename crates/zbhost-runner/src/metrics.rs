//! Metric declarations for the host process.

use zbhost_core::metrics::Metric;

/// Metrics recorded by the link driver and the probe session.
pub mod metric_defs {
    use super::Metric;
    use ::metrics::Unit;

    pub const LINK_BYTES_WRITTEN: Metric = Metric::counter("zbhost.link.bytes_written")
        .with_description("Bytes written to the device socket")
        .with_unit(Unit::Bytes);

    pub const LINK_BYTES_READ: Metric = Metric::counter("zbhost.link.bytes_read")
        .with_description("Bytes read from the device socket")
        .with_unit(Unit::Bytes);

    pub const LINK_DECODE_ERRORS: Metric = Metric::counter("zbhost.link.decode_errors")
        .with_description("Inbound lines that could not be decoded")
        .with_unit(Unit::Count);

    pub const SCAN_NEIGHBORS: Metric = Metric::gauge("zbhost.scan.neighbors")
        .with_description("Neighbours found by the current scan")
        .with_unit(Unit::Count);

    /// All declared metrics.
    pub const ALL: &[Metric] = &[
        LINK_BYTES_WRITTEN,
        LINK_BYTES_READ,
        LINK_DECODE_ERRORS,
        SCAN_NEIGHBORS,
    ];
}

/// Register descriptions for engine and host metrics.
pub fn describe_metrics() {
    zbhost_core::metrics::describe_metrics();
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_do_not_clash_with_engine() {
        for metric in metric_defs::ALL {
            assert!(metric.name.starts_with("zbhost."));
            assert!(zbhost_core::metrics::metric_defs::ALL
                .iter()
                .all(|m| m.name != metric.name));
        }
    }
}
