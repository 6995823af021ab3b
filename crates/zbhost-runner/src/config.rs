//! Host configuration.
//!
//! A run is described by a YAML file; every field has a default, so an
//! empty file probes a coordinator on the default address.
//!
//! ```yaml
//! connect: 127.0.0.1:5555
//! scheduler:
//!   wait_timeout_ms: 1000
//!   debug:
//!     flow: true
//! parameters: [mac_address, operating_channel]
//! query_version: true
//! scan: true
//! writes:
//!   - param: network_update_id
//!     value: 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use zbhost_core::SchedulerConfig;
use zbhost_frame::FieldValue;

use crate::ConfigError;

/// Default device address.
pub const DEFAULT_CONNECT: &str = "127.0.0.1:5555";

// ============================================================================
// Device parameters
// ============================================================================

/// Network parameters the coordinator exposes through
/// `READ_PARAMETER` / `WRITE_PARAMETER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamId {
    MacAddress,
    NetworkPanid16,
    NetworkAddr16,
    NetworkPanid64,
    ApsDesignatedCoordinator,
    ScanChannels,
    ApsPanid64,
    TrustCenterAddr64,
    SecurityMode,
    NetworkKey,
    OperatingChannel,
    ProtocolVersion,
    NetworkUpdateId,
}

impl ParamId {
    /// Parameter id on the wire.
    pub const fn id(self) -> u8 {
        match self {
            ParamId::MacAddress => 0x01,
            ParamId::NetworkPanid16 => 0x05,
            ParamId::NetworkAddr16 => 0x07,
            ParamId::NetworkPanid64 => 0x08,
            ParamId::ApsDesignatedCoordinator => 0x09,
            ParamId::ScanChannels => 0x0A,
            ParamId::ApsPanid64 => 0x0B,
            ParamId::TrustCenterAddr64 => 0x0E,
            ParamId::SecurityMode => 0x10,
            ParamId::NetworkKey => 0x18,
            ParamId::OperatingChannel => 0x1C,
            ParamId::ProtocolVersion => 0x22,
            ParamId::NetworkUpdateId => 0x24,
        }
    }

    /// Column label used when dumping parameters.
    pub const fn label(self) -> &'static str {
        match self {
            ParamId::MacAddress => "mac_address",
            ParamId::NetworkPanid16 => "network_panid16",
            ParamId::NetworkAddr16 => "network_addr16",
            ParamId::NetworkPanid64 => "network_panid64",
            ParamId::ApsDesignatedCoordinator => "aps_designated_coordinator",
            ParamId::ScanChannels => "scan_channels",
            ParamId::ApsPanid64 => "aps_panid64",
            ParamId::TrustCenterAddr64 => "trust_center_addr64",
            ParamId::SecurityMode => "security_mode",
            ParamId::NetworkKey => "network_key",
            ParamId::OperatingChannel => "operating_channel",
            ParamId::ProtocolVersion => "protocol_version",
            ParamId::NetworkUpdateId => "network_update_id",
        }
    }
}

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.label(), self.id())
    }
}

/// Parameters read at start-up when the configuration names none.
pub fn default_parameters() -> Vec<ParamId> {
    vec![
        ParamId::MacAddress,
        ParamId::NetworkPanid64,
        ParamId::ScanChannels,
        ParamId::OperatingChannel,
    ]
}

/// One parameter write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamWrite {
    pub param: ParamId,
    pub value: FieldValue,
}

// ============================================================================
// Runner configuration
// ============================================================================

/// Configuration for one host run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Device address (`host:port`).
    pub connect: String,
    /// Engine timing and logging.
    pub scheduler: SchedulerConfig,
    /// Parameters read one after another at start-up.
    pub parameters: Vec<ParamId>,
    /// Ask the firmware for its version.
    pub query_version: bool,
    /// Walk the coordinator's neighbour table.
    pub scan: bool,
    /// Parameters to write after the initial read.
    pub writes: Vec<ParamWrite>,
    /// Stop once all start-up work is done.
    pub exit_when_idle: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            connect: DEFAULT_CONNECT.to_string(),
            scheduler: SchedulerConfig::default(),
            parameters: default_parameters(),
            query_version: false,
            scan: false,
            writes: Vec::new(),
            exit_when_idle: true,
        }
    }
}

impl RunnerConfig {
    /// Check the configuration for values no run can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect.trim().is_empty() {
            return Err(ConfigError::Invalid("connect address is empty".into()));
        }
        if self.scheduler.wait_retry_max == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.wait_retry_max must be at least 1".into(),
            ));
        }
        if self.scheduler.wait_timeout_ms == 0 || self.scheduler.watchdog_timeout_ms == 0 {
            return Err(ConfigError::Invalid("scheduler timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parse and validate a configuration from YAML text.
pub fn load_config_from_str(yaml: &str) -> Result<RunnerConfig, ConfigError> {
    // An empty document deserialises to unit, not to a defaulted struct.
    let config: RunnerConfig = if yaml.trim().is_empty() {
        RunnerConfig::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RunnerConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.parameters.len(), 4);
        assert!(config.exit_when_idle);
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
connect: 10.0.0.2:6000
scheduler:
  wait_timeout_ms: 250
  debug:
    flow: true
    frames: false
parameters: [operating_channel]
query_version: true
scan: true
writes:
  - param: network_update_id
    value: 2
  - param: mac_address
    value: "00:21:2e:ff:ff:00:aa:bb"
"#;
        let config = load_config_from_str(yaml).unwrap();
        assert_eq!(config.connect, "10.0.0.2:6000");
        assert_eq!(config.scheduler.wait_timeout_ms, 250);
        assert_eq!(config.scheduler.wait_retry_max, 3);
        assert!(config.scheduler.debug.flow);
        assert!(!config.scheduler.debug.frames);
        assert_eq!(config.parameters, vec![ParamId::OperatingChannel]);
        assert!(config.query_version && config.scan);
        assert_eq!(config.writes[0].param, ParamId::NetworkUpdateId);
        assert_eq!(config.writes[0].value, FieldValue::Integer(2));
        assert_eq!(
            config.writes[1].value,
            FieldValue::String("00:21:2e:ff:ff:00:aa:bb".into())
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let err = load_config_from_str("parameters: [frequency]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_config_from_str("connect: \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load_config_from_str("scheduler:\n  wait_retry_max: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/zbhost.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zbhost.yaml"));
    }

    #[test]
    fn test_param_ids() {
        assert_eq!(ParamId::MacAddress.id(), 0x01);
        assert_eq!(ParamId::OperatingChannel.id(), 0x1C);
        assert_eq!(ParamId::ScanChannels.to_string(), "scan_channels (0x0A)");
    }
}
