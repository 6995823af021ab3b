//! Error types for the host process.

use std::path::PathBuf;

use thiserror::Error;
use zbhost_core::SchedulerError;

/// Errors raised while loading a [`RunnerConfig`](crate::RunnerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the configuration schema.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but makes no sense.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that end a host run.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Socket failure.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fatal engine error.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_core::TransportError;

    #[test]
    fn test_display() {
        let err = RunnerError::from(SchedulerError::from(TransportError::Closed));
        assert_eq!(err.to_string(), "scheduler error: transport closed");
        assert_eq!(
            RunnerError::from(ConfigError::Invalid("connect is empty".into())).to_string(),
            "invalid configuration: connect is empty"
        );
    }
}
