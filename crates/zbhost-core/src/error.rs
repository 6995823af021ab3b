//! Error types for the orchestration engine.

use thiserror::Error;
use zbhost_frame::FrameError;

/// Errors raised while validating a command batch at enqueue time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A batch with no commands was submitted.
    #[error("empty command batch")]
    EmptyBatch,

    /// A numeric command tag outside the known range.
    #[error("invalid command type: 0x{0:02X}")]
    UnknownTag(u8),

    /// A wait whose retry counter or ceiling cannot make progress.
    #[error("invalid wait: retry count {retry_count} with ceiling {retry_max}")]
    InvalidWaitSpec {
        /// Configured retry counter.
        retry_count: u32,
        /// Configured retry ceiling.
        retry_max: u32,
    },
}

/// Errors reported by a [`Transport`](crate::Transport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport has been closed.
    #[error("transport closed")]
    Closed,

    /// Writing to the underlying channel failed.
    #[error("transport write failed: {0}")]
    Write(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A batch failed validation.
    #[error("invalid command batch: {0}")]
    Queue(#[from] QueueError),

    /// A frame could not be encoded for transmission.
    #[error("frame encode failed: {0}")]
    Encode(#[from] FrameError),

    /// Transmission failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A device-logic handler or callback failed.
    #[error("handler error: {0}")]
    Handler(String),
}

impl SchedulerError {
    /// Whether this error must stop the engine.
    ///
    /// Validation, encode and transport failures are fatal. Handler failures
    /// are reported and frame processing continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SchedulerError::Handler(_))
    }

    /// Shorthand for a handler error.
    pub fn handler(msg: impl Into<String>) -> Self {
        SchedulerError::Handler(msg.into())
    }
}

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
