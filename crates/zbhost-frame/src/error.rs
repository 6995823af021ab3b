//! Frame error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// An encoded frame line exceeded the maximum length.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A frame line was not valid JSON or did not describe a frame.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame type code outside the known set.
    #[error("unknown frame type: 0x{0:02X}")]
    UnknownFrameType(u8),

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in frame line")]
    InvalidUtf8,
}
