//! Frame codec seams and the newline-delimited JSON reference codec.
//!
//! The engine only ever hands a [`Frame`] to a [`FrameEncoder`] and receives
//! frames from a [`FrameDecoder`]. Real device framing (SLIP, CRC, escaping)
//! lives behind these traits and is not part of this crate.
//!
//! [`JsonLineCodec`] is a host-side stand-in: each frame is one JSON object
//! terminated by `\n`.
//!
//! ```text
//! {"type":"read_parameter","param_id":1}\n
//! ```

use bytes::BytesMut;
use tracing::trace;

use crate::{Frame, FrameError};

/// Maximum length of one encoded frame line (excluding the terminator).
pub const MAX_LINE_LENGTH: usize = 4096;

/// Turns a logical frame into bytes for transmission.
pub trait FrameEncoder {
    /// Encode a frame, including any framing the transport needs.
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, FrameError>;
}

/// Accumulates received bytes and yields decoded frames.
pub trait FrameDecoder {
    /// Add received data to the buffer.
    fn push(&mut self, data: &[u8]);

    /// Try to decode the next complete frame.
    ///
    /// Returns `Ok(Some(frame))` if a frame was decoded, `Ok(None)` if more
    /// data is needed, or `Err` if a complete line could not be decoded. The
    /// offending line is consumed, so calling again continues with the next.
    fn decode_frame(&mut self) -> Result<Option<Frame>, FrameError>;
}

/// A codec for newline-delimited JSON frames.
#[derive(Debug, Default)]
pub struct JsonLineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl JsonLineCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        JsonLineCodec {
            buffer: BytesMut::with_capacity(MAX_LINE_LENGTH),
        }
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl FrameEncoder for JsonLineCodec {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, FrameError> {
        let mut buf = serde_json::to_vec(frame)?;
        if buf.len() > MAX_LINE_LENGTH {
            return Err(FrameError::FrameTooLong {
                max: MAX_LINE_LENGTH,
                actual: buf.len(),
            });
        }
        buf.push(b'\n');
        Ok(buf)
    }
}

impl FrameDecoder for JsonLineCodec {
    fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    fn decode_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            let Some(end) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_LINE_LENGTH {
                    let actual = self.buffer.len();
                    self.buffer.clear();
                    return Err(FrameError::FrameTooLong {
                        max: MAX_LINE_LENGTH,
                        actual,
                    });
                }
                return Ok(None);
            };

            let line = self.buffer.split_to(end + 1);
            let line = &line[..end];
            let text = std::str::from_utf8(line).map_err(|_| FrameError::InvalidUtf8)?;
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            if text.len() > MAX_LINE_LENGTH {
                return Err(FrameError::FrameTooLong {
                    max: MAX_LINE_LENGTH,
                    actual: text.len(),
                });
            }

            trace!("decoding frame line: {}", text);
            let mut frame: Frame = serde_json::from_str(text)?;
            frame.received = true;
            return Ok(Some(frame));
        }
    }
}
