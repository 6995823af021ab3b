//! Logical frame model for zbhost.
//!
//! This crate defines the decoded, protocol-level view of the messages the
//! host exchanges with a Zigbee transceiver. The orchestration engine in
//! `zbhost-core` never sees raw bytes: everything it sends and receives is a
//! [`Frame`], a frame type plus a set of named fields.
//!
//! # Overview
//!
//! - [`FrameType`] and [`ZdoCluster`] are the closed tags used for dispatch
//! - [`FieldValue`] is the dynamic value type for frame fields
//! - [`Frame`] is the logical message itself
//! - [`FrameEncoder`] / [`FrameDecoder`] are the codec seams, with
//!   [`JsonLineCodec`] as the host-side reference implementation
//!
//! # Example
//!
//! ```rust
//! use zbhost_frame::{Frame, FrameType, FrameEncoder, FrameDecoder, JsonLineCodec};
//!
//! let frame = Frame::new(FrameType::ReadParameter).with("param_id", 1u8);
//! let mut codec = JsonLineCodec::new();
//! let bytes = codec.encode(&frame).unwrap();
//!
//! codec.push(&bytes);
//! let decoded = codec.decode_frame().unwrap().unwrap();
//! assert_eq!(decoded.frame_type, FrameType::ReadParameter);
//! ```

mod codec;
mod error;
mod frame;
mod types;
mod value;

pub use codec::*;
pub use error::*;
pub use frame::*;
pub use types::*;
pub use value::*;
