//! The logical frame type.

use serde::{Deserialize, Serialize};

use crate::{FieldMap, FieldValue, FrameType, FromFieldValue};

/// Set on device-state bearing frames when the device holds queued inbound data.
pub const FIELD_DATA_INDICATION: &str = "data_indication";
/// Set on device-state bearing frames when a send confirmation is pending.
pub const FIELD_DATA_CONFIRM: &str = "data_confirm";
/// Sequence number chosen by the host for a request.
pub const FIELD_ID: &str = "id";
/// Status byte returned by the device.
pub const FIELD_STATUS: &str = "status";
/// Parameter id for read/write parameter frames.
pub const FIELD_PARAM_ID: &str = "param_id";
/// Parameter value for read/write parameter frames.
pub const FIELD_VALUE: &str = "value";
/// APS profile id.
pub const FIELD_PROFILE_ID: &str = "profile_id";
/// APS cluster id.
pub const FIELD_CLUSTER_ID: &str = "cluster_id";

/// Profile id carried by ZDO frames.
pub const ZDO_PROFILE_ID: u16 = 0x0000;

/// A decoded logical protocol message.
///
/// `resend`, `received` and `extra_params` are host-side annotations and are
/// never serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// The frame type.
    #[serde(rename = "type")]
    pub frame_type: FrameType,

    /// Named fields.
    #[serde(flatten)]
    pub fields: FieldMap,

    /// Set when the frame is being re-transmitted by a retry.
    #[serde(skip)]
    pub resend: bool,

    /// Set on frames that came from the device.
    #[serde(skip)]
    pub received: bool,

    /// Opaque parameters carried over from the wait this frame satisfied.
    #[serde(skip)]
    pub extra_params: Option<FieldMap>,
}

impl Frame {
    /// Create an empty frame of the given type.
    pub fn new(frame_type: FrameType) -> Self {
        Frame {
            frame_type,
            fields: FieldMap::new(),
            resend: false,
            received: false,
            extra_params: None,
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a field converted to a concrete type.
    ///
    /// Returns `None` when the field is missing or has another type.
    pub fn get_as<T: FromFieldValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_field_value)
    }

    /// True only if the field is present and is `Bool(true)`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FieldValue::Bool(true)))
    }

    /// Whether this is a ZDO frame (APS data with the ZDO profile).
    pub fn is_zdo(&self) -> bool {
        self.frame_type == FrameType::ApsDataIndication
            && self.get_as::<u16>(FIELD_PROFILE_ID) == Some(ZDO_PROFILE_ID)
    }

    /// The APS cluster id, if present.
    pub fn cluster_id(&self) -> Option<u16> {
        self.get_as(FIELD_CLUSTER_ID)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.frame_type)?;
        if !self.fields.is_empty() {
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " {{{}}}", fields.join(", "))?;
        }
        Ok(())
    }
}
