//! Frame expectations.
//!
//! A [`WaitSpec`] describes the frame a `WaitFrame` command is waiting for.
//! Matching is strict equality on every expected field; the frame type is an
//! optional typed criterion. Retry counters, callbacks and extra parameters
//! live in their own members and never take part in matching.

use std::fmt;

use zbhost_frame::{FieldMap, FieldValue, Frame, FrameType};

use crate::{QueueError, Result, Scheduler};

/// Called with the matching frame when a wait is satisfied.
pub type MatchCallback<D> = Box<dyn FnOnce(&mut Scheduler<D>, &Frame) -> Result<()>>;

/// Called when a wait is exhausted.
pub type TimeoutCallback<D> = Box<dyn FnOnce(&mut Scheduler<D>) -> Result<()>>;

/// An expectation on the next inbound frame.
pub struct WaitSpec<D> {
    frame_type: Option<FrameType>,
    fields: FieldMap,
    on_match: Option<MatchCallback<D>>,
    on_timeout: Option<TimeoutCallback<D>>,
    retry_count: Option<u32>,
    retry_max: Option<u32>,
    extra_params: Option<FieldMap>,
}

impl<D> WaitSpec<D> {
    /// An expectation that matches any frame.
    pub fn any() -> Self {
        WaitSpec {
            frame_type: None,
            fields: FieldMap::new(),
            on_match: None,
            on_timeout: None,
            retry_count: None,
            retry_max: None,
            extra_params: None,
        }
    }

    /// An expectation on the frame type.
    pub fn for_type(frame_type: FrameType) -> Self {
        WaitSpec {
            frame_type: Some(frame_type),
            ..Self::any()
        }
    }

    /// Also require `name` to equal `value`.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Run `f` with the matching frame.
    pub fn on_match<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Scheduler<D>, &Frame) -> Result<()> + 'static,
    {
        self.on_match = Some(Box::new(f));
        self
    }

    /// Run `f` when every attempt has timed out.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Scheduler<D>) -> Result<()> + 'static,
    {
        self.on_timeout = Some(Box::new(f));
        self
    }

    /// Start counting attempts at `count` instead of 1.
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Allow `max` attempts instead of the configured default.
    pub fn retry_max(mut self, max: u32) -> Self {
        self.retry_max = Some(max);
        self
    }

    /// Parameters attached to any frame received while this wait is active.
    pub fn extra_params(mut self, params: FieldMap) -> Self {
        self.extra_params = Some(params);
        self
    }

    /// Expected frame type, if constrained.
    pub fn frame_type(&self) -> Option<FrameType> {
        self.frame_type
    }

    /// Expected field values.
    pub fn expected(&self) -> &FieldMap {
        &self.fields
    }

    /// Current attempt number, once the wait has started.
    pub fn attempt(&self) -> Option<u32> {
        self.retry_count
    }

    /// Attempt ceiling, once the wait has started.
    pub fn ceiling(&self) -> Option<u32> {
        self.retry_max
    }

    /// Extra parameters, if any.
    pub fn extra(&self) -> Option<&FieldMap> {
        self.extra_params.as_ref()
    }

    /// Whether `frame` satisfies this expectation.
    pub fn matches(&self, frame: &Frame) -> bool {
        if let Some(expected) = self.frame_type {
            if frame.frame_type != expected {
                return false;
            }
        }
        self.fields
            .iter()
            .all(|(name, value)| frame.get(name) == Some(value))
    }

    pub(crate) fn apply_defaults(&mut self, retry_max: u32) {
        self.retry_count.get_or_insert(1);
        self.retry_max.get_or_insert(retry_max);
    }

    pub(crate) fn set_attempt(&mut self, count: u32) {
        self.retry_count = Some(count);
    }

    pub(crate) fn take_on_match(&mut self) -> Option<MatchCallback<D>> {
        self.on_match.take()
    }

    pub(crate) fn take_on_timeout(&mut self) -> Option<TimeoutCallback<D>> {
        self.on_timeout.take()
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), QueueError> {
        let invalid = match (self.retry_count, self.retry_max) {
            (_, Some(0)) => true,
            (Some(count), Some(max)) => count > max,
            _ => false,
        };
        if invalid {
            return Err(QueueError::InvalidWaitSpec {
                retry_count: self.retry_count.unwrap_or(1),
                retry_max: self.retry_max.unwrap_or(0),
            });
        }
        Ok(())
    }
}

impl<D> Default for WaitSpec<D> {
    fn default() -> Self {
        Self::any()
    }
}

impl<D> fmt::Debug for WaitSpec<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        if let Some(t) = self.frame_type {
            write!(f, "type={}", t)?;
            first = false;
        }
        for (name, value) in &self.fields {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        if let (Some(count), Some(max)) = (self.retry_count, self.retry_max) {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "try {}/{}", count, max)?;
        }
        f.write_str("}")
    }
}
