//! Device properties with deferred write completion.
//!
//! A host that writes a property to the device usually wants to know when
//! the write has gone through. [`Property::defer_set`] hands out a oneshot
//! receiver; queueing [`Command::resolve`](crate::Command::resolve) after the
//! write's send/wait pair fulfils it with the property's value once the
//! scheduler reaches that point. The sender is consumed on resolution, so a
//! completion can never be delivered twice.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::oneshot;
use tracing::trace;
use zbhost_frame::FieldValue;

/// Shared handle to a property, as carried by queued commands.
pub type PropertyHandle = Rc<RefCell<Property>>;

/// A named device property.
#[derive(Debug)]
pub struct Property {
    name: String,
    value: FieldValue,
    deferred: Option<oneshot::Sender<FieldValue>>,
}

impl Property {
    /// Create a property with an initial value.
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Property {
            name: name.into(),
            value: value.into(),
            deferred: None,
        }
    }

    /// Wrap the property in a shared handle.
    pub fn into_handle(self) -> PropertyHandle {
        Rc::new(RefCell::new(self))
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Replace the current value.
    pub fn set_value(&mut self, value: impl Into<FieldValue>) {
        self.value = value.into();
    }

    /// Register a deferred completion and return its receiver.
    ///
    /// A completion registered earlier and not yet resolved is dropped; its
    /// receiver observes a closed channel.
    pub fn defer_set(&mut self) -> oneshot::Receiver<FieldValue> {
        let (tx, rx) = oneshot::channel();
        self.deferred = Some(tx);
        rx
    }

    /// Whether a completion is waiting to be resolved.
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Fulfil the pending completion with the current value.
    ///
    /// Returns `false` when there was nothing to resolve.
    pub fn resolve(&mut self) -> bool {
        let Some(tx) = self.deferred.take() else {
            return false;
        };
        trace!("resolving deferred set of {}", self.name);
        // The receiver may have been dropped; that is the caller's choice.
        let _ = tx.send(self.value.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fulfils_once() {
        let mut prop = Property::new("channel", 11u8);
        let mut rx = prop.defer_set();
        prop.set_value(15u8);

        assert!(prop.resolve());
        assert_eq!(rx.try_recv().unwrap(), FieldValue::Integer(15));

        assert!(!prop.has_deferred());
        assert!(!prop.resolve());
    }

    #[test]
    fn test_replaced_completion_is_closed() {
        let mut prop = Property::new("pan_id", 0x1a62u16);
        let mut first = prop.defer_set();
        let mut second = prop.defer_set();

        assert!(prop.resolve());
        assert!(first.try_recv().is_err());
        assert_eq!(second.try_recv().unwrap(), FieldValue::Integer(0x1a62));
    }
}
