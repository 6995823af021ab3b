//! Transport trait for the outbound half of the link.
//!
//! The scheduler hands encoded bytes to a [`Transport`] and never reads from
//! it: inbound frames arrive through
//! [`Scheduler::on_frame`](crate::Scheduler::on_frame), called by whoever
//! owns the receive side. Sends are fire-and-forget; a write failure is
//! fatal and is not retried by the engine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::TransportError;

/// Byte-level sink to the transceiver.
pub trait Transport {
    /// Send raw bytes.
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Close the connection. Subsequent sends fail with
    /// [`TransportError::Closed`].
    fn close(&mut self);

    /// Check whether the transport is still open.
    fn is_open(&self) -> bool;
}

#[derive(Debug, Default)]
struct MemoryLog {
    sent: Vec<Vec<u8>>,
    closed: bool,
    fail_writes: bool,
}

/// An in-memory transport that records every write.
///
/// Clones share the same log, so one handle can be given to the scheduler
/// and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    log: Rc<RefCell<MemoryLog>>,
}

impl MemoryTransport {
    /// Create an open, empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.log.borrow().sent.clone()
    }

    /// Remove and return everything written so far.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.log.borrow_mut().sent)
    }

    /// Make subsequent writes fail with [`TransportError::Write`].
    pub fn fail_writes(&self, fail: bool) {
        self.log.borrow_mut().fail_writes = fail;
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut log = self.log.borrow_mut();
        if log.closed {
            return Err(TransportError::Closed);
        }
        if log.fail_writes {
            return Err(TransportError::Write("simulated write failure".to_string()));
        }
        log.sent.push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }

    fn is_open(&self) -> bool {
        !self.log.borrow().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_records_and_closes() {
        let mut transport = MemoryTransport::new();
        let inspect = transport.clone();

        transport.send(b"abc").unwrap();
        assert_eq!(inspect.sent(), vec![b"abc".to_vec()]);

        transport.close();
        assert!(!inspect.is_open());
        assert!(matches!(transport.send(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn test_memory_transport_failure() {
        let mut transport = MemoryTransport::new();
        transport.fail_writes(true);
        assert!(matches!(transport.send(b"x"), Err(TransportError::Write(_))));
        assert!(transport.take_sent().is_empty());
    }
}
