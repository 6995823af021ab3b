//! Channel-backed transport.
//!
//! The scheduler is synchronous and the socket is async, so the scheduler's
//! [`Transport`] just queues encoded bytes on an unbounded channel. The
//! link driver drains the channel into the socket.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use zbhost_core::{Transport, TransportError};

/// Transport that forwards every write to a tokio channel.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: Option<UnboundedSender<Vec<u8>>>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its writes arrive on.
    pub fn new() -> (Self, UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = unbounded_channel();
        (ChannelTransport { tx: Some(tx) }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(data.to_vec()).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.tx = None;
    }

    fn is_open(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
