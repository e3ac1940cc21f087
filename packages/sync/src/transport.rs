//! Outgoing side of the message channel.
//!
//! Sends are fire-and-forget: a transport either accepts the envelope or reports
//! why it could not, and the caller never waits for a reply.

use crate::errors::TransportError;
use crate::message::ActionMessage;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub trait TransportSink {
    fn send_message(&mut self, message: ActionMessage) -> Result<(), TransportError>;
}

/// Encodes envelopes as JSON text onto a bounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }

    /// Transport plus the receiving end the connection task reads from
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl TransportSink for ChannelTransport {
    fn send_message(&mut self, message: ActionMessage) -> Result<(), TransportError> {
        let text = message.to_json()?;
        self.sender.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Keeps every sent envelope in a shared log
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Rc<RefCell<Vec<ActionMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ActionMessage> {
        self.sent.borrow().clone()
    }

    /// Kinds of the sent actions, in send order
    pub fn sent_kinds(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|m| m.action.kind().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl TransportSink for MemoryTransport {
    fn send_message(&mut self, message: ActionMessage) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(message);
        Ok(())
    }
}
