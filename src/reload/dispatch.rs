//! Inbound message dispatch.
//!
//! Counts every message received on a session. The first one is dropped
//! unseen, whatever its type; the rest are decoded and routed by `type`.

use super::apply::{ApplyReport, ChangeApplier};
use super::message::{Envelope, MessageType, ProtocolError};
use crate::document::Document;

/// Outcome of handling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// First message of the session, not decoded
    Dropped,
    /// Server greeting
    Hello,
    /// Change batch applied
    Changes(ApplyReport),
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    /// Messages received on this session, including dropped ones
    received: u64,
    applier: ChangeApplier,
}

impl Dispatcher {
    pub fn new(applier: ChangeApplier) -> Self {
        Self {
            received: 0,
            applier,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Start counting again for a fresh session.
    pub fn reset(&mut self) {
        self.received = 0;
    }

    /// Handle one raw text message.
    ///
    /// Decode failures and unknown types are returned to the caller; the
    /// message is not applied.
    pub fn on_message<D: Document + ?Sized>(
        &mut self,
        raw: &str,
        document: &mut D,
    ) -> Result<Dispatch, ProtocolError> {
        self.received += 1;
        if self.received <= 1 {
            return Ok(Dispatch::Dropped);
        }

        let envelope = Envelope::decode(raw)?;
        match envelope.message_type()? {
            MessageType::Hello => {
                crate::debug!("ws"; "server says hello");
                Ok(Dispatch::Hello)
            }
            MessageType::Changes => {
                let changes = envelope.into_changes()?;
                Ok(Dispatch::Changes(self.applier.apply(document, &changes)))
            }
        }
    }
}
