//! Session Message Definitions
//!
//! Events flowing into the session loop.
//!
//! ```text
//! socket thread --Opened/OpenFailed/Message/Closed/Error--> Session <--Shutdown-- Ctrl+C
//! ```

use tokio::sync::mpsc;

/// Events handled by the session loop.
///
/// Channel events carry the generation of the channel that produced them;
/// events from a superseded channel are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connect and handshake finished; the channel can carry messages
    Opened { generation: u64 },
    /// Connect or handshake failed; the channel never opened
    OpenFailed { generation: u64, error: String },
    /// Whole text message received
    Message { generation: u64, text: String },
    /// Channel closed by the peer or the network
    Closed {
        generation: u64,
        reason: Option<String>,
    },
    /// Transport failure; treated like a close
    Error { generation: u64, error: String },
    /// Stop the session
    Shutdown,
}

impl SessionEvent {
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Opened { generation }
            | Self::OpenFailed { generation, .. }
            | Self::Message { generation, .. }
            | Self::Closed { generation, .. }
            | Self::Error { generation, .. } => Some(*generation),
            Self::Shutdown => None,
        }
    }
}

/// Handle a channel uses to report its events, stamped with its generation.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a finished handshake. Returns false once the session is gone.
    pub fn opened(&self) -> bool {
        self.send(SessionEvent::Opened {
            generation: self.generation,
        })
    }

    pub fn open_failed(&self, error: impl Into<String>) -> bool {
        self.send(SessionEvent::OpenFailed {
            generation: self.generation,
            error: error.into(),
        })
    }

    /// Forward a text message. Returns false once the session is gone.
    pub fn message(&self, text: String) -> bool {
        self.send(SessionEvent::Message {
            generation: self.generation,
            text,
        })
    }

    pub fn closed(&self, reason: Option<String>) -> bool {
        self.send(SessionEvent::Closed {
            generation: self.generation,
            reason,
        })
    }

    pub fn error(&self, error: impl Into<String>) -> bool {
        self.send(SessionEvent::Error {
            generation: self.generation,
            error: error.into(),
        })
    }

    fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
