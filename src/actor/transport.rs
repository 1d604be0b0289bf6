//! Transport seam between the session and the wire.
//!
//! A [`Connector`] opens message-oriented duplex channels without blocking
//! the caller. `open` only rejects what it can tell up front (bad url,
//! unsupported scheme); `Ok` means an attempt is under way. The outcome
//! arrives later through the [`EventSink`] handed to `open`: `Opened`
//! (the session's `Connecting -> Open` edge) or `OpenFailed`, followed by
//! messages and finally `Closed`/`Error`.

use thiserror::Error;

use super::messages::EventSink;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid socket url `{0}`: {1}")]
    InvalidUrl(String, String),

    #[error("unsupported scheme `{0}` (only ws:// can be dialled)")]
    UnsupportedScheme(String),

    #[error("connection to {0} failed")]
    Connect(String, #[source] std::io::Error),

    #[error("connection to {0} timed out")]
    Timeout(String),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("failed to spawn socket thread")]
    Spawn(#[source] std::io::Error),

    #[error("channel is closed")]
    Closed,
}

/// Sending half of an established channel.
pub trait Channel {
    /// Queue a text message for delivery. Text queued before the channel
    /// opens is sent right after the handshake.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the channel. No further events are reported for it.
    fn close(&mut self);
}

/// Opens channels to a socket url.
pub trait Connector {
    type Channel: Channel;

    /// Start opening a channel. Must not block on the network.
    fn open(&self, url: &str, events: EventSink) -> Result<Self::Channel, TransportError>;
}
