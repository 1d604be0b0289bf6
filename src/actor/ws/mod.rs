//! WebSocket Transport
//!
//! Dials `ws://` urls with tungstenite. Each channel gets its own socket
//! thread that connects, runs the handshake, and then owns the
//! (non-blocking) socket. Nothing here blocks the session loop:
//!
//! ```text
//! Session --[Outbound]--> socket thread --frames--> server
//!    ^                         |
//!    +-----[SessionEvent]------+   Opened | OpenFailed, then messages
//! ```

mod client_io;

use std::time::Duration;

use crossbeam::channel::{self, Sender};
use url::Url;

use super::messages::EventSink;
use super::transport::{Channel, Connector, TransportError};

/// Upper bound for TCP connect and handshake when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames queued for the socket thread.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Connector for plain `ws://` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct WsConnector {
    /// Bound for each of connect, handshake read and handshake write
    timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WsConnector {
    /// A zero timeout is raised to one millisecond.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(Duration::from_millis(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Sending half of a tungstenite channel.
#[derive(Debug)]
pub struct WsChannel {
    outbound: Sender<Outbound>,
}

impl Connector for WsConnector {
    type Channel = WsChannel;

    fn open(&self, url: &str, events: EventSink) -> Result<WsChannel, TransportError> {
        let target =
            Url::parse(url).map_err(|e| TransportError::InvalidUrl(url.into(), e.to_string()))?;
        if target.scheme() != "ws" {
            return Err(TransportError::UnsupportedScheme(target.scheme().into()));
        }
        if target.host_str().is_none_or(str::is_empty) {
            return Err(TransportError::InvalidUrl(url.into(), "missing host".into()));
        }

        let (tx, rx) = channel::unbounded();
        let timeout = self.timeout;
        std::thread::Builder::new()
            .name(format!("relive-ws-{}", events.generation()))
            .spawn(move || client_io::run_channel(target, timeout, rx, events))
            .map_err(TransportError::Spawn)?;

        Ok(WsChannel { outbound: tx })
    }
}

impl Channel for WsChannel {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}
