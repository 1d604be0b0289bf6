//! `[client]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [client]
//! url = "ws://127.0.0.1:8080/~watch.js"  # Change server socket
//! reconnect_interval = 1000               # Milliseconds between reconnect attempts
//! autostart = true                        # Connect when run without a command
//! page = "index.html"                     # Page seeding the live document
//! ```
//!
//! `http://` and `https://` urls are accepted and rewritten to their
//! websocket equivalents.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::util::normalize_socket_url;
use super::ConfigError;

/// Reconnect interval used when none (or `0`) is configured.
pub const DEFAULT_RECONNECT_MS: u64 = 1000;

/// Floor for the connect/handshake timeout.
const MIN_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Live-reload client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Socket url of the change server.
    pub url: String,

    /// Fixed delay between reconnect attempts, in milliseconds.
    pub reconnect_interval: u64,

    /// Start a session when no command is given.
    pub autostart: bool,

    /// HTML file whose head seeds the live document.
    pub page: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/~watch.js".to_string(),
            reconnect_interval: DEFAULT_RECONNECT_MS,
            autostart: true,
            page: PathBuf::from("index.html"),
        }
    }
}

impl ClientConfig {
    /// Socket url with `http(s)://` rewritten to `ws(s)://`.
    pub fn socket_url(&self) -> String {
        normalize_socket_url(&self.url)
    }

    /// Reconnect interval; `0` falls back to the default.
    pub fn reconnect_interval(&self) -> Duration {
        match self.reconnect_interval {
            0 => Duration::from_millis(DEFAULT_RECONNECT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    /// Bound for one connect attempt: the reconnect interval, but never
    /// less than five seconds.
    pub fn connect_timeout(&self) -> Duration {
        self.reconnect_interval().max(MIN_CONNECT_TIMEOUT)
    }

    /// Warning for a socket url the websocket transport cannot dial.
    pub fn scheme_warning(&self) -> Option<String> {
        let url = self.socket_url();
        url.starts_with("wss://").then(|| {
            format!("{url} uses wss://, which is not supported; every connection attempt will fail")
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation("[client] url must not be empty".into()));
        }
        Ok(())
    }
}
