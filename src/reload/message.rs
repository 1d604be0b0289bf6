//! Live Reload Message Protocol
//!
//! JSON messages exchanged with the development server.
//!
//! # Inbound
//!
//! ```text
//! {"type": "hello",   "data": null}
//! {"type": "changes", "data": [{"path": "/app.css", "kind": "modify", "action": "inject"}]}
//! ```
//!
//! # Outbound
//!
//! ```text
//! {"type": "hello"}
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Change Descriptor
// =============================================================================

/// Server directive for a single change, independent of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Skip this change
    Ignore,
    /// Full document reload, aborts the rest of the batch
    Reload,
    /// Patch the document in place
    Inject,
    /// Any other directive; handled like `inject`
    #[default]
    #[serde(other)]
    Unknown,
}

/// Structural kind of the filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Delete,
    Modify,
    /// Unrecognised kind (e.g. the empty kind of a server-wide reload)
    #[default]
    #[serde(other)]
    Unknown,
}

/// One reported file event, as received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    /// Resource path, used as content locator and identity marker
    pub path: String,
    #[serde(default)]
    pub kind: ChangeKind,
    #[serde(default)]
    pub action: Action,
    /// File modification time as reported by the watcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Package name declared by the file (defaults to the path server-side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Packages this file depends on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<Vec<String>>,
}

impl ChangeDescriptor {
    pub fn new(path: impl Into<String>, action: Action, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            action,
            modified: None,
            package: None,
            depends: None,
        }
    }

    pub fn inject(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self::new(path, Action::Inject, kind)
    }

    pub fn reload(path: impl Into<String>) -> Self {
        Self::new(path, Action::Reload, ChangeKind::Unknown)
    }

    pub fn ignore(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self::new(path, Action::Ignore, kind)
    }
}

// =============================================================================
// Inbound Envelope
// =============================================================================

/// Errors decoding an inbound message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

/// Handler selector carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Hello,
    Changes,
}

impl FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hello" => Ok(Self::Hello),
            "changes" => Ok(Self::Changes),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// Raw `{type, data}` envelope. `data` stays untyped until the handler
/// for `type` is known.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Parse from JSON string
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn message_type(&self) -> Result<MessageType, ProtocolError> {
        self.kind.parse()
    }

    /// Decode `data` as an ordered change batch.
    pub fn into_changes(self) -> Result<Vec<ChangeDescriptor>, ProtocolError> {
        Ok(serde_json::from_value(self.data)?)
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Message sent by the client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Sent once on every established channel
    Hello,
}

impl ClientMessage {
    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"hello"}"#.to_string())
    }
}
