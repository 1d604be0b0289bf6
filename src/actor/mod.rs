//! Actor System for Live Reload
//!
//! The session loop owns all client state; socket threads only forward
//! what they read:
//!
//! ```text
//! socket thread --SessionEvent--> Session --> Dispatcher --> Document
//!   (tungstenite)                 (state)      (reload)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Events flowing into the session loop
//! - `transport` - Connector/Channel seam
//! - `ws` - tungstenite transport
//! - `session` - Connection state machine and reconnect loop

pub mod messages;
pub mod session;
pub mod transport;
pub mod ws;

pub use session::{ConnectionState, Session, autostart};
pub use ws::WsConnector;
