//! Reload Module
//!
//! Decides what a change batch does to the live document.
//!
//! # Architecture
//!
//! ```text
//! Session --raw text--> Dispatcher --changes--> ChangeApplier --> Document
//!                        (decode)                (patch/reload)
//! ```
//!
//! # Modules
//!
//! - `message` - Wire protocol (envelope, change descriptors, hello)
//! - `dispatch` - First-message guard and routing by message type
//! - `apply` - Per-descriptor decision engine

pub mod apply;
pub mod dispatch;
pub mod message;

pub use apply::{ApplyReport, ChangeApplier, ReloadCause};
pub use dispatch::{Dispatch, Dispatcher};
pub use message::{Action, ChangeDescriptor, ChangeKind, ClientMessage, ProtocolError};
