//! Process-wide state shared by the binary and the session loop.

mod state;

pub use state::{is_shutdown, register_session, setup_shutdown_handler};
