//! WebSocket module for real-time interview sessions

mod connection;
mod protocol;
mod registry;

pub use connection::ws_handler;
pub use protocol::{ClientMessage, ServerMessage, interview_event_to_server_message};
pub use registry::ConnectionRegistry;
