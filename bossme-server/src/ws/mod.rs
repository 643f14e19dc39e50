//! WebSocket push transport

mod connection;
mod protocol;
mod registry;

pub use connection::ws_handler;
pub use protocol::{BroadcastMessage, CONNECTION_MESSAGE, ClientMessage, ServerMessage};
pub use registry::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, ConnectionState, DEFAULT_SEND_BUFFER,
    DEFAULT_SEND_TIMEOUT_MS, DeliveryOutcome, DropReason, Frame,
};
