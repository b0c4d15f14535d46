// Public API
pub use broadcaster::Broadcaster;
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, CommandHandler};
pub use messages::{MessageType, UpdateType, WebSocketMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod broadcaster;
mod connection_manager;
mod handler;
pub mod messages;
mod socket;
