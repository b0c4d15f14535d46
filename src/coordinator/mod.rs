// Public API
pub use commands::ClientCommand;
pub use errors::{CoordinatorError, CoordinatorResult, JoinOutcome};
pub use service::{
    RoomSettings, SessionCoordinator, MAX_ROOM_CAPACITY, MIN_PLAYERS_TO_START, MIN_ROOM_CAPACITY,
};

// Internal modules
mod commands;
mod errors;
mod service;
