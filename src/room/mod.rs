// Public API - what other modules can use
pub use handlers::{
    available_rooms, create_room, delete_room, get_room, join_room, leave_room, room_players,
};

// Internal modules
pub mod code_generator;
mod handlers;
pub mod models;
pub mod repository;
mod types;
