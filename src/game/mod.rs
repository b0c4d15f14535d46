// Public API
pub use handlers::{active_game, cast_vote, finish_game, game_history, list_categories, start_game};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod roles;
pub mod scoring;
mod types;
pub mod words;
