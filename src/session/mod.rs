// Public API - what other modules can use
pub use handlers::{register_player, validate_player};
pub use token::PlayerTokens;
pub use types::PlayerClaims;

// Internal modules
mod handlers;
mod token;
mod types;
