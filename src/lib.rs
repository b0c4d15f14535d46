// Library crate for the Insider game server
// This file exposes the public API for integration tests

pub mod config;
pub mod coordinator;
pub mod event;
pub mod game;
pub mod room;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod websockets;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, CoordinatorConfig};
pub use coordinator::{ClientCommand, CoordinatorError, RoomSettings, SessionCoordinator};
pub use event::{EventBus, RoomSubscription};
pub use shared::{AppError, AppState};
pub use websockets::{Broadcaster, ConnectionManager, MessageType, WebSocketMessage};

/// All HTTP and WebSocket routes of the server
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/player/register", post(session::register_player))
        .route("/api/player/validate", post(session::validate_player))
        .route("/api/room/create", post(room::create_room))
        .route("/api/room/join", post(room::join_room))
        .route("/api/room/leave", post(room::leave_room))
        .route("/api/room/available", get(room::available_rooms))
        .route(
            "/api/room/:code",
            get(room::get_room).delete(room::delete_room),
        )
        .route("/api/room/:code/players", get(room::room_players))
        .route("/api/game/:code/active", get(game::active_game))
        .route("/api/game/:code/history", get(game::game_history))
        .route("/api/game/:code/start", post(game::start_game))
        .route("/api/game/:code/finish", post(game::finish_game))
        .route("/api/game/:code/vote", post(game::cast_vote))
        .route("/api/category/all", get(game::list_categories))
        .route("/ws/:code", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
