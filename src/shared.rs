use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::CoordinatorConfig;
use crate::coordinator::{CoordinatorError, SessionCoordinator};
use crate::event::EventBus;
use crate::game::repository::GameRepository;
use crate::room::repository::InMemoryRoomRepository;
use crate::session::PlayerTokens;
use crate::websockets::{Broadcaster, ConnectionManager, InMemoryConnectionManager};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub coordinator: SessionCoordinator,
    pub tokens: PlayerTokens,
}

impl AppState {
    pub fn new(coordinator: SessionCoordinator, tokens: PlayerTokens) -> Self {
        Self { coordinator, tokens }
    }

    /// Wires in-memory registries, the room bus and the connection table together
    pub fn in_memory(config: CoordinatorConfig, tokens: PlayerTokens) -> Self {
        let connections: Arc<dyn ConnectionManager> = Arc::new(InMemoryConnectionManager::new());
        let broadcaster = Broadcaster::new(EventBus::new(), connections);
        let coordinator = SessionCoordinator::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(GameRepository::new()),
            broadcaster,
            config,
        );
        Self::new(coordinator, tokens)
    }

    pub fn event_bus(&self) -> &EventBus {
        self.coordinator.broadcaster().event_bus()
    }

    pub fn connections(&self) -> &Arc<dyn ConnectionManager> {
        self.coordinator.broadcaster().connections()
    }
}

/// Envelope of every HTTP reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Coordinator(e) => e.status_code(),
            AppError::JwtError(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ApiResponse::<()>::failure(self.to_string()));
        (status, body).into_response()
    }
}
