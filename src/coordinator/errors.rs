use axum::http::StatusCode;
use thiserror::Error;

use crate::room::models::Room;

/// Why a coordinator command was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full")]
    RoomFull,

    #[error("Room is not accepting players")]
    RoomNotAcceptingPlayers,

    #[error("Wrong room password")]
    WrongPassword,

    #[error("A game is already active in this room")]
    GameAlreadyActive,

    #[error("Not enough ready players: need {required}, have {ready}")]
    NotEnoughPlayers { required: usize, ready: usize },

    #[error("No words available")]
    NoWordsAvailable,

    #[error("No active game")]
    NoActiveGame,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// Status class reported to synchronous callers
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::RoomNotFound(_) | CoordinatorError::NoActiveGame => {
                StatusCode::NOT_FOUND
            }
            CoordinatorError::RoomFull
            | CoordinatorError::RoomNotAcceptingPlayers
            | CoordinatorError::GameAlreadyActive
            | CoordinatorError::InvalidTransition(_) => StatusCode::CONFLICT,
            CoordinatorError::NotEnoughPlayers { .. }
            | CoordinatorError::NoWordsAvailable
            | CoordinatorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::WrongPassword => StatusCode::UNAUTHORIZED,
            CoordinatorError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            CoordinatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Successful join. Joining twice is not an error.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Joined(Room),
    AlreadyPresent(Room),
}

impl JoinOutcome {
    pub fn room(&self) -> &Room {
        match self {
            JoinOutcome::Joined(room) | JoinOutcome::AlreadyPresent(room) => room,
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
