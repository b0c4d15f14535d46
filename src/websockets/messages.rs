use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::game::models::{Game, GameSummary, GameView, PrivateGameMessage};
use crate::room::models::{Player, Room, RoomStatus};

/// Server -> client message types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Room-wide snapshot, sent on the room channel
    RoomUpdate,
    /// Own role and word, sent to one player
    GamePrivate,
    /// Role-filtered active game, sent to one player
    ActiveGame,
    Error,
}

/// What caused a room snapshot to be sent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Join,
    Leave,
    Ready,
    Update,
    GameStarted,
    GameFinished,
    CardOpened,
    VoteStarted,
    WordRevealed,
    Reset,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Envelope of every server -> client message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// Public timing of the active game, safe for everyone in the room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePhase {
    pub game_id: uuid::Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub word_revealed: bool,
    /// Only filled once the word is public
    pub word: Option<String>,
}

impl From<&Game> for GamePhase {
    fn from(game: &Game) -> Self {
        Self {
            game_id: game.id,
            started_at: game.started_at,
            ends_at: game.ends_at,
            duration_seconds: game.duration_seconds,
            word_revealed: game.word_revealed,
            word: game.word_revealed.then(|| game.word.clone()),
        }
    }
}

/// Room-wide state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdateMessage {
    pub update_type: UpdateType,
    pub room_code: String,
    pub room_name: String,
    pub max_players: usize,
    pub current_players: usize,
    pub status: RoomStatus,
    pub host_id: String,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GamePhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<GameSummary>,
}

impl RoomUpdateMessage {
    pub fn from_room(update_type: UpdateType, room: &Room) -> Self {
        Self {
            update_type,
            room_code: room.code.clone(),
            room_name: room.name.clone(),
            max_players: room.capacity,
            current_players: room.player_count(),
            status: room.status,
            host_id: room.host_id.clone(),
            players: room.players.clone(),
            game: None,
            summary: None,
        }
    }

    pub fn with_game(mut self, game: &Game) -> Self {
        self.game = Some(GamePhase::from(game));
        self
    }

    pub fn with_summary(mut self, summary: GameSummary) -> Self {
        self.summary = Some(summary);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveGamePayload {
    pub game: Option<GameView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new<T: Serialize>(message_type: MessageType, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            message_type,
            payload: serde_json::to_value(payload)?,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        })
    }

    /// Create a ROOM_UPDATE message
    pub fn room_update(update: &RoomUpdateMessage) -> serde_json::Result<Self> {
        Self::new(MessageType::RoomUpdate, update)
    }

    /// Create a GAME_PRIVATE message
    pub fn game_private(private: &PrivateGameMessage) -> serde_json::Result<Self> {
        Self::new(MessageType::GamePrivate, private)
    }

    /// Create an ACTIVE_GAME message; `None` tells the client there is no game for it
    pub fn active_game(view: Option<GameView>) -> serde_json::Result<Self> {
        Self::new(MessageType::ActiveGame, &ActiveGamePayload { game: view })
    }

    /// Create an ERROR message
    pub fn error(message: impl Into<String>) -> serde_json::Result<Self> {
        Self::new(
            MessageType::Error,
            &ErrorPayload {
                message: message.into(),
            },
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
