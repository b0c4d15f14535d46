use std::sync::Arc;
use tracing::{debug, error};

use super::connection_manager::ConnectionManager;
use super::messages::{RoomUpdateMessage, UpdateType, WebSocketMessage};
use crate::event::EventBus;
use crate::game::models::{Game, GameView};
use crate::room::models::Room;

/// Publishes room-wide snapshots on the room channel and private payloads
/// to single players. Delivery is best effort: failures are logged, not returned.
#[derive(Clone)]
pub struct Broadcaster {
    event_bus: EventBus,
    connections: Arc<dyn ConnectionManager>,
}

impl Broadcaster {
    pub fn new(event_bus: EventBus, connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            event_bus,
            connections,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn connections(&self) -> &Arc<dyn ConnectionManager> {
        &self.connections
    }

    fn encode(message: serde_json::Result<WebSocketMessage>) -> Option<String> {
        match message.and_then(|m| m.to_json()) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "Failed to serialize outgoing message");
                None
            }
        }
    }

    pub async fn room_update(&self, update: RoomUpdateMessage) {
        let Some(json) = Self::encode(WebSocketMessage::room_update(&update)) else {
            return;
        };
        let receivers = self.event_bus.publish_to_room(&update.room_code, json).await;
        debug!(
            room_code = %update.room_code,
            update_type = %update.update_type,
            receivers = receivers,
            "Room update broadcast"
        );
    }

    /// Plain roster snapshot of a room
    pub async fn room_snapshot(&self, update_type: UpdateType, room: &Room) {
        self.room_update(RoomUpdateMessage::from_room(update_type, room))
            .await;
    }

    /// Snapshot that also carries the public phase of the active game
    pub async fn room_snapshot_with_game(
        &self,
        update_type: UpdateType,
        room: &Room,
        game: &Game,
    ) {
        self.room_update(RoomUpdateMessage::from_room(update_type, room).with_game(game))
            .await;
    }

    /// Sends every participant their own role and, where allowed, the word
    pub async fn private_payloads(&self, game: &Game) {
        for participant in &game.participants {
            let Some(private) = game.private_message(&participant.id) else {
                continue;
            };
            if let Some(json) = Self::encode(WebSocketMessage::game_private(&private)) {
                self.connections.send_to_player(&participant.id, &json).await;
            }
        }
        debug!(
            room_code = %game.room_code,
            recipients = game.participants.len(),
            "Private game payloads sent"
        );
    }

    pub async fn active_game_to(&self, player_id: &str, view: Option<GameView>) {
        if let Some(json) = Self::encode(WebSocketMessage::active_game(view)) {
            self.connections.send_to_player(player_id, &json).await;
        }
    }

    /// Role-filtered snapshot to each participant of a game
    pub async fn active_game_to_participants(&self, game: &Game) {
        for participant in &game.participants {
            self.active_game_to(&participant.id, game.view_for(&participant.id))
                .await;
        }
    }

    /// Tells each listed player there is no active game for them any more
    pub async fn clear_active_game(&self, player_ids: &[String]) {
        if let Some(json) = Self::encode(WebSocketMessage::active_game(None)) {
            self.connections.send_to_players(player_ids, &json).await;
        }
    }

    pub async fn error_to(&self, player_id: &str, message: &str) {
        if let Some(json) = Self::encode(WebSocketMessage::error(message)) {
            self.connections.send_to_player(player_id, &json).await;
        }
    }

    pub async fn close_room(&self, room_code: &str) {
        self.event_bus.close_room(room_code).await;
    }
}
