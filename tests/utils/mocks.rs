#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use insider::room::code_generator::RoomCodeGenerator;
use insider::websockets::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every private message instead of delivering it
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, Vec<String>>>>,
    connected_players: Arc<RwLock<HashMap<String, String>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_connected(&self, player_id: &str) -> bool {
        self.connected_players.read().await.contains_key(player_id)
    }

    pub async fn get_messages_for(&self, player_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(player_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Pops the oldest message sent to a player
    pub async fn consume_message_for(&self, player_id: &str) -> Option<String> {
        let mut sent = self.sent_messages.write().await;
        let queue = sent.get_mut(player_id)?;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(
        &self,
        player_id: String,
        connection_id: String,
        _sender: mpsc::UnboundedSender<String>,
    ) {
        self.connected_players
            .write()
            .await
            .insert(player_id, connection_id);
    }

    async fn remove_connection(&self, player_id: &str, connection_id: &str) {
        let mut connected = self.connected_players.write().await;
        if connected.get(player_id).map(String::as_str) == Some(connection_id) {
            connected.remove(player_id);
        }
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .push(message.to_string());
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        for player_id in player_ids {
            self.send_to_player(player_id, message).await;
        }
    }
}

/// Hands out the same room code every time
pub struct FixedCodeGenerator(pub &'static str);

impl RoomCodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}
