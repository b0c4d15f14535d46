use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Per-player private channels, keyed by player id.
///
/// A player holds at most one live connection; a reconnect replaces the old one.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(
        &self,
        player_id: String,
        connection_id: String,
        sender: mpsc::UnboundedSender<String>,
    );

    /// Removes the player's connection only if it is still `connection_id`
    async fn remove_connection(&self, player_id: &str, connection_id: &str);

    async fn send_to_player(&self, player_id: &str, message: &str);

    async fn send_to_players(&self, player_ids: &[String], message: &str);
}

struct PlayerConnection {
    connection_id: String,
    sender: mpsc::UnboundedSender<String>,
}

pub struct InMemoryConnectionManager {
    // player_id -> connection
    connections: Arc<RwLock<HashMap<String, PlayerConnection>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn is_connected(&self, player_id: &str) -> bool {
        self.connections.read().await.contains_key(player_id)
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(
        &self,
        player_id: String,
        connection_id: String,
        sender: mpsc::UnboundedSender<String>,
    ) {
        let mut connections = self.connections.write().await;
        if connections.contains_key(&player_id) {
            debug!(player_id = %player_id, "Replacing existing connection");
        }
        connections.insert(
            player_id,
            PlayerConnection {
                connection_id,
                sender,
            },
        );
    }

    async fn remove_connection(&self, player_id: &str, connection_id: &str) {
        let mut connections = self.connections.write().await;
        if connections
            .get(player_id)
            .is_some_and(|c| c.connection_id == connection_id)
        {
            connections.remove(player_id);
        }
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(player_id) {
            let _ = connection.sender.send(message.to_string());
        }
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        let connections = self.connections.read().await;
        for player_id in player_ids {
            if let Some(connection) = connections.get(player_id) {
                let _ = connection.sender.send(message.to_string());
            }
        }
    }
}
