use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const DEFAULT_ROOM_CAPACITY: usize = 100;

/// Room-wide fan-out of serialized messages: one broadcast channel per room code
#[derive(Debug, Clone)]
pub struct EventBus {
    /// room_code -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }

    /// Creates a bus whose room channels buffer up to `capacity` messages per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publishes to every subscriber of a room. Returns how many received it.
    pub async fn publish_to_room(&self, room_code: &str, message: String) -> usize {
        let room_channels = self.room_channels.read().await;

        match room_channels.get(room_code) {
            Some(sender) => match sender.send(message) {
                Ok(receiver_count) => {
                    debug!(
                        room_code = %room_code,
                        receivers = receiver_count,
                        "Room message published"
                    );
                    receiver_count
                }
                Err(_) => {
                    debug!(room_code = %room_code, "Room message published with no receivers");
                    0
                }
            },
            None => {
                debug!(room_code = %room_code, "No room channel, message dropped");
                0
            }
        }
    }

    /// Subscribe to messages for a specific room, creating its channel on first use
    pub async fn subscribe_to_room(&self, room_code: &str) -> broadcast::Receiver<String> {
        if let Some(sender) = self.room_channels.read().await.get(room_code) {
            return sender.subscribe();
        }

        let mut room_channels = self.room_channels.write().await;
        // Another subscriber may have created it between the two locks
        let sender = room_channels
            .entry(room_code.to_string())
            .or_insert_with(|| {
                debug!(room_code = %room_code, "Creating new room channel");
                broadcast::channel(self.capacity).0
            });
        sender.subscribe()
    }

    /// Drops a room's channel; subscribers see the stream end
    pub async fn close_room(&self, room_code: &str) -> bool {
        let removed = self.room_channels.write().await.remove(room_code).is_some();
        if removed {
            debug!(room_code = %room_code, "Room channel closed");
        }
        removed
    }

    pub async fn has_room(&self, room_code: &str) -> bool {
        self.room_channels.read().await.contains_key(room_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn test_publish_reaches_room_subscribers_only() {
        let bus = EventBus::new();
        let mut room_a = bus.subscribe_to_room("A").await;
        let mut room_b = bus.subscribe_to_room("B").await;

        assert_eq!(bus.publish_to_room("A", "hello".to_string()).await, 1);

        assert_eq!(room_a.recv().await.unwrap(), "hello");
        assert!(room_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_channel_is_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.publish_to_room("NONE", "lost".to_string()).await, 0);
        assert!(!bus.has_room("NONE").await);
    }

    #[tokio::test]
    async fn test_close_room_ends_subscriptions() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe_to_room("A").await;

        assert!(bus.close_room("A").await);
        assert!(matches!(receiver.recv().await, Err(RecvError::Closed)));
        assert!(!bus.close_room("A").await);
    }
}
