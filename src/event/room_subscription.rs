use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bus::EventBus;

/// Forwards a room's broadcast messages into one connection's outbound queue
pub struct RoomSubscription {
    room_code: String,
    player_id: String,
    event_bus: EventBus,
}

impl RoomSubscription {
    pub fn new(room_code: String, player_id: String, event_bus: EventBus) -> Self {
        Self {
            room_code,
            player_id,
            event_bus,
        }
    }

    /// Start the subscription - spawns a background task that relays room messages
    /// until the room channel closes or the connection goes away
    pub async fn start(self, outbound: mpsc::UnboundedSender<String>) -> JoinHandle<()> {
        let mut receiver = self.event_bus.subscribe_to_room(&self.room_code).await;
        let room_code = self.room_code;
        let player_id = self.player_id;

        info!(room_code = %room_code, player_id = %player_id, "Starting room subscription");

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if outbound.send(message).is_err() {
                            debug!(
                                room_code = %room_code,
                                player_id = %player_id,
                                "Connection gone, stopping room subscription"
                            );
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            room_code = %room_code,
                            player_id = %player_id,
                            skipped = skipped,
                            "Room subscription lagged, messages skipped"
                        );
                    }
                    Err(RecvError::Closed) => {
                        debug!(room_code = %room_code, "Room channel closed");
                        break;
                    }
                }
            }
        })
    }
}
