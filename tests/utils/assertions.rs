//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use insider::websockets::messages::{RoomUpdateMessage, UpdateType};
use insider::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Room channel assertions
// ============================================================================

pub struct RoomChannelAssertion<'a> {
    channel: &'a mut broadcast::Receiver<String>,
}

impl<'a> RoomChannelAssertion<'a> {
    pub fn new(setup: &'a mut TestSetup) -> Self {
        Self {
            channel: &mut setup.room_channel,
        }
    }

    fn parse(raw: &str) -> RoomUpdateMessage {
        let message: WebSocketMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.message_type, MessageType::RoomUpdate);
        serde_json::from_value(message.payload).unwrap()
    }

    /// Next snapshot on the channel, whatever its type
    pub async fn next_update(&mut self) -> RoomUpdateMessage {
        let raw = tokio::time::timeout(WAIT_TIMEOUT, self.channel.recv())
            .await
            .expect("timed out waiting for a room update")
            .expect("room channel closed");
        Self::parse(&raw)
    }

    /// Skips snapshots until one of the wanted type arrives
    pub async fn wait_for(&mut self, update_type: UpdateType) -> RoomUpdateMessage {
        loop {
            let update = self.next_update().await;
            if update.update_type == update_type {
                return update;
            }
        }
    }

    /// Drains everything already queued, returning the update types in order
    pub fn drain(&mut self) -> Vec<UpdateType> {
        let mut seen = Vec::new();
        while let Ok(raw) = self.channel.try_recv() {
            seen.push(Self::parse(&raw).update_type);
        }
        seen
    }

    /// Asserts the room channel was dropped, skipping anything still queued
    pub async fn expect_closed(&mut self) {
        loop {
            match tokio::time::timeout(WAIT_TIMEOUT, self.channel.recv())
                .await
                .expect("timed out waiting for the room channel to close")
            {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            }
        }
    }
}

// ============================================================================
// Private message assertions
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    player: &'a str,
}

impl<'a> MessageAssertion<'a> {
    pub fn for_player(setup: &'a TestSetup, player: &'a str) -> Self {
        Self { setup, player }
    }

    async fn messages(&self) -> Vec<WebSocketMessage> {
        self.setup
            .mock_conn_manager
            .get_messages_for(self.player)
            .await
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }

    /// Count how many messages of a specific type the player received
    pub async fn count_message_type(&self, message_type: MessageType) -> usize {
        self.messages()
            .await
            .iter()
            .filter(|m| m.message_type == message_type)
            .count()
    }

    /// Payload of the most recent message of a type; fails if there is none
    pub async fn last_payload(&self, message_type: MessageType) -> serde_json::Value {
        self.messages()
            .await
            .into_iter()
            .rev()
            .find(|m| m.message_type == message_type)
            .unwrap_or_else(|| {
                panic!("{} never received a {:?} message", self.player, message_type)
            })
            .payload
    }
}
