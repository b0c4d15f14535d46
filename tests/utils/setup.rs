#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use insider::{
    config::CoordinatorConfig,
    coordinator::{RoomSettings, SessionCoordinator},
    event::EventBus,
    game::repository::GameRepository,
    room::repository::InMemoryRoomRepository,
    websockets::Broadcaster,
};

use super::mocks::{FixedCodeGenerator, MockConnectionManager};

pub const ROOM_CODE: &str = "ABC123";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub coordinator: SessionCoordinator,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    /// Listens on the room channel from before the room was created
    pub room_channel: broadcast::Receiver<String>,
    pub room_code: String,
    /// Player ids in join order; the first one hosts
    pub players: Vec<String>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    capacity: usize,
    password: Option<String>,
    config: CoordinatorConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            capacity: 4,
            password: None,
            config: CoordinatorConfig {
                // Long enough that nothing fires unless a test shortens it
                auto_start_delay: Duration::from_secs(60),
                game_duration_secs: 60,
                master_end_grace: Duration::ZERO,
                voting_window: Duration::from_secs(30),
                reveal_sweep_interval: Duration::from_millis(20),
            },
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["p1", "p2", "p3"])
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["p1", "p2", "p3", "p4"])
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_auto_start_delay(mut self, delay: Duration) -> Self {
        self.config.auto_start_delay = delay;
        self
    }

    pub fn with_game_duration_secs(mut self, secs: u32) -> Self {
        self.config.game_duration_secs = secs;
        self
    }

    pub fn with_voting_window(mut self, window: Duration) -> Self {
        self.config.voting_window = window;
        self
    }

    pub async fn build(self) -> TestSetup {
        let event_bus = EventBus::new();
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let broadcaster = Broadcaster::new(event_bus.clone(), mock_conn_manager.clone());

        let coordinator = SessionCoordinator::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(GameRepository::new()),
            broadcaster,
            self.config,
        )
        .with_code_generator(Arc::new(FixedCodeGenerator(ROOM_CODE)));

        let room_channel = event_bus.subscribe_to_room(ROOM_CODE).await;

        // Create room and seat players
        if let Some((host, guests)) = self.players.split_first() {
            coordinator
                .create_room(RoomSettings {
                    name: "Test room".to_string(),
                    capacity: self.capacity,
                    password: self.password.clone(),
                    host_id: host.clone(),
                    host_name: display_name(host),
                })
                .await
                .unwrap();

            for guest in guests {
                coordinator
                    .join_room(ROOM_CODE, guest, &display_name(guest), self.password.as_deref())
                    .await
                    .unwrap();
            }
        }

        TestSetup {
            coordinator,
            mock_conn_manager,
            room_channel,
            room_code: ROOM_CODE.to_string(),
            players: self.players,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn display_name(player_id: &str) -> String {
    format!("Player {}", player_id)
}

impl TestSetup {
    pub async fn ready_all(&self) {
        for player in &self.players {
            self.coordinator
                .toggle_ready(&self.room_code, player)
                .await
                .unwrap();
        }
    }

    pub async fn open_all_cards(&self) {
        let game = self
            .coordinator
            .games()
            .active_game(&self.room_code)
            .await
            .expect("no active game");
        for participant in &game.participants {
            self.coordinator
                .open_card(&self.room_code, &participant.id)
                .await
                .unwrap();
        }
    }
}
