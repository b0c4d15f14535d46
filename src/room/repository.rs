use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::{Player, PlayerUpdate, Room, RoomStatus};

/// Everything needed to open a new room
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub code: String,
    pub name: String,
    pub capacity: usize,
    pub password: Option<String>,
    pub host_id: String,
    pub host_name: String,
}

/// Result of removing a player from a room
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    /// Player removed, returns the updated room (host may have changed)
    Removed(Room),
    /// Player was the last one; the room no longer exists
    RoomDeleted,
    PlayerNotInRoom,
    RoomNotFound,
}

impl LeaveRoomResult {
    pub fn room_was_deleted(&self) -> bool {
        matches!(self, LeaveRoomResult::RoomDeleted)
    }
}

/// Registry of rooms keyed by room code.
///
/// Every operation is total over missing keys: lookups return `None`,
/// mutations return `false`/`None` instead of failing.
#[async_trait]
pub trait RoomRepository {
    /// Registers a room with its host as the only player. `None` if the code is taken.
    async fn create_room(&self, new_room: NewRoom) -> Option<Room>;
    async fn get_room(&self, code: &str) -> Option<Room>;
    async fn room_exists(&self, code: &str) -> bool;
    /// Rooms that are not full, newest first, regardless of status
    async fn list_available(&self) -> Vec<Room>;

    /// False if the room is missing, full, or already holds this player
    async fn add_player(&self, code: &str, player: Player) -> bool;
    /// Removes a player, migrating the host or deleting the emptied room
    async fn remove_player(&self, code: &str, player_id: &str) -> LeaveRoomResult;
    async fn update_player(
        &self,
        code: &str,
        player_id: &str,
        update: PlayerUpdate,
    ) -> Option<Player>;

    async fn set_status(&self, code: &str, status: RoomStatus) -> bool;
    /// Flags the given players as playing and clears their ready flags
    async fn start_playing(&self, code: &str, player_ids: &[String]) -> Option<Room>;
    /// Clears every player's playing and ready flags
    async fn reset_after_game(&self, code: &str) -> Option<Room>;
    async fn delete_room(&self, code: &str) -> Option<Room>;
}

/// In-memory implementation of RoomRepository
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<String, Room>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, new_room), fields(room_code = %new_room.code))]
    async fn create_room(&self, new_room: NewRoom) -> Option<Room> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&new_room.code) {
            warn!("Room code already in use");
            return None;
        }

        let mut host = Player::new(new_room.host_id.clone(), new_room.host_name);
        host.is_host = true;

        let room = Room {
            code: new_room.code.clone(),
            name: new_room.name,
            capacity: new_room.capacity,
            password: new_room.password.filter(|p| !p.is_empty()),
            status: RoomStatus::Waiting,
            host_id: new_room.host_id,
            created_at: Utc::now(),
            players: vec![host],
        };
        rooms.insert(new_room.code, room.clone());

        debug!(host_id = %room.host_id, capacity = room.capacity, "Room created in memory");
        Some(room)
    }

    async fn get_room(&self, code: &str) -> Option<Room> {
        self.rooms.read().await.get(code).cloned()
    }

    async fn room_exists(&self, code: &str) -> bool {
        self.rooms.read().await.contains_key(code)
    }

    async fn list_available(&self) -> Vec<Room> {
        let mut available: Vec<Room> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|room| !room.is_full())
            .cloned()
            .collect();
        available.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        available
    }

    #[instrument(skip(self, player), fields(player_id = %player.id))]
    async fn add_player(&self, code: &str, player: Player) -> bool {
        let mut rooms = self.rooms.write().await;

        let Some(room) = rooms.get_mut(code) else {
            debug!("Room not found");
            return false;
        };

        if room.is_full() {
            debug!(current_count = room.player_count(), "Room is full");
            return false;
        }

        if room.has_player(&player.id) {
            debug!("Player already in room");
            return false;
        }

        let mut player = player;
        // A room that somehow lost its host hands the role to the newcomer
        player.is_host = room.host().is_none();
        if player.is_host {
            room.host_id = player.id.clone();
        }
        room.players.push(player);

        debug!(player_count = room.player_count(), "Player added to room");
        true
    }

    #[instrument(skip(self))]
    async fn remove_player(&self, code: &str, player_id: &str) -> LeaveRoomResult {
        let mut rooms = self.rooms.write().await;

        let Some(room) = rooms.get_mut(code) else {
            return LeaveRoomResult::RoomNotFound;
        };

        let Some(index) = room.players.iter().position(|p| p.id == player_id) else {
            return LeaveRoomResult::PlayerNotInRoom;
        };

        let removed = room.players.remove(index);

        if room.players.is_empty() {
            rooms.remove(code);
            info!("Last player left, room deleted");
            return LeaveRoomResult::RoomDeleted;
        }

        if removed.is_host || room.host_id == removed.id {
            if let Some(next_id) = room.next_host(removed.joined_at).map(|p| p.id.clone()) {
                for player in room.players.iter_mut() {
                    player.is_host = player.id == next_id;
                }
                info!(old_host = %removed.id, new_host = %next_id, "Host migrated");
                room.host_id = next_id;
            }
        }

        LeaveRoomResult::Removed(room.clone())
    }

    async fn update_player(
        &self,
        code: &str,
        player_id: &str,
        update: PlayerUpdate,
    ) -> Option<Player> {
        let mut rooms = self.rooms.write().await;
        let player = rooms
            .get_mut(code)?
            .players
            .iter_mut()
            .find(|p| p.id == player_id)?;

        update.apply(player);
        Some(player.clone())
    }

    async fn set_status(&self, code: &str, status: RoomStatus) -> bool {
        match self.rooms.write().await.get_mut(code) {
            Some(room) => {
                debug!(room_code = %code, status = %status, "Room status changed");
                room.status = status;
                true
            }
            None => false,
        }
    }

    async fn start_playing(&self, code: &str, player_ids: &[String]) -> Option<Room> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(code)?;

        for player in room.players.iter_mut() {
            if player_ids.contains(&player.id) {
                player.is_playing = true;
                player.is_ready = false;
            }
        }
        Some(room.clone())
    }

    async fn reset_after_game(&self, code: &str) -> Option<Room> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(code)?;

        for player in room.players.iter_mut() {
            player.is_playing = false;
            player.is_ready = false;
        }
        Some(room.clone())
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, code: &str) -> Option<Room> {
        let removed = self.rooms.write().await.remove(code);
        if removed.is_some() {
            info!("Room deleted");
        }
        removed
    }
}
