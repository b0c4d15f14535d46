use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Lobby status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

/// A member of a room. Equality is by identifier only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Handle of the attached real-time connection, if any
    #[serde(skip_serializing)]
    pub session_id: Option<String>,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Player {
    /// Creates a non-host player who joined just now
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        // Blank display names fall back to the identifier
        let name = if name.trim().is_empty() {
            id.clone()
        } else {
            name
        };

        Self {
            id,
            name,
            session_id: None,
            is_host: false,
            is_ready: false,
            is_playing: false,
            is_active: true,
            joined_at: Utc::now(),
            last_active_at: Some(Utc::now()),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn joined_at(mut self, joined_at: DateTime<Utc>) -> Self {
        self.joined_at = joined_at;
        self
    }
}

/// A targeted mutation of one player's flags
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerUpdate {
    ToggleReady,
    Presence,
    SetActive(bool),
    AttachSession {
        session_id: String,
        name: Option<String>,
    },
    /// Only detaches when the stored handle still matches
    DetachSession { session_id: String },
}

impl PlayerUpdate {
    pub fn apply(self, player: &mut Player) {
        let now = Utc::now();
        match self {
            PlayerUpdate::ToggleReady => {
                player.is_ready = !player.is_ready;
                player.is_active = true;
            }
            PlayerUpdate::Presence => {
                player.is_active = true;
                player.last_active_at = Some(now);
            }
            PlayerUpdate::SetActive(active) => {
                player.is_active = active;
                if active {
                    player.last_active_at = Some(now);
                }
            }
            PlayerUpdate::AttachSession { session_id, name } => {
                player.session_id = Some(session_id);
                player.is_active = true;
                player.last_active_at = Some(now);
                if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                    player.name = name;
                }
            }
            PlayerUpdate::DetachSession { session_id } => {
                if player.session_id.as_deref() == Some(session_id.as_str()) {
                    player.session_id = None;
                    player.is_active = false;
                }
            }
        }
    }
}

/// In-memory room record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: String,
    pub name: String,
    pub capacity: usize,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub status: RoomStatus,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    pub players: Vec<Player>,
}

impl Room {
    /// Get the current number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Checks a supplied password; rooms without one accept anything
    pub fn password_matches(&self, supplied: Option<&str>) -> bool {
        if !self.has_password() {
            return true;
        }
        self.password.as_deref() == supplied
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.player(&self.host_id)
    }

    pub fn host_name(&self) -> String {
        self.host()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| self.host_id.clone())
    }

    /// Players that have flagged themselves ready
    pub fn ready_players(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_ready).collect()
    }

    /// True when there is at least one player and nobody is un-ready
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.is_ready)
    }

    /// Picks the successor of a departed host: the earliest player who joined
    /// strictly after the old host, wrapping to the earliest player overall.
    pub fn next_host(&self, departed_joined_at: DateTime<Utc>) -> Option<&Player> {
        self.players
            .iter()
            .filter(|p| p.joined_at > departed_joined_at)
            .min_by_key(|p| p.joined_at)
            .or_else(|| self.players.iter().min_by_key(|p| p.joined_at))
    }
}
