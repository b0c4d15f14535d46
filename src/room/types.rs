use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Player, Room, RoomStatus};

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub max_players: usize,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(alias = "hostUuid")]
    pub host_id: String,
    #[serde(default)]
    pub host_name: String,
}

/// Request payload for joining a room
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_code: String,
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub room_code: String,
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoomQuery {
    pub host_id: String,
}

/// Public room information; the password itself is never exposed
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_code: String,
    pub room_name: String,
    pub max_players: usize,
    pub current_players: usize,
    pub has_password: bool,
    pub status: RoomStatus,
    pub host_id: String,
    pub host_name: String,
    pub created_at: DateTime<Utc>,
    pub players: Vec<Player>,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            room_code: room.code.clone(),
            room_name: room.name.clone(),
            max_players: room.capacity,
            current_players: room.player_count(),
            has_password: room.has_password(),
            status: room.status,
            host_id: room.host_id.clone(),
            host_name: room.host_name(),
            created_at: room.created_at,
            players: room.players.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_host_uuid_alias() {
        let request: CreateRoomRequest = serde_json::from_str(
            r#"{"roomName":"Fun","maxPlayers":6,"hostUuid":"h-1"}"#,
        )
        .unwrap();

        assert_eq!(request.host_id, "h-1");
        assert_eq!(request.host_name, "");
        assert!(request.password.is_none());
    }

    #[test]
    fn test_room_response_hides_password() {
        let room = Room {
            code: "ABC123".to_string(),
            name: "Fun".to_string(),
            capacity: 4,
            password: Some("secret".to_string()),
            status: RoomStatus::Waiting,
            host_id: "h".to_string(),
            created_at: Utc::now(),
            players: vec![Player::new("h", "Host")],
        };

        let json = serde_json::to_value(RoomResponse::from(&room)).unwrap();
        assert_eq!(json["hasPassword"], true);
        assert_eq!(json["hostName"], "Host");
        assert_eq!(json["currentPlayers"], 1);
        assert_eq!(json["status"], "WAITING");
        assert!(!json.to_string().contains("secret"));
    }
}
