use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims identifying a registered player. The player id is the subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerClaims {
    #[serde(rename = "sub")]
    pub player_id: String,
    #[serde(rename = "name")]
    pub player_name: String,
    pub iat: i64,
    pub exp: i64,
}

impl PlayerClaims {
    pub fn issued_now(player_id: &str, player_name: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            player_id: player_id.to_string(),
            player_name: player_name.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPlayerRequest {
    pub player_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

/// Identity handed back on registration and validation
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub player_id: String,
    pub player_name: String,
    pub token: String,
}
