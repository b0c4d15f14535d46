use serde::Deserialize;

/// Client -> server command on a room's real-time channel.
///
/// Wire shape: `{"type": "OPEN_CARD", "payload": {"playerId": "..."}}`.
/// Player ids may be omitted, in which case the connection's own id is used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    Join {
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
    },
    Leave {
        #[serde(default)]
        player_id: Option<String>,
    },
    Ready {
        #[serde(default)]
        player_id: Option<String>,
    },
    Presence {
        #[serde(default)]
        player_id: Option<String>,
    },
    Status {
        #[serde(default)]
        player_id: Option<String>,
        active: bool,
    },
    Start {
        #[serde(default)]
        triggered_by: Option<String>,
    },
    OpenCard {
        #[serde(default)]
        player_id: Option<String>,
    },
    Vote {
        #[serde(default)]
        voter_id: Option<String>,
        target_id: String,
    },
    ActiveGame {
        #[serde(default)]
        player_id: Option<String>,
    },
    MasterEnd {
        #[serde(default)]
        player_id: Option<String>,
    },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Join { .. } => "join",
            ClientCommand::Leave { .. } => "leave",
            ClientCommand::Ready { .. } => "ready",
            ClientCommand::Presence { .. } => "presence",
            ClientCommand::Status { .. } => "status",
            ClientCommand::Start { .. } => "start",
            ClientCommand::OpenCard { .. } => "open_card",
            ClientCommand::Vote { .. } => "vote",
            ClientCommand::ActiveGame { .. } => "active_game",
            ClientCommand::MasterEnd { .. } => "master_end",
        }
    }
}

/// Falls back to the sender's id when the payload names no player
pub(crate) fn acting_player(explicit: Option<String>, sender_id: &str) -> String {
    explicit
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| sender_id.to_string())
}
