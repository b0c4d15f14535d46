use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::Display;
use uuid::Uuid;

/// Secret role held by a participant for one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Master,
    Insider,
    Citizen,
}

impl Role {
    /// Roles that know the secret word before it is revealed
    pub fn knows_word(&self) -> bool {
        matches!(self, Role::Master | Role::Insider)
    }
}

/// A player as snapshotted into a game at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Final result of a game, attached once at scoring time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub scores: HashMap<String, i32>,
    pub vote_tally: HashMap<String, u32>,
    /// Every target sharing the highest vote count, sorted
    pub most_voted: Vec<String>,
    pub insider_caught: bool,
    pub citizens_answered_correctly: bool,
    pub insider_id: Option<String>,
    pub master_id: Option<String>,
    pub word: String,
}

/// One played round within a room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: Uuid,
    pub room_code: String,
    pub word: String,
    pub word_revealed: bool,
    pub roles: HashMap<String, Role>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub finished: bool,
    /// Keys are exactly the keys of `roles`
    pub card_opened: HashMap<String, bool>,
    /// voter -> target
    pub votes: HashMap<String, String>,
    pub summary: Option<GameSummary>,
}

impl Game {
    pub fn new(
        room_code: impl Into<String>,
        word: impl Into<String>,
        duration_seconds: u32,
        participants: Vec<Participant>,
        roles: HashMap<String, Role>,
    ) -> Self {
        let card_opened = roles.keys().map(|id| (id.clone(), false)).collect();

        Self {
            id: Uuid::new_v4(),
            room_code: room_code.into(),
            word: word.into(),
            word_revealed: false,
            roles,
            participants,
            created_at: Utc::now(),
            started_at: None,
            ends_at: None,
            duration_seconds,
            finished: false,
            card_opened,
            votes: HashMap::new(),
            summary: None,
        }
    }

    pub fn role_of(&self, player_id: &str) -> Option<Role> {
        self.roles.get(player_id).copied()
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.roles.contains_key(player_id)
    }

    pub fn participant_ids(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }

    fn holder_of(&self, role: Role) -> Option<String> {
        self.roles
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(id, _)| id.clone())
    }

    pub fn master_id(&self) -> Option<String> {
        self.holder_of(Role::Master)
    }

    pub fn insider_id(&self) -> Option<String> {
        self.holder_of(Role::Insider)
    }

    pub fn all_cards_open(&self) -> bool {
        self.card_opened.values().all(|opened| *opened)
    }

    pub fn countdown_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// The moment the timed phase runs out, falling back to a pre-countdown estimate
    pub fn deadline(&self) -> DateTime<Utc> {
        self.ends_at.unwrap_or_else(|| {
            self.created_at + chrono::Duration::seconds(i64::from(self.duration_seconds))
        })
    }

    /// target -> number of voters currently pointing at it
    pub fn vote_tally(&self) -> HashMap<String, u32> {
        let mut tally = HashMap::new();
        for target in self.votes.values() {
            *tally.entry(target.clone()).or_insert(0) += 1;
        }
        tally
    }

    /// The word as a given player may see it right now
    pub fn word_for(&self, player_id: &str) -> String {
        let visible = self.word_revealed
            || self
                .role_of(player_id)
                .map(|role| role.knows_word())
                .unwrap_or(false);

        if visible {
            self.word.clone()
        } else {
            String::new()
        }
    }

    pub fn private_message(&self, player_id: &str) -> Option<PrivateGameMessage> {
        let role = self.role_of(player_id)?;
        Some(PrivateGameMessage {
            player_id: player_id.to_string(),
            role,
            word: self.word_for(player_id),
        })
    }

    /// Role-filtered snapshot for one player. Non-participants see nothing.
    pub fn view_for(&self, player_id: &str) -> Option<GameView> {
        let private_message = self.private_message(player_id)?;

        Some(GameView {
            id: self.id,
            room_code: self.room_code.clone(),
            word: private_message.word.clone(),
            word_revealed: self.word_revealed,
            master_id: self.master_id(),
            participants: self.participants.clone(),
            started_at: self.started_at,
            ends_at: self.ends_at,
            duration_seconds: self.duration_seconds,
            finished: self.finished,
            card_opened: self.card_opened.clone(),
            vote_tally: self.vote_tally(),
            private_message,
        })
    }
}

/// Per-player private payload: own role and the word if allowed to see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateGameMessage {
    pub player_id: String,
    pub role: Role,
    /// Empty unless the role knows the word or it has been revealed
    pub word: String,
}

/// What a participant is allowed to know about the active game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: Uuid,
    pub room_code: String,
    pub word: String,
    pub word_revealed: bool,
    /// The master is public knowledge; the insider never is
    pub master_id: Option<String>,
    pub participants: Vec<Participant>,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub finished: bool,
    pub card_opened: HashMap<String, bool>,
    pub vote_tally: HashMap<String, u32>,
    pub private_message: PrivateGameMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> Game {
        let roles = HashMap::from([
            ("m".to_string(), Role::Master),
            ("i".to_string(), Role::Insider),
            ("c".to_string(), Role::Citizen),
        ]);
        let participants = vec![
            Participant::new("m", "Mia"),
            Participant::new("i", "Ian"),
            Participant::new("c", "Cal"),
        ];
        Game::new("ABC123", "giraffe", 423, participants, roles)
    }

    #[test]
    fn test_card_opened_keys_match_roles() {
        let game = sample_game();
        assert_eq!(game.card_opened.len(), game.roles.len());
        assert!(game.roles.keys().all(|id| !game.card_opened[id]));
        assert!(!game.all_cards_open());
    }

    #[test]
    fn test_word_hidden_from_citizens_until_revealed() {
        let mut game = sample_game();
        assert_eq!(game.word_for("m"), "giraffe");
        assert_eq!(game.word_for("i"), "giraffe");
        assert_eq!(game.word_for("c"), "");
        assert_eq!(game.word_for("stranger"), "");

        game.word_revealed = true;
        assert_eq!(game.word_for("c"), "giraffe");
    }

    #[test]
    fn test_view_for_non_participant_is_none() {
        let game = sample_game();
        assert!(game.view_for("stranger").is_none());

        let view = game.view_for("c").unwrap();
        assert_eq!(view.private_message.role, Role::Citizen);
        assert_eq!(view.word, "");
        assert_eq!(view.master_id.as_deref(), Some("m"));
    }

    #[test]
    fn test_view_does_not_leak_insider() {
        let game = sample_game();
        let json = serde_json::to_string(&game.view_for("c").unwrap()).unwrap();
        assert!(!json.contains("INSIDER"));
        assert!(!json.contains("giraffe"));
    }

    #[test]
    fn test_vote_tally_counts_current_votes() {
        let mut game = sample_game();
        game.votes.insert("m".to_string(), "i".to_string());
        game.votes.insert("c".to_string(), "i".to_string());
        game.votes.insert("i".to_string(), "c".to_string());

        let tally = game.vote_tally();
        assert_eq!(tally["i"], 2);
        assert_eq!(tally["c"], 1);
        assert_eq!(tally.values().sum::<u32>(), 3);
    }
}
