use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::Display;
use uuid::Uuid;

use super::models::{Game, GameSummary, Participant, Role};
use crate::websockets::messages::GamePhase;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGameQuery {
    pub player_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    #[serde(default)]
    pub triggered_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishGameRequest {
    #[serde(default)]
    pub citizens_answered_correctly: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: String,
    pub target_id: String,
}

/// What everyone may know about a game that just started
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartedResponse {
    #[serde(flatten)]
    pub phase: GamePhase,
    pub room_code: String,
    pub master_id: Option<String>,
    pub participants: Vec<Participant>,
}

impl From<&Game> for GameStartedResponse {
    fn from(game: &Game) -> Self {
        Self {
            phase: GamePhase::from(game),
            room_code: game.room_code.clone(),
            master_id: game.master_id(),
            participants: game.participants.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameOutcome {
    InsiderFound,
    InsiderHidden,
    NoInsider,
}

impl From<&GameSummary> for GameOutcome {
    fn from(summary: &GameSummary) -> Self {
        if summary.insider_id.is_none() {
            GameOutcome::NoInsider
        } else if summary.insider_caught {
            GameOutcome::InsiderFound
        } else {
            GameOutcome::InsiderHidden
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub insider_id: Option<String>,
    /// First of the tied leaders, in id order
    pub most_voted_id: Option<String>,
    pub most_voted_count: u32,
    pub vote_tally: HashMap<String, u32>,
}

impl From<&GameSummary> for VoteResult {
    fn from(summary: &GameSummary) -> Self {
        let most_voted_id = summary.most_voted.first().cloned();
        let most_voted_count = most_voted_id
            .as_ref()
            .and_then(|id| summary.vote_tally.get(id))
            .copied()
            .unwrap_or(0);

        Self {
            insider_id: summary.insider_id.clone(),
            most_voted_id,
            most_voted_count,
            vote_tally: summary.vote_tally.clone(),
        }
    }
}

/// One game of a room's history.
///
/// Roles, votes and results only appear once the game is finished, and the
/// word only once it has been revealed.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHistoryEntry {
    pub game_id: Uuid,
    pub room_code: String,
    pub word: Option<String>,
    pub players: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub finished: bool,
    pub card_opened: HashMap<String, bool>,
    pub roles: HashMap<String, Role>,
    pub votes: HashMap<String, String>,
    pub scores: HashMap<String, i32>,
    pub vote_result: Option<VoteResult>,
    pub outcome: Option<GameOutcome>,
}

impl From<&Game> for GameHistoryEntry {
    fn from(game: &Game) -> Self {
        let (roles, votes) = if game.finished {
            (game.roles.clone(), game.votes.clone())
        } else {
            (HashMap::new(), HashMap::new())
        };
        let summary = game.summary.as_ref();

        Self {
            game_id: game.id,
            room_code: game.room_code.clone(),
            word: game.word_revealed.then(|| game.word.clone()),
            players: game.participants.clone(),
            created_at: game.created_at,
            started_at: game.started_at,
            ends_at: game.ends_at,
            finished: game.finished,
            card_opened: game.card_opened.clone(),
            roles,
            votes,
            scores: summary.map(|s| s.scores.clone()).unwrap_or_default(),
            vote_result: summary.map(VoteResult::from),
            outcome: summary.map(GameOutcome::from),
        }
    }
}
