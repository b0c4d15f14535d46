use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{Game, GameSummary, Participant};
use super::roles::assign_roles;

/// Display-name prefix of non-human stand-in players
pub const BOT_NAME_PREFIX: &str = "Bot ";

/// Every game a room has played, plus a pointer to the running one
#[derive(Debug, Default)]
struct RoomGames {
    history: Vec<Game>,
    active: Option<Uuid>,
}

impl RoomGames {
    fn active_mut(&mut self) -> Option<&mut Game> {
        let id = self.active?;
        self.history.iter_mut().find(|g| g.id == id)
    }

    fn active(&self) -> Option<&Game> {
        let id = self.active?;
        self.history.iter().find(|g| g.id == id)
    }
}

/// Registry of games keyed by room code.
///
/// Lookups over unknown rooms return `None`/`false`, never an error.
pub struct GameRepository {
    games: Arc<RwLock<HashMap<String, RoomGames>>>,
    rng: Mutex<StdRng>,
}

impl Default for GameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRepository {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic role assignment, for reproducible games
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            rng: Mutex::new(rng),
        }
    }

    /// Deals roles to `participants` and registers the game as both active and
    /// historical. `None` if the room already has an active game.
    #[instrument(skip(self, word, participants), fields(participants = participants.len()))]
    pub async fn create_game(
        &self,
        room_code: &str,
        word: &str,
        duration_seconds: u32,
        participants: Vec<Participant>,
    ) -> Option<Game> {
        let mut games = self.games.write().await;
        let room_games = games.entry(room_code.to_string()).or_default();

        if room_games.active.is_some() {
            debug!("Room already has an active game");
            return None;
        }

        let ids: Vec<String> = participants.iter().map(|p| p.id.clone()).collect();
        let roles = {
            let mut rng = self.rng.lock().await;
            assign_roles(&ids, &mut *rng)
        };

        let game = Game::new(room_code, word, duration_seconds, participants, roles);
        room_games.active = Some(game.id);
        room_games.history.push(game.clone());

        info!(game_id = %game.id, "Game created");
        Some(game)
    }

    pub async fn active_game(&self, room_code: &str) -> Option<Game> {
        self.games.read().await.get(room_code)?.active().cloned()
    }

    pub async fn has_active_game(&self, room_code: &str) -> bool {
        self.active_game(room_code).await.is_some()
    }

    /// Stamps `started_at`/`ends_at` once every card is open. Calling it again
    /// returns the running game untouched instead of restarting the clock.
    #[instrument(skip(self))]
    pub async fn start_countdown(&self, room_code: &str) -> Option<Game> {
        let mut games = self.games.write().await;
        let game = games.get_mut(room_code)?.active_mut()?;

        if game.countdown_started() {
            return Some(game.clone());
        }

        if !game.all_cards_open() {
            debug!("Not every card is open yet");
            return None;
        }

        let now = Utc::now();
        game.started_at = Some(now);
        game.ends_at = Some(now + Duration::seconds(i64::from(game.duration_seconds)));

        info!(game_id = %game.id, started_at = %now, "Countdown started");
        Some(game.clone())
    }

    /// Flips one card open. When the host opens, bot participants are opened too.
    /// Returns whether the opener's own flag changed.
    #[instrument(skip(self))]
    pub async fn mark_card_opened(
        &self,
        room_code: &str,
        player_id: &str,
        opener_is_host: bool,
    ) -> bool {
        let mut games = self.games.write().await;
        let Some(game) = games.get_mut(room_code).and_then(|g| g.active_mut()) else {
            return false;
        };

        let changed = match game.card_opened.get_mut(player_id) {
            Some(opened) if !*opened => {
                *opened = true;
                true
            }
            _ => false,
        };

        if opener_is_host {
            let bots: Vec<String> = game
                .participants
                .iter()
                .filter(|p| p.name.starts_with(BOT_NAME_PREFIX))
                .map(|p| p.id.clone())
                .collect();
            for bot in bots {
                if let Some(opened) = game.card_opened.get_mut(&bot) {
                    *opened = true;
                }
            }
        }

        changed
    }

    /// Records a vote, replacing any earlier vote by the same voter.
    /// Returns the tally recomputed from the whole ledger.
    #[instrument(skip(self))]
    pub async fn record_vote(
        &self,
        room_code: &str,
        voter_id: &str,
        target_id: &str,
    ) -> Option<HashMap<String, u32>> {
        let mut games = self.games.write().await;
        let game = games.get_mut(room_code)?.active_mut()?;

        if let Some(previous) = game
            .votes
            .insert(voter_id.to_string(), target_id.to_string())
        {
            debug!(previous = %previous, "Vote replaced");
        }

        Some(game.vote_tally())
    }

    /// Pulls `ends_at` forward to `new_ends_at` if that is earlier
    pub async fn shorten_countdown(
        &self,
        room_code: &str,
        new_ends_at: DateTime<Utc>,
    ) -> Option<Game> {
        let mut games = self.games.write().await;
        let game = games.get_mut(room_code)?.active_mut()?;

        let ends_at = match game.ends_at {
            Some(current) if current <= new_ends_at => current,
            _ => new_ends_at,
        };
        game.ends_at = Some(ends_at);
        Some(game.clone())
    }

    /// Reveals the word of the given game if it is still the active one
    pub async fn reveal_word(&self, room_code: &str, game_id: Uuid) -> Option<Game> {
        let mut games = self.games.write().await;
        let game = games.get_mut(room_code)?.active_mut()?;

        if game.id != game_id || game.word_revealed {
            return None;
        }
        game.word_revealed = true;
        Some(game.clone())
    }

    /// Detaches the active game, keeping it in history as finished and revealed
    #[instrument(skip(self))]
    pub async fn finish_and_archive(&self, room_code: &str) -> Option<Game> {
        let mut games = self.games.write().await;
        let room_games = games.get_mut(room_code)?;
        let game = room_games.active_mut()?;

        game.finished = true;
        game.word_revealed = true;
        let archived = game.clone();
        room_games.active = None;

        info!(game_id = %archived.id, "Game archived");
        Some(archived)
    }

    /// Attaches a summary to a game that does not have one yet
    pub async fn attach_summary(
        &self,
        room_code: &str,
        game_id: Uuid,
        summary: GameSummary,
    ) -> bool {
        let mut games = self.games.write().await;
        let Some(game) = games
            .get_mut(room_code)
            .and_then(|room_games| room_games.history.iter_mut().find(|g| g.id == game_id))
        else {
            return false;
        };

        if game.summary.is_some() {
            return false;
        }
        game.summary = Some(summary);
        true
    }

    /// All games of a room, oldest first
    pub async fn games_for_room(&self, room_code: &str) -> Vec<Game> {
        self.games
            .read()
            .await
            .get(room_code)
            .map(|g| g.history.clone())
            .unwrap_or_default()
    }

    pub async fn used_words(&self, room_code: &str) -> HashSet<String> {
        self.games
            .read()
            .await
            .get(room_code)
            .map(|g| g.history.iter().map(|game| game.word.clone()).collect())
            .unwrap_or_default()
    }

    /// Drops a room's history; returns the ids of the purged games
    #[instrument(skip(self))]
    pub async fn clear_games_for_room(&self, room_code: &str) -> Vec<Uuid> {
        let removed = self.games.write().await.remove(room_code);
        let ids: Vec<Uuid> = removed
            .map(|g| g.history.iter().map(|game| game.id).collect())
            .unwrap_or_default();

        if !ids.is_empty() {
            info!(purged = ids.len(), "Game history purged");
        }
        ids
    }

    /// Active games whose timer ran out before `now` and whose word is still hidden
    pub async fn expired_unrevealed(&self, now: DateTime<Utc>) -> Vec<(String, Uuid)> {
        self.games
            .read()
            .await
            .iter()
            .filter_map(|(code, room_games)| {
                let game = room_games.active()?;
                let expired = game.ends_at.is_some_and(|ends_at| now > ends_at);
                (expired && !game.word_revealed).then(|| (code.clone(), game.id))
            })
            .collect()
    }
}
