use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::commands::{acting_player, ClientCommand};
use super::errors::{CoordinatorError, CoordinatorResult, JoinOutcome};
use crate::config::CoordinatorConfig;
use crate::game::models::{Game, GameView, Participant, Role};
use crate::game::repository::GameRepository;
use crate::game::scoring::compute_summary;
use crate::game::words::{pick_fresh_word, StaticWordList, WordSource};
use crate::room::code_generator::{RandomRoomCodeGenerator, RoomCodeGenerator};
use crate::room::models::{Player, PlayerUpdate, Room, RoomStatus};
use crate::room::repository::{LeaveRoomResult, NewRoom, RoomRepository};
use crate::scheduler::{TaskPurpose, TaskScheduler};
use crate::websockets::Broadcaster;
use crate::websockets::messages::{RoomUpdateMessage, UpdateType};

pub const MIN_ROOM_CAPACITY: usize = 2;
pub const MAX_ROOM_CAPACITY: usize = 12;
pub const MIN_PLAYERS_TO_START: usize = 2;

const MAX_CODE_ATTEMPTS: usize = 64;

/// Caller-supplied settings of a new room
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub name: String,
    pub capacity: usize,
    pub password: Option<String>,
    pub host_id: String,
    pub host_name: String,
}

/// Single entry point for every state change of rooms and games.
///
/// Each mutating operation runs under that room's lock, so the room and its
/// active game only ever see one command at a time. Timer callbacks go
/// through the same locked paths and re-check state before acting.
#[derive(Clone)]
pub struct SessionCoordinator {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    games: Arc<GameRepository>,
    scheduler: TaskScheduler,
    broadcaster: Broadcaster,
    words: Arc<dyn WordSource>,
    code_generator: Arc<dyn RoomCodeGenerator>,
    room_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    config: CoordinatorConfig,
}

impl SessionCoordinator {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        games: Arc<GameRepository>,
        broadcaster: Broadcaster,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            rooms,
            games,
            scheduler: TaskScheduler::new(),
            broadcaster,
            words: Arc::new(StaticWordList::built_in()),
            code_generator: Arc::new(RandomRoomCodeGenerator::new()),
            room_locks: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn with_word_source(mut self, words: Arc<dyn WordSource>) -> Self {
        self.words = words;
        self
    }

    pub fn with_code_generator(mut self, code_generator: Arc<dyn RoomCodeGenerator>) -> Self {
        self.code_generator = code_generator;
        self
    }

    pub fn rooms(&self) -> &Arc<dyn RoomRepository + Send + Sync> {
        &self.rooms
    }

    pub fn games(&self) -> &Arc<GameRepository> {
        &self.games
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn word_source(&self) -> &Arc<dyn WordSource> {
        &self.words
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Waits for exclusive access to a room. Unknown rooms get no lock entry.
    async fn lock_room(&self, room_code: &str) -> CoordinatorResult<OwnedMutexGuard<()>> {
        loop {
            let lock = {
                let mut locks = self.room_locks.lock().await;
                match locks.get(room_code) {
                    Some(lock) => lock.clone(),
                    None => {
                        if !self.rooms.room_exists(room_code).await {
                            return Err(CoordinatorError::RoomNotFound(room_code.to_string()));
                        }
                        let lock = Arc::new(Mutex::new(()));
                        locks.insert(room_code.to_string(), lock.clone());
                        lock
                    }
                }
            };
            let guard = lock.clone().lock_owned().await;

            // The room may have been purged, and its code reused, while we waited
            let current = self.room_locks.lock().await.get(room_code).cloned();
            if current.is_some_and(|current| Arc::ptr_eq(&current, &lock)) {
                return Ok(guard);
            }
        }
    }

    async fn require_room(&self, room_code: &str) -> CoordinatorResult<Room> {
        self.rooms
            .get_room(room_code)
            .await
            .ok_or_else(|| CoordinatorError::RoomNotFound(room_code.to_string()))
    }

    async fn require_active_game(&self, room_code: &str) -> CoordinatorResult<Game> {
        self.games
            .active_game(room_code)
            .await
            .ok_or(CoordinatorError::NoActiveGame)
    }

    fn require_id(value: &str, field: &str) -> CoordinatorResult<()> {
        if value.trim().is_empty() {
            return Err(CoordinatorError::InvalidRequest(format!(
                "{} is required",
                field
            )));
        }
        Ok(())
    }

    /// Room snapshot, carrying the public game phase when a game is running
    async fn publish(&self, update_type: UpdateType, room: &Room) {
        match self.games.active_game(&room.code).await {
            Some(game) => {
                self.broadcaster
                    .room_snapshot_with_game(update_type, room, &game)
                    .await
            }
            None => self.broadcaster.room_snapshot(update_type, room).await,
        }
    }

    // ---- rooms ----

    #[instrument(skip(self, settings), fields(host_id = %settings.host_id))]
    pub async fn create_room(&self, settings: RoomSettings) -> CoordinatorResult<Room> {
        if !(MIN_ROOM_CAPACITY..=MAX_ROOM_CAPACITY).contains(&settings.capacity) {
            return Err(CoordinatorError::InvalidRequest(format!(
                "Max players must be between {} and {}",
                MIN_ROOM_CAPACITY, MAX_ROOM_CAPACITY
            )));
        }
        Self::require_id(&settings.host_id, "hostId")?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.code_generator.generate();
            if self.rooms.room_exists(&code).await {
                debug!(room_code = %code, "Generated room code already taken");
                continue;
            }

            let new_room = NewRoom {
                code,
                name: settings.name.clone(),
                capacity: settings.capacity,
                password: settings.password.clone(),
                host_id: settings.host_id.clone(),
                host_name: settings.host_name.clone(),
            };
            if let Some(room) = self.rooms.create_room(new_room).await {
                info!(
                    room_code = %room.code,
                    capacity = room.capacity,
                    has_password = room.has_password(),
                    "Room created"
                );
                self.broadcaster
                    .room_snapshot(UpdateType::Update, &room)
                    .await;
                return Ok(room);
            }
        }

        error!("Could not allocate an unused room code");
        Err(CoordinatorError::Internal(
            "could not allocate a room code".to_string(),
        ))
    }

    pub async fn room(&self, room_code: &str) -> CoordinatorResult<Room> {
        self.require_room(room_code).await
    }

    pub async fn available_rooms(&self) -> Vec<Room> {
        self.rooms.list_available().await
    }

    /// Join through the synchronous API: capacity, status and password are enforced
    #[instrument(skip(self, player_name, password))]
    pub async fn join_room(
        &self,
        room_code: &str,
        player_id: &str,
        player_name: &str,
        password: Option<&str>,
    ) -> CoordinatorResult<JoinOutcome> {
        Self::require_id(player_id, "playerId")?;
        let _guard = self.lock_room(room_code).await?;
        let room = self.require_room(room_code).await?;

        if room.has_player(player_id) {
            debug!("Player already in room");
            self.publish(UpdateType::Update, &room).await;
            return Ok(JoinOutcome::AlreadyPresent(room));
        }
        if room.is_full() {
            return Err(CoordinatorError::RoomFull);
        }
        if room.status != RoomStatus::Waiting {
            return Err(CoordinatorError::RoomNotAcceptingPlayers);
        }
        if !room.password_matches(password) {
            return Err(CoordinatorError::WrongPassword);
        }

        if !self
            .rooms
            .add_player(room_code, Player::new(player_id, player_name))
            .await
        {
            return Err(CoordinatorError::RoomFull);
        }

        let room = self.require_room(room_code).await?;
        info!(players = room.player_count(), "Player joined room");
        self.publish(UpdateType::Join, &room).await;
        Ok(JoinOutcome::Joined(room))
    }

    /// Join over the real-time channel. A player already in the room only
    /// re-attaches its session; passwords are not checked here.
    #[instrument(skip(self, player_name))]
    pub async fn join_via_channel(
        &self,
        room_code: &str,
        player_id: &str,
        player_name: Option<String>,
        session_id: &str,
    ) -> CoordinatorResult<JoinOutcome> {
        Self::require_id(player_id, "playerId")?;
        let _guard = self.lock_room(room_code).await?;
        let room = self.require_room(room_code).await?;

        if room.has_player(player_id) {
            self.rooms
                .update_player(
                    room_code,
                    player_id,
                    PlayerUpdate::AttachSession {
                        session_id: session_id.to_string(),
                        name: player_name,
                    },
                )
                .await;
            let room = self.require_room(room_code).await?;
            self.publish(UpdateType::Update, &room).await;
            return Ok(JoinOutcome::AlreadyPresent(room));
        }
        if room.is_full() {
            return Err(CoordinatorError::RoomFull);
        }

        let player =
            Player::new(player_id, player_name.unwrap_or_default()).with_session(session_id);
        if !self.rooms.add_player(room_code, player).await {
            return Err(CoordinatorError::RoomFull);
        }

        let room = self.require_room(room_code).await?;
        info!(players = room.player_count(), "Player joined room");
        self.publish(UpdateType::Join, &room).await;
        Ok(JoinOutcome::Joined(room))
    }

    /// Removes a player. `Ok(None)` means the room emptied and was deleted.
    #[instrument(skip(self))]
    pub async fn leave_room(
        &self,
        room_code: &str,
        player_id: &str,
    ) -> CoordinatorResult<Option<Room>> {
        let _guard = self.lock_room(room_code).await?;

        match self.rooms.remove_player(room_code, player_id).await {
            LeaveRoomResult::Removed(room) => {
                info!(new_host = %room.host_id, players = room.player_count(), "Player left room");
                self.publish(UpdateType::Leave, &room).await;
                self.refresh_auto_start(&room);
                Ok(Some(room))
            }
            LeaveRoomResult::PlayerNotInRoom => {
                debug!("Leave for a player not in the room");
                self.require_room(room_code).await.map(Some)
            }
            LeaveRoomResult::RoomDeleted => {
                info!("Last player left, room deleted");
                self.purge_room(room_code).await;
                Ok(None)
            }
            LeaveRoomResult::RoomNotFound => {
                Err(CoordinatorError::RoomNotFound(room_code.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_room(&self, room_code: &str, requester_id: &str) -> CoordinatorResult<()> {
        let _guard = self.lock_room(room_code).await?;
        let room = self.require_room(room_code).await?;

        if room.host_id != requester_id {
            return Err(CoordinatorError::NotAuthorized(
                "only the host can delete the room".to_string(),
            ));
        }

        self.rooms.delete_room(room_code).await;
        self.purge_room(room_code).await;
        info!("Room deleted by host");
        Ok(())
    }

    /// Drops everything a deleted room left behind
    async fn purge_room(&self, room_code: &str) {
        let purged = self.games.clear_games_for_room(room_code).await;
        self.scheduler.clear_room(room_code);
        self.scheduler.forget_revealed(&purged);
        self.broadcaster.close_room(room_code).await;
        self.room_locks.lock().await.remove(room_code);
        debug!(room_code = %room_code, purged_games = purged.len(), "Room state purged");
    }

    // ---- players ----

    async fn update_member(
        &self,
        room_code: &str,
        player_id: &str,
        update: PlayerUpdate,
    ) -> CoordinatorResult<Room> {
        let room = self.require_room(room_code).await?;
        if !room.has_player(player_id) {
            return Err(CoordinatorError::InvalidRequest(format!(
                "player {} is not in room {}",
                player_id, room_code
            )));
        }
        self.rooms.update_player(room_code, player_id, update).await;
        self.require_room(room_code).await
    }

    #[instrument(skip(self))]
    pub async fn toggle_ready(&self, room_code: &str, player_id: &str) -> CoordinatorResult<Room> {
        let _guard = self.lock_room(room_code).await?;
        let room = self
            .update_member(room_code, player_id, PlayerUpdate::ToggleReady)
            .await?;

        debug!(ready = room.ready_players().len(), players = room.player_count(), "Ready toggled");
        self.publish(UpdateType::Ready, &room).await;
        self.refresh_auto_start(&room);
        Ok(room)
    }

    pub async fn presence(&self, room_code: &str, player_id: &str) -> CoordinatorResult<Room> {
        let _guard = self.lock_room(room_code).await?;
        let room = self
            .update_member(room_code, player_id, PlayerUpdate::Presence)
            .await?;
        self.publish(UpdateType::Update, &room).await;
        Ok(room)
    }

    pub async fn set_active(
        &self,
        room_code: &str,
        player_id: &str,
        active: bool,
    ) -> CoordinatorResult<Room> {
        let _guard = self.lock_room(room_code).await?;
        let room = self
            .update_member(room_code, player_id, PlayerUpdate::SetActive(active))
            .await?;
        self.publish(UpdateType::Update, &room).await;
        Ok(room)
    }

    /// Binds a live connection to a player already in the room
    pub async fn attach_session(
        &self,
        room_code: &str,
        player_id: &str,
        session_id: &str,
    ) -> CoordinatorResult<Room> {
        let _guard = self.lock_room(room_code).await?;
        let room = self
            .update_member(
                room_code,
                player_id,
                PlayerUpdate::AttachSession {
                    session_id: session_id.to_string(),
                    name: None,
                },
            )
            .await?;
        self.publish(UpdateType::Update, &room).await;
        Ok(room)
    }

    /// Marks a player inactive after its connection dropped. The player stays in the room.
    pub async fn detach_session(
        &self,
        room_code: &str,
        player_id: &str,
        session_id: &str,
    ) -> CoordinatorResult<Room> {
        let _guard = self.lock_room(room_code).await?;
        let room = self
            .update_member(
                room_code,
                player_id,
                PlayerUpdate::DetachSession {
                    session_id: session_id.to_string(),
                },
            )
            .await?;
        self.publish(UpdateType::Update, &room).await;
        Ok(room)
    }

    /// Schedules the auto-start when every player (at least two) is ready in a
    /// waiting room, and cancels it otherwise. A pending start keeps its timer.
    fn refresh_auto_start(&self, room: &Room) {
        let eligible = room.status == RoomStatus::Waiting
            && room.player_count() >= MIN_PLAYERS_TO_START
            && room.all_ready();

        if !eligible {
            if self.scheduler.cancel(&room.code, TaskPurpose::AutoStart) {
                info!(room_code = %room.code, "Auto-start cancelled");
            }
            return;
        }
        if self.scheduler.is_pending(&room.code, TaskPurpose::AutoStart) {
            return;
        }

        let coordinator = self.clone();
        let room_code = room.code.clone();
        self.scheduler.schedule(
            &room.code,
            TaskPurpose::AutoStart,
            self.config.auto_start_delay,
            async move {
                coordinator.run_auto_start(&room_code).await;
            },
        );
        info!(
            room_code = %room.code,
            delay_ms = self.config.auto_start_delay.as_millis() as u64,
            "Auto-start scheduled"
        );
    }

    // ---- games ----

    /// Starts a game with the room's ready players. `triggered_by`, when
    /// given, must be a member of the room.
    #[instrument(skip(self))]
    pub async fn start_game(
        &self,
        room_code: &str,
        triggered_by: Option<&str>,
    ) -> CoordinatorResult<Game> {
        let _guard = self.lock_room(room_code).await?;
        self.start_game_locked(room_code, triggered_by).await
    }

    async fn start_game_locked(
        &self,
        room_code: &str,
        triggered_by: Option<&str>,
    ) -> CoordinatorResult<Game> {
        let room = self.require_room(room_code).await?;

        if let Some(trigger) = triggered_by {
            if !room.has_player(trigger) {
                return Err(CoordinatorError::NotAuthorized(format!(
                    "{} is not in room {}",
                    trigger, room_code
                )));
            }
        }
        if self.games.has_active_game(room_code).await {
            return Err(CoordinatorError::GameAlreadyActive);
        }

        let participants: Vec<Participant> = room
            .ready_players()
            .into_iter()
            .map(|p| Participant::new(p.id.clone(), p.name.clone()))
            .collect();
        if participants.len() < MIN_PLAYERS_TO_START {
            return Err(CoordinatorError::NotEnoughPlayers {
                required: MIN_PLAYERS_TO_START,
                ready: participants.len(),
            });
        }

        let used = self.games.used_words(room_code).await;
        let word =
            pick_fresh_word(self.words.as_ref(), &used).ok_or(CoordinatorError::NoWordsAvailable)?;

        let game = self
            .games
            .create_game(room_code, &word, self.config.game_duration_secs, participants)
            .await
            .ok_or(CoordinatorError::GameAlreadyActive)?;

        self.rooms.set_status(room_code, RoomStatus::Playing).await;
        let room = self
            .rooms
            .start_playing(room_code, &game.participant_ids())
            .await
            .ok_or_else(|| CoordinatorError::RoomNotFound(room_code.to_string()))?;
        self.scheduler.cancel(room_code, TaskPurpose::AutoStart);

        info!(
            room_code = %room_code,
            game_id = %game.id,
            participants = game.participants.len(),
            "Game started"
        );

        self.broadcaster
            .room_snapshot_with_game(UpdateType::GameStarted, &room, &game)
            .await;
        self.broadcaster.private_payloads(&game).await;
        self.schedule_auto_finish(&game);

        Ok(game)
    }

    /// Arms the finish timer at the game's deadline plus the voting window,
    /// replacing any earlier finish timer of the room
    fn schedule_auto_finish(&self, game: &Game) {
        let voting_window = chrono::Duration::from_std(self.config.voting_window)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let fire_at = game.deadline() + voting_window;
        let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        let coordinator = self.clone();
        let room_code = game.room_code.clone();
        let game_id = game.id;
        self.scheduler.schedule(
            &game.room_code,
            TaskPurpose::AutoFinish,
            delay,
            async move {
                coordinator.run_auto_finish(&room_code, game_id).await;
            },
        );
        debug!(room_code = %game.room_code, game_id = %game.id, fire_at = %fire_at, "Auto-finish armed");
    }

    #[instrument(skip(self))]
    pub async fn open_card(&self, room_code: &str, player_id: &str) -> CoordinatorResult<Game> {
        let _guard = self.lock_room(room_code).await?;
        let room = self.require_room(room_code).await?;
        let game = self.require_active_game(room_code).await?;

        if !game.is_participant(player_id) {
            return Err(CoordinatorError::NotAuthorized(format!(
                "{} is not playing this game",
                player_id
            )));
        }
        if game.card_opened.get(player_id).copied().unwrap_or(false) {
            return Err(CoordinatorError::InvalidTransition(
                "card already opened".to_string(),
            ));
        }

        let opener_is_host = room.host_id == player_id;
        self.games
            .mark_card_opened(room_code, player_id, opener_is_host)
            .await;
        let game = self.require_active_game(room_code).await?;
        self.broadcaster
            .room_snapshot_with_game(UpdateType::CardOpened, &room, &game)
            .await;

        if !game.all_cards_open() || game.countdown_started() {
            return Ok(game);
        }

        let game = self
            .games
            .start_countdown(room_code)
            .await
            .ok_or(CoordinatorError::NoActiveGame)?;
        info!(game_id = %game.id, "All cards open, countdown running");
        self.broadcaster
            .room_snapshot_with_game(UpdateType::GameStarted, &room, &game)
            .await;
        self.schedule_auto_finish(&game);
        Ok(game)
    }

    /// Records a vote; both voter and target must be participants
    #[instrument(skip(self))]
    pub async fn cast_vote(
        &self,
        room_code: &str,
        voter_id: &str,
        target_id: &str,
    ) -> CoordinatorResult<HashMap<String, u32>> {
        let _guard = self.lock_room(room_code).await?;
        let game = self.require_active_game(room_code).await?;

        if !game.is_participant(voter_id) {
            return Err(CoordinatorError::NotAuthorized(format!(
                "{} is not playing this game",
                voter_id
            )));
        }
        if !game.is_participant(target_id) {
            return Err(CoordinatorError::InvalidRequest(format!(
                "{} is not playing this game",
                target_id
            )));
        }

        let tally = self
            .games
            .record_vote(room_code, voter_id, target_id)
            .await
            .ok_or(CoordinatorError::NoActiveGame)?;
        debug!(votes = tally.values().sum::<u32>(), "Vote recorded");
        Ok(tally)
    }

    /// Lets the MASTER cut the countdown short: the deadline moves to a short
    /// grace period from now and voting opens
    #[instrument(skip(self))]
    pub async fn master_end(&self, room_code: &str, player_id: &str) -> CoordinatorResult<Game> {
        let _guard = self.lock_room(room_code).await?;
        let room = self.require_room(room_code).await?;
        let game = self.require_active_game(room_code).await?;

        if game.role_of(player_id) != Some(Role::Master) {
            return Err(CoordinatorError::NotAuthorized(
                "only the master can end the round early".to_string(),
            ));
        }
        if !game.countdown_started() {
            return Err(CoordinatorError::InvalidTransition(
                "countdown has not started".to_string(),
            ));
        }
        if game.word_revealed {
            return Err(CoordinatorError::InvalidTransition(
                "word already revealed".to_string(),
            ));
        }

        let grace = chrono::Duration::from_std(self.config.master_end_grace)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let game = self
            .games
            .shorten_countdown(room_code, Utc::now() + grace)
            .await
            .ok_or(CoordinatorError::NoActiveGame)?;

        info!(game_id = %game.id, ends_at = ?game.ends_at, "Master ended the round early");
        self.broadcaster
            .room_snapshot_with_game(UpdateType::VoteStarted, &room, &game)
            .await;
        self.schedule_auto_finish(&game);
        self.broadcaster.active_game_to_participants(&game).await;
        Ok(game)
    }

    /// Archives the active game, scores it and puts the room back to WAITING
    #[instrument(skip(self))]
    pub async fn finish_game(
        &self,
        room_code: &str,
        citizens_answered_correctly: bool,
    ) -> CoordinatorResult<Game> {
        let _guard = self.lock_room(room_code).await?;
        self.finish_game_locked(room_code, None, citizens_answered_correctly)
            .await
    }

    async fn finish_game_locked(
        &self,
        room_code: &str,
        expected_game: Option<Uuid>,
        citizens_answered_correctly: bool,
    ) -> CoordinatorResult<Game> {
        let active = self.require_active_game(room_code).await?;
        if expected_game.is_some_and(|id| id != active.id) {
            return Err(CoordinatorError::NoActiveGame);
        }

        let mut game = self
            .games
            .finish_and_archive(room_code)
            .await
            .ok_or(CoordinatorError::NoActiveGame)?;
        let summary = compute_summary(&game, citizens_answered_correctly);
        self.games
            .attach_summary(room_code, game.id, summary.clone())
            .await;
        game.summary = Some(summary.clone());

        self.scheduler.cancel(room_code, TaskPurpose::AutoFinish);
        self.scheduler.forget_revealed(&[game.id]);

        self.rooms.set_status(room_code, RoomStatus::Waiting).await;
        let Some(room) = self.rooms.reset_after_game(room_code).await else {
            warn!(room_code = %room_code, "Room vanished while finishing game");
            return Ok(game);
        };

        info!(
            room_code = %room_code,
            game_id = %game.id,
            insider_caught = summary.insider_caught,
            "Game finished"
        );

        self.broadcaster
            .room_update(
                RoomUpdateMessage::from_room(UpdateType::GameFinished, &room)
                    .with_game(&game)
                    .with_summary(summary),
            )
            .await;
        self.broadcaster
            .room_snapshot(UpdateType::Reset, &room)
            .await;
        let player_ids: Vec<String> = room.players.iter().map(|p| p.id.clone()).collect();
        self.broadcaster.clear_active_game(&player_ids).await;

        Ok(game)
    }

    /// Role-filtered view of the active game; `None` for non-participants
    pub async fn active_game_view(
        &self,
        room_code: &str,
        player_id: &str,
    ) -> CoordinatorResult<Option<GameView>> {
        self.require_room(room_code).await?;
        Ok(self
            .games
            .active_game(room_code)
            .await
            .and_then(|game| game.view_for(player_id)))
    }

    /// Pushes the requesting player its own snapshot of the active game
    pub async fn send_active_game(&self, room_code: &str, player_id: &str) -> CoordinatorResult<()> {
        let view = self.active_game_view(room_code, player_id).await?;
        self.broadcaster.active_game_to(player_id, view).await;
        Ok(())
    }

    pub async fn game_history(&self, room_code: &str) -> CoordinatorResult<Vec<Game>> {
        let games = self.games.games_for_room(room_code).await;
        if games.is_empty() && !self.rooms.room_exists(room_code).await {
            return Err(CoordinatorError::RoomNotFound(room_code.to_string()));
        }
        Ok(games)
    }

    // ---- timers ----

    /// Fired by the auto-start timer; re-checks readiness before starting
    pub async fn run_auto_start(&self, room_code: &str) {
        let Ok(_guard) = self.lock_room(room_code).await else {
            debug!(room_code = %room_code, "Auto-start for a deleted room");
            return;
        };
        let Some(room) = self.rooms.get_room(room_code).await else {
            return;
        };

        if room.status != RoomStatus::Waiting
            || room.player_count() < MIN_PLAYERS_TO_START
            || !room.all_ready()
        {
            debug!(room_code = %room_code, "Room no longer eligible for auto-start");
            return;
        }

        match self.start_game_locked(room_code, None).await {
            Ok(game) => info!(room_code = %room_code, game_id = %game.id, "Auto-start began game"),
            Err(e) => {
                warn!(room_code = %room_code, error = %e, "Auto-start failed");
                self.publish(UpdateType::Update, &room).await;
            }
        }
    }

    /// Fired by the auto-finish timer; a no-op unless `game_id` is still active
    pub async fn run_auto_finish(&self, room_code: &str, game_id: Uuid) {
        let Ok(_guard) = self.lock_room(room_code).await else {
            debug!(room_code = %room_code, "Auto-finish for a deleted room");
            return;
        };

        match self.finish_game_locked(room_code, Some(game_id), false).await {
            Ok(_) => info!(room_code = %room_code, game_id = %game_id, "Auto-finish archived game"),
            Err(CoordinatorError::NoActiveGame) => {
                debug!(room_code = %room_code, game_id = %game_id, "Game already finished")
            }
            Err(e) => error!(room_code = %room_code, game_id = %game_id, error = %e, "Auto-finish failed"),
        }
    }

    /// Reveals the word of every active game whose timer ran out. Each game is
    /// revealed at most once, however often this runs. Returns the number revealed.
    pub async fn reveal_expired_words(&self) -> usize {
        let expired = self.games.expired_unrevealed(Utc::now()).await;
        let mut revealed = 0;

        for (room_code, game_id) in expired {
            if !self.scheduler.mark_revealed(game_id) {
                continue;
            }
            let Ok(_guard) = self.lock_room(&room_code).await else {
                continue;
            };
            let Some(game) = self.games.reveal_word(&room_code, game_id).await else {
                continue;
            };

            if let Some(room) = self.rooms.get_room(&room_code).await {
                self.broadcaster
                    .room_snapshot_with_game(UpdateType::WordRevealed, &room, &game)
                    .await;
            }
            self.broadcaster.private_payloads(&game).await;
            info!(room_code = %room_code, game_id = %game_id, "Word revealed");
            revealed += 1;
        }

        revealed
    }

    // ---- real-time commands ----

    /// Applies a command received on a room channel. Rejections are logged and
    /// answered with a fresh room snapshot so clients can reconcile.
    pub async fn handle_command(
        &self,
        room_code: &str,
        sender_id: &str,
        session_id: &str,
        command: ClientCommand,
    ) {
        let name = command.name();
        if let Err(e) = self
            .apply_command(room_code, sender_id, session_id, command)
            .await
        {
            warn!(
                room_code = %room_code,
                player_id = %sender_id,
                command = name,
                error = %e,
                "Command rejected"
            );
            if let Some(room) = self.rooms.get_room(room_code).await {
                self.publish(UpdateType::Update, &room).await;
            }
        }
    }

    async fn apply_command(
        &self,
        room_code: &str,
        sender_id: &str,
        session_id: &str,
        command: ClientCommand,
    ) -> CoordinatorResult<()> {
        match command {
            ClientCommand::Join {
                player_id,
                player_name,
            } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.join_via_channel(room_code, &player_id, player_name, session_id)
                    .await
                    .map(|_| ())
            }
            ClientCommand::Leave { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.leave_room(room_code, &player_id).await.map(|_| ())
            }
            ClientCommand::Ready { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.toggle_ready(room_code, &player_id).await.map(|_| ())
            }
            ClientCommand::Presence { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.presence(room_code, &player_id).await.map(|_| ())
            }
            ClientCommand::Status { player_id, active } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.set_active(room_code, &player_id, active)
                    .await
                    .map(|_| ())
            }
            ClientCommand::Start { triggered_by } => {
                let trigger = Self::actor(triggered_by, sender_id)?;
                self.start_game(room_code, Some(&trigger)).await.map(|_| ())
            }
            ClientCommand::OpenCard { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.open_card(room_code, &player_id).await.map(|_| ())
            }
            ClientCommand::Vote {
                voter_id,
                target_id,
            } => {
                let voter_id = Self::actor(voter_id, sender_id)?;
                self.cast_vote(room_code, &voter_id, &target_id)
                    .await
                    .map(|_| ())
            }
            ClientCommand::ActiveGame { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.send_active_game(room_code, &player_id).await
            }
            ClientCommand::MasterEnd { player_id } => {
                let player_id = Self::actor(player_id, sender_id)?;
                self.master_end(room_code, &player_id).await.map(|_| ())
            }
        }
    }

    /// A connection may only act as the player it authenticated as
    fn actor(explicit: Option<String>, sender_id: &str) -> CoordinatorResult<String> {
        let player_id = acting_player(explicit, sender_id);
        if player_id != sender_id {
            return Err(CoordinatorError::NotAuthorized(format!(
                "connection of {} cannot act for {}",
                sender_id, player_id
            )));
        }
        Ok(player_id)
    }
}
