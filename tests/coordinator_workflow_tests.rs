mod utils;

use chrono::Utc;
use std::time::Duration;

use insider::coordinator::{ClientCommand, CoordinatorError, JoinOutcome};
use insider::game::models::Role;
use insider::room::models::RoomStatus;
use insider::scheduler::start_reveal_sweep;
use insider::websockets::messages::UpdateType;
use insider::websockets::MessageType;
use utils::{MessageAssertion, RoomChannelAssertion, TestSetupBuilder, ROOM_CODE};

fn command(json: serde_json::Value) -> ClientCommand {
    serde_json::from_value(json).unwrap()
}

#[tokio::test]
async fn test_everyone_ready_starts_game_automatically() {
    let mut setup = TestSetupBuilder::new()
        .with_three_players()
        .with_capacity(4)
        .with_auto_start_delay(Duration::from_millis(50))
        .build()
        .await;

    setup.ready_all().await;

    let update = RoomChannelAssertion::new(&mut setup)
        .wait_for(UpdateType::GameStarted)
        .await;
    assert_eq!(update.status, RoomStatus::Playing);
    assert!(update.players.iter().all(|p| p.is_playing && !p.is_ready));
    let phase = update.game.expect("game phase missing");
    assert!(phase.started_at.is_none());
    assert!(phase.word.is_none());

    let game = setup
        .coordinator
        .games()
        .active_game(ROOM_CODE)
        .await
        .unwrap();
    assert_eq!(game.participants.len(), 3);
    let masters = game.roles.values().filter(|r| **r == Role::Master).count();
    let insiders = game.roles.values().filter(|r| **r == Role::Insider).count();
    assert_eq!((masters, insiders), (1, 1));

    for player in &setup.players {
        let private = MessageAssertion::for_player(&setup, player)
            .last_payload(MessageType::GamePrivate)
            .await;
        let role = game.role_of(player).unwrap();
        let expected_word = if role == Role::Citizen { "" } else { game.word.as_str() };
        assert_eq!(private["word"], expected_word, "wrong word for {}", role);
        assert_eq!(private["role"], role.to_string());
    }
}

#[tokio::test]
async fn test_unready_cancels_pending_auto_start() {
    let setup = TestSetupBuilder::new()
        .with_three_players()
        .with_auto_start_delay(Duration::from_millis(100))
        .build()
        .await;

    setup.ready_all().await;
    setup
        .coordinator
        .toggle_ready(ROOM_CODE, "p3")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!setup.coordinator.games().has_active_game(ROOM_CODE).await);
    let room = setup.coordinator.room(ROOM_CODE).await.unwrap();
    assert_eq!(room.status, RoomStatus::Waiting);
}

#[tokio::test]
async fn test_countdown_reveal_and_auto_finish() {
    let mut setup = TestSetupBuilder::new()
        .with_three_players()
        .with_game_duration_secs(1)
        .with_voting_window(Duration::from_millis(300))
        .build()
        .await;
    let sweep = tokio::spawn(start_reveal_sweep(
        setup.coordinator.clone(),
        Duration::from_millis(20),
    ));

    setup.ready_all().await;
    setup
        .coordinator
        .start_game(ROOM_CODE, Some("p1"))
        .await
        .unwrap();
    setup.open_all_cards().await;

    let game = setup
        .coordinator
        .games()
        .active_game(ROOM_CODE)
        .await
        .unwrap();
    let started_at = game.started_at.expect("countdown not started");
    assert_eq!(game.ends_at, Some(started_at + chrono::Duration::seconds(1)));

    let mut channel = RoomChannelAssertion::new(&mut setup);
    let revealed = channel.wait_for(UpdateType::WordRevealed).await;
    assert_eq!(revealed.game.unwrap().word.as_deref(), Some(game.word.as_str()));

    let finished = channel.wait_for(UpdateType::GameFinished).await;
    let summary = finished.summary.expect("summary missing");
    assert!(!summary.citizens_answered_correctly);
    assert_eq!(summary.word, game.word);

    let reset = channel.next_update().await;
    assert_eq!(reset.update_type, UpdateType::Reset);
    assert_eq!(reset.status, RoomStatus::Waiting);
    assert!(reset.players.iter().all(|p| !p.is_playing && !p.is_ready));
    sweep.abort();

    assert!(!setup.coordinator.games().has_active_game(ROOM_CODE).await);
    let history = setup.coordinator.game_history(ROOM_CODE).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].finished && history[0].word_revealed);
    assert!(history[0].summary.is_some());

    for player in &setup.players {
        let messages = MessageAssertion::for_player(&setup, player);
        let private = messages.last_payload(MessageType::GamePrivate).await;
        assert_eq!(private["word"], game.word.as_str());
        let active = messages.last_payload(MessageType::ActiveGame).await;
        assert!(active["game"].is_null());
    }
}

#[tokio::test]
async fn test_scoring_when_insider_is_caught() {
    let mut setup = TestSetupBuilder::new().with_four_players().build().await;
    setup.ready_all().await;
    let game = setup
        .coordinator
        .start_game(ROOM_CODE, None)
        .await
        .unwrap();

    let insider = game.insider_id().unwrap();
    let master = game.master_id().unwrap();
    for player in &setup.players {
        let target = if *player == insider { &master } else { &insider };
        setup
            .coordinator
            .cast_vote(ROOM_CODE, player, target)
            .await
            .unwrap();
    }

    let finished = setup
        .coordinator
        .finish_game(ROOM_CODE, true)
        .await
        .unwrap();
    let summary = finished.summary.unwrap();

    assert!(summary.insider_caught);
    assert_eq!(summary.most_voted, vec![insider.clone()]);
    assert_eq!(summary.vote_tally[&insider], 3);
    for (player, role) in &game.roles {
        let expected = match role {
            Role::Citizen => 2,
            Role::Insider => 1,
            Role::Master => 2,
        };
        assert_eq!(summary.scores[player], expected, "score of {}", role);
    }

    let update = RoomChannelAssertion::new(&mut setup)
        .wait_for(UpdateType::GameFinished)
        .await;
    assert_eq!(update.summary, Some(summary));
}

#[tokio::test]
async fn test_host_migrates_in_join_order_until_room_is_purged() {
    let mut setup = TestSetupBuilder::new().with_three_players().build().await;

    let room = setup
        .coordinator
        .leave_room(ROOM_CODE, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.host_id, "p2");
    assert!(room.player("p2").unwrap().is_host);

    let update = RoomChannelAssertion::new(&mut setup)
        .wait_for(UpdateType::Leave)
        .await;
    assert_eq!(update.host_id, "p2");

    let room = setup
        .coordinator
        .leave_room(ROOM_CODE, "p2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(room.host_id, "p3");

    let gone = setup.coordinator.leave_room(ROOM_CODE, "p3").await.unwrap();
    assert!(gone.is_none());
    assert!(matches!(
        setup.coordinator.room(ROOM_CODE).await,
        Err(CoordinatorError::RoomNotFound(_))
    ));
    assert!(matches!(
        setup.coordinator.game_history(ROOM_CODE).await,
        Err(CoordinatorError::RoomNotFound(_))
    ));
    RoomChannelAssertion::new(&mut setup).expect_closed().await;
}

#[tokio::test]
async fn test_join_rules() {
    let full = TestSetupBuilder::new()
        .with_players(vec!["p1", "p2"])
        .with_capacity(2)
        .build()
        .await;
    assert_eq!(
        full.coordinator
            .join_room(ROOM_CODE, "p3", "Cara", None)
            .await
            .unwrap_err(),
        CoordinatorError::RoomFull
    );

    let setup = TestSetupBuilder::new()
        .with_three_players()
        .with_password("hunter2")
        .build()
        .await;
    assert_eq!(
        setup
            .coordinator
            .join_room(ROOM_CODE, "p4", "Dan", Some("wrong"))
            .await
            .unwrap_err(),
        CoordinatorError::WrongPassword
    );
    assert!(matches!(
        setup
            .coordinator
            .join_room(ROOM_CODE, "p2", "Bob", None)
            .await
            .unwrap(),
        JoinOutcome::AlreadyPresent(_)
    ));

    setup.ready_all().await;
    setup
        .coordinator
        .start_game(ROOM_CODE, None)
        .await
        .unwrap();
    assert_eq!(
        setup
            .coordinator
            .join_room(ROOM_CODE, "p4", "Dan", Some("hunter2"))
            .await
            .unwrap_err(),
        CoordinatorError::RoomNotAcceptingPlayers
    );
}

#[tokio::test]
async fn test_master_ends_round_early() {
    let mut setup = TestSetupBuilder::new().with_three_players().build().await;
    setup.ready_all().await;
    let game = setup
        .coordinator
        .start_game(ROOM_CODE, None)
        .await
        .unwrap();
    let master = game.master_id().unwrap();
    let not_master = game
        .participants
        .iter()
        .map(|p| p.id.clone())
        .find(|id| *id != master)
        .unwrap();

    // Too early: the countdown only runs once every card is open
    assert!(matches!(
        setup.coordinator.master_end(ROOM_CODE, &master).await,
        Err(CoordinatorError::InvalidTransition(_))
    ));

    setup.open_all_cards().await;
    assert!(matches!(
        setup.coordinator.master_end(ROOM_CODE, &not_master).await,
        Err(CoordinatorError::NotAuthorized(_))
    ));

    let ended = setup
        .coordinator
        .master_end(ROOM_CODE, &master)
        .await
        .unwrap();
    assert!(ended.ends_at.unwrap() <= Utc::now());

    let update = RoomChannelAssertion::new(&mut setup)
        .wait_for(UpdateType::VoteStarted)
        .await;
    assert_eq!(update.game.unwrap().ends_at, ended.ends_at);

    for participant in &game.participants {
        let active = MessageAssertion::for_player(&setup, &participant.id)
            .last_payload(MessageType::ActiveGame)
            .await;
        assert_eq!(active["game"]["privateMessage"]["playerId"], participant.id.as_str());
    }
}

#[tokio::test]
async fn test_room_channel_never_leaks_secrets() {
    let mut setup = TestSetupBuilder::new().with_four_players().build().await;
    setup.ready_all().await;
    let game = setup
        .coordinator
        .start_game(ROOM_CODE, None)
        .await
        .unwrap();
    setup.open_all_cards().await;

    let mut broadcast = Vec::new();
    while let Ok(raw) = setup.room_channel.try_recv() {
        broadcast.push(raw);
    }
    assert!(!broadcast.is_empty());
    for raw in &broadcast {
        assert!(!raw.contains(&game.word), "word leaked: {}", raw);
        assert!(!raw.contains("INSIDER"), "role leaked: {}", raw);
    }

    let citizen = game
        .roles
        .iter()
        .find(|(_, role)| **role == Role::Citizen)
        .map(|(id, _)| id.clone())
        .unwrap();
    let view = setup
        .coordinator
        .active_game_view(ROOM_CODE, &citizen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.word, "");
    assert_eq!(view.private_message.role, Role::Citizen);
}

#[tokio::test]
async fn test_channel_commands_act_only_for_sender() {
    let mut setup = TestSetupBuilder::new()
        .with_players(vec!["p1", "p2"])
        .build()
        .await;

    setup
        .coordinator
        .handle_command(
            ROOM_CODE,
            "p3",
            "conn-3",
            command(serde_json::json!({"type": "JOIN", "payload": {"playerName": "Cara"}})),
        )
        .await;
    let room = setup.coordinator.room(ROOM_CODE).await.unwrap();
    assert_eq!(room.player("p3").unwrap().name, "Cara");
    assert_eq!(room.player("p3").unwrap().session_id.as_deref(), Some("conn-3"));

    RoomChannelAssertion::new(&mut setup).drain();

    // p3 tries to flag p1 as ready
    setup
        .coordinator
        .handle_command(
            ROOM_CODE,
            "p3",
            "conn-3",
            command(serde_json::json!({"type": "READY", "payload": {"playerId": "p1"}})),
        )
        .await;

    let room = setup.coordinator.room(ROOM_CODE).await.unwrap();
    assert!(!room.player("p1").unwrap().is_ready);
    assert_eq!(
        MessageAssertion::for_player(&setup, "p3")
            .count_message_type(MessageType::Error)
            .await,
        0
    );
    assert_eq!(
        RoomChannelAssertion::new(&mut setup).drain(),
        vec![UpdateType::Update]
    );

    setup
        .coordinator
        .handle_command(
            ROOM_CODE,
            "p3",
            "conn-3",
            command(serde_json::json!({"type": "READY", "payload": {}})),
        )
        .await;
    let room = setup.coordinator.room(ROOM_CODE).await.unwrap();
    assert!(room.player("p3").unwrap().is_ready);
}

#[tokio::test]
async fn test_disconnect_keeps_player_in_room() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["p1", "p2"])
        .build()
        .await;

    setup
        .coordinator
        .attach_session(ROOM_CODE, "p2", "conn-2")
        .await
        .unwrap();
    let room = setup
        .coordinator
        .detach_session(ROOM_CODE, "p2", "conn-2")
        .await
        .unwrap();

    let player = room.player("p2").unwrap();
    assert!(!player.is_active);
    assert!(player.session_id.is_none());
    assert_eq!(room.player_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_starts_and_card_opens_apply_once() {
    let setup = TestSetupBuilder::new().with_four_players().build().await;
    setup.ready_all().await;

    let starts: Vec<_> = (0..16)
        .map(|i| {
            let coordinator = setup.coordinator.clone();
            let trigger = setup.players[i % setup.players.len()].clone();
            tokio::spawn(async move { coordinator.start_game(ROOM_CODE, Some(&trigger)).await })
        })
        .collect();
    let mut started = 0;
    for handle in starts {
        match handle.await.unwrap() {
            Ok(_) => started += 1,
            Err(e) => assert!(matches!(e, CoordinatorError::GameAlreadyActive), "{:?}", e),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(setup.coordinator.games().games_for_room(ROOM_CODE).await.len(), 1);

    let opens: Vec<_> = setup
        .players
        .iter()
        .flat_map(|player| std::iter::repeat(player.clone()).take(3))
        .map(|player| {
            let coordinator = setup.coordinator.clone();
            tokio::spawn(async move {
                let opened = coordinator.open_card(ROOM_CODE, &player).await.is_ok();
                (player, opened)
            })
        })
        .collect();
    let mut opened_by: std::collections::HashMap<String, usize> = Default::default();
    for handle in opens {
        let (player, opened) = handle.await.unwrap();
        if opened {
            *opened_by.entry(player).or_default() += 1;
        }
    }
    assert_eq!(opened_by.len(), setup.players.len());
    assert!(opened_by.values().all(|count| *count == 1));

    let game = setup.coordinator.games().active_game(ROOM_CODE).await.unwrap();
    assert!(game.started_at.is_some());
    assert_eq!(setup.coordinator.scheduler().pending_count(), 1);
}
