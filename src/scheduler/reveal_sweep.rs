use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::coordinator::SessionCoordinator;

/// Periodically reveals the word of every game whose countdown ran out.
///
/// One sweep serves all rooms. Runs until the task is aborted.
#[instrument(skip(coordinator))]
pub async fn start_reveal_sweep(coordinator: SessionCoordinator, sweep_interval: Duration) {
    info!(
        sweep_interval_ms = sweep_interval.as_millis() as u64,
        "Starting word reveal sweep"
    );

    let mut ticker = interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let revealed = coordinator.reveal_expired_words().await;
        if revealed > 0 {
            debug!(revealed = revealed, "Reveal sweep completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::coordinator::RoomSettings;
    use crate::event::EventBus;
    use crate::game::repository::GameRepository;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::websockets::{Broadcaster, InMemoryConnectionManager};
    use std::sync::Arc;

    fn coordinator(duration_secs: u32) -> SessionCoordinator {
        let config = CoordinatorConfig {
            auto_start_delay: Duration::from_secs(60),
            game_duration_secs: duration_secs,
            master_end_grace: Duration::from_millis(0),
            voting_window: Duration::from_secs(60),
            reveal_sweep_interval: Duration::from_millis(10),
        };
        SessionCoordinator::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(GameRepository::new()),
            Broadcaster::new(EventBus::new(), Arc::new(InMemoryConnectionManager::new())),
            config,
        )
    }

    async fn running_game(coordinator: &SessionCoordinator) -> String {
        let room = coordinator
            .create_room(RoomSettings {
                name: "sweep".to_string(),
                capacity: 4,
                password: None,
                host_id: "a".to_string(),
                host_name: "A".to_string(),
            })
            .await
            .unwrap();
        coordinator.join_room(&room.code, "b", "B", None).await.unwrap();
        coordinator.toggle_ready(&room.code, "a").await.unwrap();
        coordinator.toggle_ready(&room.code, "b").await.unwrap();
        coordinator.start_game(&room.code, None).await.unwrap();
        coordinator.open_card(&room.code, "a").await.unwrap();
        coordinator.open_card(&room.code, "b").await.unwrap();
        room.code
    }

    #[tokio::test]
    async fn test_expired_word_is_revealed_once() {
        let coordinator = coordinator(0);
        let code = running_game(&coordinator).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(coordinator.reveal_expired_words().await, 1);
        assert_eq!(coordinator.reveal_expired_words().await, 0);

        let game = coordinator.games().active_game(&code).await.unwrap();
        assert!(game.word_revealed);
        assert!(!game.finished);
    }

    #[tokio::test]
    async fn test_running_countdown_stays_hidden() {
        let coordinator = coordinator(600);
        let code = running_game(&coordinator).await;

        assert_eq!(coordinator.reveal_expired_words().await, 0);
        let game = coordinator.games().active_game(&code).await.unwrap();
        assert!(!game.word_revealed);
    }

    #[tokio::test]
    async fn test_sweep_task_reveals_in_background() {
        let coordinator = coordinator(0);
        let code = running_game(&coordinator).await;

        let sweep = tokio::spawn(start_reveal_sweep(
            coordinator.clone(),
            Duration::from_millis(10),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweep.abort();

        let game = coordinator.games().active_game(&code).await.unwrap();
        assert!(game.word_revealed);
    }
}
