use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum_macros::Display;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// What a scheduled task is for. At most one task per purpose per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskPurpose {
    AutoStart,
    AutoFinish,
}

struct ScheduledTask {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerState {
    tasks: HashMap<(String, TaskPurpose), ScheduledTask>,
    /// Games whose word has already been revealed by the sweep
    revealed: HashSet<Uuid>,
}

/// Table of cancellable, delayed single-shot jobs keyed by room and purpose.
///
/// The table lock is never held across an await point.
#[derive(Clone, Default)]
pub struct TaskScheduler {
    state: Arc<Mutex<SchedulerState>>,
    next_id: Arc<AtomicU64>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        // The guarded maps stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `task` after `delay`, replacing any pending task with the same key
    pub fn schedule<F>(&self, room_code: &str, purpose: TaskPurpose, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = (room_code.to_string(), purpose);
        let scheduler = self.clone();
        let task_key = key.clone();

        let mut state = self.state();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Once fired, the task leaves the table so a later cancel cannot abort it mid-run
            if !scheduler.release(&task_key, id) {
                return;
            }
            debug!(room_code = %task_key.0, purpose = %task_key.1, "Scheduled task firing");
            task.await;
        });

        if let Some(previous) = state.tasks.insert(key, ScheduledTask { id, handle }) {
            previous.handle.abort();
        }

        debug!(
            room_code = %room_code,
            purpose = %purpose,
            delay_ms = delay.as_millis() as u64,
            "Task scheduled"
        );
    }

    /// Removes the entry if it still belongs to task `id`
    fn release(&self, key: &(String, TaskPurpose), id: u64) -> bool {
        let mut state = self.state();
        match state.tasks.get(key) {
            Some(task) if task.id == id => {
                state.tasks.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Cancels a pending task. Returns false if nothing was pending.
    pub fn cancel(&self, room_code: &str, purpose: TaskPurpose) -> bool {
        let removed = self
            .state()
            .tasks
            .remove(&(room_code.to_string(), purpose));

        match removed {
            Some(task) => {
                task.handle.abort();
                debug!(room_code = %room_code, purpose = %purpose, "Task cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, room_code: &str, purpose: TaskPurpose) -> bool {
        self.state()
            .tasks
            .contains_key(&(room_code.to_string(), purpose))
    }

    /// Cancels every task of a room
    pub fn clear_room(&self, room_code: &str) {
        let mut state = self.state();
        let keys: Vec<(String, TaskPurpose)> = state
            .tasks
            .keys()
            .filter(|(code, _)| code == room_code)
            .cloned()
            .collect();

        for key in keys {
            if let Some(task) = state.tasks.remove(&key) {
                task.handle.abort();
            }
        }
    }

    /// Claims the reveal of a game. Only the first caller per game gets `true`.
    pub fn mark_revealed(&self, game_id: Uuid) -> bool {
        self.state().revealed.insert(game_id)
    }

    pub fn forget_revealed(&self, game_ids: &[Uuid]) {
        let mut state = self.state();
        for id in game_ids {
            state.revealed.remove(id);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.state().tasks.len()
    }

    pub fn revealed_count(&self) -> usize {
        self.state().revealed.len()
    }
}
