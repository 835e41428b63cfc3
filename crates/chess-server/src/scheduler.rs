//! Debounced bot-move scheduling.
//!
//! A scheduled bot move waits for its delay, then fires only if the game's
//! pending entry is still the one it created. Scheduling again for the same
//! game replaces the entry, so a burst of triggers results in a single move,
//! fired for the latest request on the latest request's deadline. The commit
//! itself runs on the blocking pool, with a semaphore capping how many run
//! at once.

use crate::{GameId, ServiceError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingMove {
    position: u32,
    generation: u64,
}

/// Pending bot moves keyed by game, each with the position it was
/// requested for.
pub struct BotScheduler {
    pending: Arc<Mutex<HashMap<GameId, PendingMove>>>,
    permits: Arc<Semaphore>,
    generations: AtomicU64,
    workers: usize,
}

impl BotScheduler {
    /// Creates a scheduler running at most `workers` commits at once.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        BotScheduler {
            pending: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(workers)),
            generations: AtomicU64::new(0),
            workers,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Position the pending move of `game` was requested for, if any.
    pub fn pending_position(&self, game: GameId) -> Option<u32> {
        self.pending.lock().get(&game).map(|entry| entry.position)
    }

    /// Schedules `commit` to run after `delay` for `expected_position`.
    ///
    /// Any earlier request for `game` is superseded, even one for the same
    /// position, so the delay restarts with every call.
    ///
    /// The returned task resolves to true if `commit` ran and reported a
    /// committed move. It resolves to false if the request was superseded
    /// or cancelled before firing, or if `commit` failed.
    ///
    /// Must be called within a Tokio runtime.
    pub fn schedule<F>(
        &self,
        game: GameId,
        expected_position: u32,
        delay: Duration,
        commit: F,
    ) -> JoinHandle<bool>
    where
        F: FnOnce() -> Result<bool, ServiceError> + Send + 'static,
    {
        let request = PendingMove {
            position: expected_position,
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
        };
        if let Some(previous) = self.pending.lock().insert(game, request) {
            debug!(
                game_id = game,
                previous = previous.position,
                expected_position,
                "bot move request replaced"
            );
        }

        let pending = Arc::clone(&self.pending);
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut pending = pending.lock();
                match pending.get(&game) {
                    Some(&entry) if entry == request => {
                        pending.remove(&game);
                    }
                    _ => {
                        debug!(
                            game_id = game,
                            expected_position, "bot move superseded or cancelled"
                        );
                        return false;
                    }
                }
            }

            let Ok(_permit) = permits.acquire_owned().await else {
                return false;
            };
            match tokio::task::spawn_blocking(commit).await {
                Ok(Ok(committed)) => committed,
                Ok(Err(err)) => {
                    warn!(game_id = game, expected_position, error = %err, "bot move failed");
                    false
                }
                Err(err) => {
                    error!(game_id = game, error = %err, "bot move task panicked");
                    false
                }
            }
        })
    }

    /// Removes the pending move of `game`. Has no effect on a move that has
    /// already passed its position check. Returns true if an entry was
    /// removed.
    pub fn cancel(&self, game: GameId) -> bool {
        let removed = self.pending.lock().remove(&game).is_some();
        if removed {
            debug!(game_id = game, "bot move cancelled");
        }
        removed
    }
}

impl std::fmt::Debug for BotScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotScheduler")
            .field("pending", &self.pending.lock().len())
            .field("workers", &self.workers)
            .finish()
    }
}
