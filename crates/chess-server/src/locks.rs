//! Per-game lock manager.
//!
//! Every mutation of a game runs inside [`GameLocks::run_exclusive`] for its
//! id, so at most one mutation per game is in flight. Games never share a
//! lock, so different games proceed in parallel.

use crate::{GameId, ServiceError};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

struct LockEntry {
    mutex: Arc<ReentrantMutex<()>>,
    last_used: Instant,
}

/// Lazily created reentrant mutexes keyed by game id.
#[derive(Default)]
pub struct GameLocks {
    entries: Mutex<HashMap<GameId, LockEntry>>,
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Runs `action` while holding the game's lock, blocking until the lock
    /// is free. The same thread may nest calls for the same game.
    ///
    /// The lock is released on every exit path, panics included.
    pub fn run_exclusive<T>(&self, game: GameId, action: impl FnOnce() -> T) -> T {
        let mutex = self.handle(game);
        let _guard = mutex.lock();
        action()
    }

    /// Like [`Self::run_exclusive`], but reports [`ServiceError::GameBusy`]
    /// instead of waiting when another thread holds the lock.
    pub fn try_run_exclusive<T>(
        &self,
        game: GameId,
        action: impl FnOnce() -> T,
    ) -> Result<T, ServiceError> {
        let mutex = self.handle(game);
        let Some(_guard) = mutex.try_lock() else {
            debug!(game_id = game, "game lock busy");
            return Err(ServiceError::GameBusy(game));
        };
        Ok(action())
    }

    /// Drops entries unused for longer than `threshold`. Returns how many
    /// were evicted.
    ///
    /// An entry whose mutex is still referenced outside the registry is kept
    /// regardless of age, so a held lock is never replaced by a fresh one.
    pub fn sweep_idle(&self, threshold: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.last_used.elapsed() < threshold || Arc::strong_count(&entry.mutex) > 1
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "evicted idle game locks");
        }
        evicted
    }

    /// Sweeps idle entries every `interval` on the Tokio runtime.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        threshold: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep_idle(threshold);
            }
        })
    }

    fn handle(&self, game: GameId) -> Arc<ReentrantMutex<()>> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(game).or_insert_with(|| LockEntry {
            mutex: Arc::new(ReentrantMutex::new(())),
            last_used: Instant::now(),
        });
        entry.last_used = Instant::now();
        Arc::clone(&entry.mutex)
    }
}

impl std::fmt::Debug for GameLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLocks")
            .field("games", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_exclusive_returns_action_result() {
        let locks = GameLocks::new();
        assert_eq!(locks.run_exclusive(1, || 42), 42);
        let result: Result<(), &str> = locks.run_exclusive(1, || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn nested_calls_on_same_thread() {
        let locks = GameLocks::new();
        let value = locks.run_exclusive(1, || locks.run_exclusive(1, || 7));
        assert_eq!(value, 7);
        let value = locks.run_exclusive(1, || locks.try_run_exclusive(1, || 8));
        assert_eq!(value.unwrap(), 8);
    }

    #[test]
    fn try_run_reports_busy_game() {
        let locks = Arc::new(GameLocks::new());
        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let holder = {
            let locks = Arc::clone(&locks);
            std::thread::spawn(move || {
                locks.run_exclusive(5, || {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };

        held_rx.recv().unwrap();
        assert!(matches!(
            locks.try_run_exclusive(5, || ()),
            Err(ServiceError::GameBusy(5))
        ));
        // other games are unaffected
        assert!(locks.try_run_exclusive(6, || ()).is_ok());

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(locks.try_run_exclusive(5, || ()).is_ok());
    }

    #[test]
    fn lock_released_after_panic() {
        let locks = Arc::new(GameLocks::new());
        let panicking = {
            let locks = Arc::clone(&locks);
            std::thread::spawn(move || locks.run_exclusive(3, || panic!("inside")))
        };
        assert!(panicking.join().is_err());
        assert!(locks.try_run_exclusive(3, || ()).is_ok());
    }

    #[test]
    fn sweep_evicts_only_idle_entries() {
        let locks = GameLocks::new();
        locks.run_exclusive(1, || ());
        locks.run_exclusive(2, || ());
        assert_eq!(locks.sweep_idle(Duration::from_secs(60)), 0);
        assert_eq!(locks.len(), 2);

        std::thread::sleep(Duration::from_millis(20));
        locks.run_exclusive(2, || ());
        assert_eq!(locks.sweep_idle(Duration::from_millis(10)), 1);
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn sweep_keeps_held_lock() {
        let locks = GameLocks::new();
        locks.run_exclusive(1, || {
            std::thread::sleep(Duration::from_millis(5));
            assert_eq!(locks.sweep_idle(Duration::ZERO), 0);
        });
        assert_eq!(locks.sweep_idle(Duration::ZERO), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_periodically() {
        let locks = Arc::new(GameLocks::new());
        locks.run_exclusive(1, || ());
        let sweeper = Arc::clone(&locks).spawn_sweeper(Duration::from_secs(600), Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert!(locks.is_empty());
        sweeper.abort();
    }
}
