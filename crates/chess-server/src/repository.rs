//! Game storage collaborator.
//!
//! The service never stores boards: a game is its initial state, its move
//! history and the sides played by the bot. Boards are rebuilt by replay.

use crate::{GameId, ServiceError};
use chess_core::{Move, Side};
use chess_engine::{GameRecord, GameState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGame {
    pub record: GameRecord,
    /// Sides whose moves are chosen by the server.
    pub bot_sides: Vec<Side>,
}

impl StoredGame {
    pub fn is_bot(&self, side: Side) -> bool {
        self.bot_sides.contains(&side)
    }
}

/// Persistence used by [`GameService`](crate::GameService).
pub trait GameRepository: Send + Sync {
    /// Stores a new game and returns its id.
    fn create(&self, initial: GameState, bot_sides: Vec<Side>) -> GameId;

    /// Snapshot of a stored game.
    fn load(&self, game: GameId) -> Result<StoredGame, ServiceError>;

    /// Appends a validated move to the history.
    fn append_move(&self, game: GameId, mv: Move) -> Result<(), ServiceError>;

    /// Drops the last `offset` moves.
    fn take_back(&self, game: GameId, offset: u32) -> Result<(), ServiceError>;

    /// Board and rights of `game` at position `upto`.
    fn reconstruct(&self, game: GameId, upto: u32) -> Result<GameState, ServiceError> {
        Ok(self.load(game)?.record.reconstruct(upto)?)
    }
}

/// Process-local repository.
#[derive(Debug)]
pub struct InMemoryRepository {
    games: Mutex<HashMap<GameId, StoredGame>>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository {
            games: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.games.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.lock().is_empty()
    }

    fn with_game<T>(
        &self,
        game: GameId,
        f: impl FnOnce(&mut StoredGame) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut games = self.games.lock();
        let stored = games
            .get_mut(&game)
            .ok_or(ServiceError::GameNotFound(game))?;
        f(stored)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRepository for InMemoryRepository {
    fn create(&self, initial: GameState, bot_sides: Vec<Side>) -> GameId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.games.lock().insert(
            id,
            StoredGame {
                record: GameRecord::new(initial),
                bot_sides,
            },
        );
        id
    }

    fn load(&self, game: GameId) -> Result<StoredGame, ServiceError> {
        self.with_game(game, |stored| Ok(stored.clone()))
    }

    fn append_move(&self, game: GameId, mv: Move) -> Result<(), ServiceError> {
        self.with_game(game, |stored| {
            stored.record.push(mv);
            Ok(())
        })
    }

    fn take_back(&self, game: GameId, offset: u32) -> Result<(), ServiceError> {
        self.with_game(game, |stored| Ok(stored.record.rollback(offset)?))
    }
}
