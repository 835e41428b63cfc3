//! Game service facade.
//!
//! Wires the rules core to storage, locking and bot scheduling. Every
//! mutation of a game happens inside its lock; read-only queries work on a
//! freshly replayed snapshot and take no lock.

use crate::config::{BotMode, ServerConfig};
use crate::{BotScheduler, GameId, GameLocks, GameRepository, ServiceError, StoredGame};
use chess_core::{Move, Point, Side};
use chess_engine::{
    apply_move, AppliedMove, BoardView, GameState, GameStatus, MoveGenerator, PointSet,
    SearchEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the change broadcast channel.
const CHANGES_CAPACITY: usize = 256;

/// What a committed move changed, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveChanges {
    pub game: GameId,
    /// Position reached by the move.
    pub position: u32,
    pub mv: Move,
    /// Castling rook relocation or en passant capture.
    pub secondary: Option<Move>,
    /// King of the side to move, if the move gives check.
    pub checked_king: Option<Point>,
    pub status: GameStatus,
}

struct ServiceInner<R> {
    repository: R,
    locks: Arc<GameLocks>,
    generator: MoveGenerator,
    engine: SearchEngine,
    bot_mode: BotMode,
    scheduler: BotScheduler,
    bot_delay: Duration,
    changes: broadcast::Sender<MoveChanges>,
}

/// Entry point for game-affecting requests. Cheap to clone.
pub struct GameService<R> {
    inner: Arc<ServiceInner<R>>,
}

impl<R> Clone for GameService<R> {
    fn clone(&self) -> Self {
        GameService {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: GameRepository + 'static> GameService<R> {
    pub fn new(repository: R, config: &ServerConfig) -> Self {
        let generator = MoveGenerator::default();
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        GameService {
            inner: Arc::new(ServiceInner {
                repository,
                locks: Arc::new(GameLocks::new()),
                engine: SearchEngine::new(generator.clone(), config.search_depth),
                generator,
                bot_mode: config.bot_mode,
                scheduler: BotScheduler::new(config.scheduler_workers),
                bot_delay: config.bot_move_delay(),
                changes,
            }),
        }
    }

    pub fn locks(&self) -> &Arc<GameLocks> {
        &self.inner.locks
    }

    pub fn repository(&self) -> &R {
        &self.inner.repository
    }

    pub fn generator(&self) -> &MoveGenerator {
        &self.inner.generator
    }

    /// Receives every committed move of every game.
    pub fn subscribe(&self) -> broadcast::Receiver<MoveChanges> {
        self.inner.changes.subscribe()
    }

    /// Stores a new game after checking its arrangement is playable.
    pub fn create_game(
        &self,
        initial: GameState,
        bot_sides: Vec<Side>,
    ) -> Result<GameId, ServiceError> {
        self.inner
            .generator
            .validate_arrangement(&initial.board, &initial.rights)?;
        let position = initial.board.position();
        let game = self.inner.repository.create(initial, bot_sides);
        info!(game_id = game, position, "game created");
        Ok(game)
    }

    /// Legal destinations of the piece on `origin` in the current position.
    pub fn legal_moves(
        &self,
        game: GameId,
        origin: Point,
        client_position: u32,
    ) -> Result<PointSet, ServiceError> {
        let (_, state) = self.current(game, client_position)?;
        let side = state.board.side_to_move();
        Ok(self
            .inner
            .generator
            .legal_destinations(&state.board, &state.rights, side, origin)?)
    }

    /// True if `side`'s king is attacked in the current position.
    pub fn is_in_check(&self, game: GameId, side: Side) -> Result<bool, ServiceError> {
        let state = self.inner.repository.load(game)?.record.current()?;
        Ok(self.inner.generator.is_in_check(&state.board, side))
    }

    pub fn status(&self, game: GameId) -> Result<GameStatus, ServiceError> {
        let state = self.inner.repository.load(game)?.record.current()?;
        Ok(self.inner.generator.status(&state.board, &state.rights)?)
    }

    /// Plays a human move.
    ///
    /// The client must be in sync with the game, `side` must be to move and
    /// not be played by the bot, and the move must be legal. If the bot
    /// plays the other side, its reply is scheduled.
    pub fn apply_player_move(
        &self,
        game: GameId,
        side: Side,
        mv: Move,
        client_position: u32,
    ) -> Result<MoveChanges, ServiceError> {
        let (changes, bot_replies) = self.inner.locks.run_exclusive(
            game,
            || -> Result<(MoveChanges, bool), ServiceError> {
                let (stored, mut state) = self.current(game, client_position)?;
                if state.board.side_to_move() != side || stored.is_bot(side) {
                    return Err(ServiceError::NotYourTurn(side));
                }
                let changes = self.commit(game, &mut state, mv)?;
                Ok((changes, stored.is_bot(side.opposite())))
            },
        )?;

        if bot_replies && changes.status == GameStatus::Ongoing {
            if tokio::runtime::Handle::try_current().is_ok() {
                self.schedule_bot_move(game, changes.position);
            } else {
                warn!(game_id = game, "no runtime available, bot reply not scheduled");
            }
        }
        Ok(changes)
    }

    /// Plays the bot's move if the game still sits at `expected_position`.
    ///
    /// Returns `Ok(None)` when the game has moved on or the bot has no legal
    /// move. A game locked by another request is reported as
    /// [`ServiceError::GameBusy`] instead of waited for.
    pub fn apply_bot_move(
        &self,
        game: GameId,
        expected_position: u32,
    ) -> Result<Option<MoveChanges>, ServiceError> {
        self.inner.locks.try_run_exclusive(game, || -> Result<_, ServiceError> {
            let stored = self.inner.repository.load(game)?;
            let current = stored.record.current_position();
            if current != expected_position {
                debug!(
                    game_id = game,
                    expected_position, current, "bot move for a stale position dropped"
                );
                return Ok(None);
            }
            let mut state = stored.record.current()?;
            let side = state.board.side_to_move();
            if !stored.is_bot(side) {
                return Err(ServiceError::NotYourTurn(side));
            }
            match self.select_bot_move(&state)? {
                Some(mv) => self.commit(game, &mut state, mv).map(Some),
                None => Ok(None),
            }
        })?
    }

    /// Bot move for the side to move in `state`, following the configured
    /// mode.
    pub fn select_bot_move(&self, state: &GameState) -> Result<Option<Move>, ServiceError> {
        let side = state.board.side_to_move();
        let engine = &self.inner.engine;
        let mv = match self.inner.bot_mode {
            BotMode::Tree => engine.select_move(&state.board, &state.rights, side)?,
            BotMode::Random => engine.select_random(
                &state.board,
                &state.rights,
                side,
                &mut rand::thread_rng(),
            )?,
        };
        Ok(mv)
    }

    /// Schedules a debounced bot move for `expected_position`.
    pub fn schedule_bot_move(&self, game: GameId, expected_position: u32) -> JoinHandle<bool> {
        let service = self.clone();
        self.inner.scheduler.schedule(
            game,
            expected_position,
            self.inner.bot_delay,
            move || Ok(service.apply_bot_move(game, expected_position)?.is_some()),
        )
    }

    pub fn cancel_bot_move(&self, game: GameId) -> bool {
        self.inner.scheduler.cancel(game)
    }

    pub fn pending_bot_move(&self, game: GameId) -> Option<u32> {
        self.inner.scheduler.pending_position(game)
    }

    /// Takes back the last `offset` positions and returns the new current
    /// position. A pending bot move for the game is cancelled.
    pub fn take_back(
        &self,
        game: GameId,
        offset: u32,
        client_position: u32,
    ) -> Result<u32, ServiceError> {
        let position = self
            .inner
            .locks
            .run_exclusive(game, || -> Result<u32, ServiceError> {
                let stored = self.inner.repository.load(game)?;
                check_position(&stored, client_position)?;
                self.inner.repository.take_back(game, offset)?;
                Ok(client_position - offset)
            })?;
        self.inner.scheduler.cancel(game);
        info!(game_id = game, offset, position, "moves taken back");
        Ok(position)
    }

    /// The move played from `client_position`, if the game has advanced
    /// past it.
    pub fn listen_changes(
        &self,
        game: GameId,
        client_position: u32,
    ) -> Result<Option<MoveChanges>, ServiceError> {
        let stored = self.inner.repository.load(game)?;
        let record = &stored.record;
        let server = record.current_position();
        if client_position == server {
            return Ok(None);
        }
        let mismatch = ServiceError::PositionMismatch {
            client: client_position,
            server,
        };
        let Some(mv) = record.move_at(client_position) else {
            return Err(mismatch);
        };
        let mut state = record.reconstruct(client_position)?;
        let applied = apply_move(&mut state.board, &mut state.rights, mv)?;
        Ok(Some(self.changes_after(game, &state, &applied)?))
    }

    fn current(
        &self,
        game: GameId,
        client_position: u32,
    ) -> Result<(StoredGame, GameState), ServiceError> {
        let stored = self.inner.repository.load(game)?;
        check_position(&stored, client_position)?;
        let state = stored.record.current()?;
        Ok((stored, state))
    }

    /// Validates, applies and stores `mv`, then broadcasts the change.
    fn commit(
        &self,
        game: GameId,
        state: &mut GameState,
        mv: Move,
    ) -> Result<MoveChanges, ServiceError> {
        self.inner
            .generator
            .validate_move(&state.board, &state.rights, mv)?;
        let applied = apply_move(&mut state.board, &mut state.rights, mv)?;
        self.inner.repository.append_move(game, mv)?;

        let changes = self.changes_after(game, state, &applied)?;
        info!(
            game_id = game,
            position = changes.position,
            mv = %mv,
            check = changes.checked_king.is_some(),
            "move committed"
        );
        if self.inner.changes.send(changes.clone()).is_err() {
            debug!(game_id = game, "no change listeners");
        }
        Ok(changes)
    }

    fn changes_after(
        &self,
        game: GameId,
        state: &GameState,
        applied: &AppliedMove,
    ) -> Result<MoveChanges, ServiceError> {
        let generator = &self.inner.generator;
        let to_move = state.board.side_to_move();
        let checked_king = generator
            .is_in_check(&state.board, to_move)
            .then(|| state.board.king_point(to_move));
        Ok(MoveChanges {
            game,
            position: state.board.position(),
            mv: applied.mv,
            secondary: applied.secondary,
            checked_king,
            status: generator.status(&state.board, &state.rights)?,
        })
    }
}

fn check_position(stored: &StoredGame, client_position: u32) -> Result<(), ServiceError> {
    let server = stored.record.current_position();
    if client_position != server {
        return Err(ServiceError::PositionMismatch {
            client: client_position,
            server,
        });
    }
    Ok(())
}

impl<R> std::fmt::Debug for GameService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("locks", &self.inner.locks)
            .field("scheduler", &self.inner.scheduler)
            .field("bot_mode", &self.inner.bot_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryRepository;
    use chess_engine::EngineError;

    fn p(s: &str) -> Point {
        Point::parse(s).unwrap()
    }

    fn mv(s: &str) -> Move {
        Move::parse(s).unwrap()
    }

    fn service(mode: BotMode) -> GameService<InMemoryRepository> {
        let config = ServerConfig {
            search_depth: 2,
            bot_mode: mode,
            bot_move_delay_ms: 5,
            ..ServerConfig::default()
        };
        GameService::new(InMemoryRepository::new(), &config)
    }

    #[test]
    fn legal_moves_of_start_pawn() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();
        let moves = service.legal_moves(game, p("e2"), 0).unwrap();
        assert_eq!(moves, [p("e3"), p("e4")].into_iter().collect());
    }

    #[test]
    fn stale_client_is_rejected() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();
        service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        let err = service.legal_moves(game, p("e7"), 0).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PositionMismatch { client: 0, server: 1 }
        ));
        assert!(err.is_invalid_request());
    }

    #[test]
    fn player_moves_alternate() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();

        let changes = service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        assert_eq!(changes.position, 1);
        assert_eq!(changes.secondary, None);
        assert_eq!(changes.checked_king, None);
        assert_eq!(changes.status, GameStatus::Ongoing);

        assert!(matches!(
            service.apply_player_move(game, Side::White, mv("d2-d4"), 1),
            Err(ServiceError::NotYourTurn(Side::White))
        ));
        let err = service
            .apply_player_move(game, Side::Black, mv("e7-e4"), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::ContractViolation(_))
        ));
        assert!(err.is_invalid_request());
        service
            .apply_player_move(game, Side::Black, mv("e7-e5"), 1)
            .unwrap();
        assert_eq!(
            service.repository().load(game).unwrap().record.history(),
            &[mv("e2-e4"), mv("e7-e5")]
        );
    }

    #[test]
    fn checkmate_is_reported() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();
        let moves = [
            (Side::White, "f2-f3"),
            (Side::Black, "e7-e5"),
            (Side::White, "g2-g4"),
        ];
        for (position, (side, text)) in moves.into_iter().enumerate() {
            service
                .apply_player_move(game, side, mv(text), position as u32)
                .unwrap();
        }
        let changes = service
            .apply_player_move(game, Side::Black, mv("d8-h4"), 3)
            .unwrap();
        assert_eq!(changes.checked_king, Some(p("e1")));
        assert_eq!(changes.status, GameStatus::Checkmate(Side::Black));
        assert!(service.is_in_check(game, Side::White).unwrap());
        assert_eq!(
            service.status(game).unwrap(),
            GameStatus::Checkmate(Side::Black)
        );
    }

    #[test]
    fn castling_reports_rook_move() {
        let service = service(BotMode::Tree);
        let initial = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let game = service.create_game(initial, vec![]).unwrap();
        let changes = service
            .apply_player_move(game, Side::White, mv("e1-g1"), 0)
            .unwrap();
        assert_eq!(changes.secondary, Some(mv("h1-f1")));
    }

    #[test]
    fn invalid_arrangement_is_refused() {
        let service = service(BotMode::Tree);
        let initial = GameState::from_fen("4k3/8/8/8/8/8/8/4KR2 w - - 0 1").unwrap();
        assert!(service.create_game(initial, vec![]).is_ok());
        // black is in check with white to move
        let initial = GameState::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(matches!(
            service.create_game(initial, vec![]),
            Err(ServiceError::Engine(EngineError::InvalidArrangement(_)))
        ));
    }

    #[test]
    fn bot_move_applies_for_expected_position_only() {
        let service = service(BotMode::Tree);
        let game = service
            .create_game(GameState::initial(), vec![Side::White])
            .unwrap();
        assert_eq!(service.apply_bot_move(game, 3).unwrap(), None);

        let changes = service.apply_bot_move(game, 0).unwrap().unwrap();
        assert_eq!(changes.position, 1);
        let legal = service
            .generator()
            .legal_moves(&GameState::initial().board, &GameState::initial().rights, Side::White)
            .unwrap();
        assert!(legal.contains(changes.mv));

        // black is not played by the bot
        assert!(matches!(
            service.apply_bot_move(game, 1),
            Err(ServiceError::NotYourTurn(Side::Black))
        ));
    }

    #[test]
    fn random_bot_plays_legal_moves() {
        let service = service(BotMode::Random);
        let game = service
            .create_game(GameState::initial(), vec![Side::White, Side::Black])
            .unwrap();
        for position in 0..10 {
            match service.apply_bot_move(game, position).unwrap() {
                Some(changes) => assert_eq!(changes.position, position + 1),
                None => break,
            }
        }
    }

    #[test]
    fn busy_game_is_reported() {
        let service = service(BotMode::Tree);
        let game = service
            .create_game(GameState::initial(), vec![Side::White])
            .unwrap();
        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let holder = {
            let locks = Arc::clone(service.locks());
            std::thread::spawn(move || {
                locks.run_exclusive(game, || {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };
        held_rx.recv().unwrap();
        assert!(matches!(
            service.apply_bot_move(game, 0),
            Err(ServiceError::GameBusy(id)) if id == game
        ));
        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(service.apply_bot_move(game, 0).unwrap().is_some());
    }

    #[test]
    fn listen_changes_replays_moves() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();
        assert_eq!(service.listen_changes(game, 0).unwrap(), None);

        service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        service
            .apply_player_move(game, Side::Black, mv("d7-d5"), 1)
            .unwrap();

        let first = service.listen_changes(game, 0).unwrap().unwrap();
        assert_eq!((first.position, first.mv), (1, mv("e2-e4")));
        let second = service.listen_changes(game, 1).unwrap().unwrap();
        assert_eq!((second.position, second.mv), (2, mv("d7-d5")));
        assert_eq!(service.listen_changes(game, 2).unwrap(), None);
        assert!(matches!(
            service.listen_changes(game, 5),
            Err(ServiceError::PositionMismatch { client: 5, server: 2 })
        ));
    }

    #[test]
    fn take_back_rewinds_game() {
        let service = service(BotMode::Tree);
        let game = service.create_game(GameState::initial(), vec![]).unwrap();
        service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        service
            .apply_player_move(game, Side::Black, mv("e7-e5"), 1)
            .unwrap();
        assert!(service.take_back(game, 1, 1).is_err());
        assert!(service.take_back(game, 3, 2).is_err());
        assert_eq!(service.take_back(game, 2, 2).unwrap(), 0);
        assert_eq!(
            service.legal_moves(game, p("e2"), 0).unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn bot_replies_to_player_move() {
        let service = service(BotMode::Tree);
        let game = service
            .create_game(GameState::initial(), vec![Side::Black])
            .unwrap();
        let mut changes = service.subscribe();

        service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        assert_eq!(service.pending_bot_move(game), Some(1));

        let player = changes.recv().await.unwrap();
        assert_eq!(player.mv, mv("e2-e4"));
        let bot = changes.recv().await.unwrap();
        assert_eq!(bot.game, game);
        assert_eq!(bot.position, 2);
        assert_eq!(service.pending_bot_move(game), None);
    }

    #[tokio::test]
    async fn take_back_cancels_pending_bot_move() {
        let config = ServerConfig {
            search_depth: 1,
            bot_move_delay_ms: 200,
            ..ServerConfig::default()
        };
        let service = GameService::new(InMemoryRepository::new(), &config);
        let game = service
            .create_game(GameState::initial(), vec![Side::Black])
            .unwrap();
        service
            .apply_player_move(game, Side::White, mv("e2-e4"), 0)
            .unwrap();
        assert_eq!(service.pending_bot_move(game), Some(1));
        service.take_back(game, 1, 1).unwrap();
        assert_eq!(service.pending_bot_move(game), None);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            service.repository().load(game).unwrap().record.current_position(),
            0
        );
    }
}
