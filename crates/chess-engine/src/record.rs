//! Game state and move-history replay.

use crate::{apply_move, Board, BoardView, EngineError, Rights};
use chess_core::{FenParser, Move, Point, Side};

/// A board together with the rights that belong to the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub rights: Rights,
}

impl GameState {
    /// The standard starting position.
    pub fn initial() -> Self {
        GameState {
            board: Board::initial(),
            rights: Rights::initial(),
        }
    }

    /// Builds board, rights and position counter from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let parsed = FenParser::parse(fen)?;
        Ok(GameState {
            board: Board::from_parsed(&parsed)?,
            rights: Rights::from_fen(&parsed),
        })
    }

    /// Renders the position as FEN. Clocks are not tracked, so the halfmove
    /// clock is always 0.
    pub fn to_fen(&self) -> String {
        let side = self.board.side_to_move();
        let en_passant = self
            .rights
            .en_passant_column(side)
            .map(|col| {
                let row = (side.en_passant_row() as i8 + side.pawn_direction()) as u8;
                Point::at(row, col).to_string()
            })
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {} 0 {}",
            self.board.to_fen_placement(),
            if side == Side::White { 'w' } else { 'b' },
            self.rights.castling_fen(),
            en_passant,
            self.board.position() / 2 + 1
        )
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::initial()
    }
}

/// Initial state plus the ordered moves played from it.
///
/// Any position between the initial and the current one can be rebuilt by
/// replaying the history; the record never stores intermediate boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    initial: GameState,
    history: Vec<Move>,
}

impl GameRecord {
    pub fn new(initial: GameState) -> Self {
        GameRecord {
            initial,
            history: Vec::new(),
        }
    }

    #[inline]
    pub fn initial(&self) -> &GameState {
        &self.initial
    }

    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[inline]
    pub fn initial_position(&self) -> u32 {
        self.initial.board.position()
    }

    #[inline]
    pub fn current_position(&self) -> u32 {
        self.initial_position() + self.history.len() as u32
    }

    /// The move played from `position`, if it has been played.
    pub fn move_at(&self, position: u32) -> Option<Move> {
        let index = position.checked_sub(self.initial_position())?;
        self.history.get(index as usize).copied()
    }

    /// Replays the history up to `upto`.
    ///
    /// `upto` must lie between the initial and the current position.
    pub fn reconstruct(&self, upto: u32) -> Result<GameState, EngineError> {
        if upto < self.initial_position() || upto > self.current_position() {
            return Err(EngineError::contract(format!(
                "position {} is outside the recorded range {}..={}",
                upto,
                self.initial_position(),
                self.current_position()
            )));
        }
        let mut state = self.initial.clone();
        let count = (upto - self.initial_position()) as usize;
        for &mv in &self.history[..count] {
            apply_move(&mut state.board, &mut state.rights, mv)?;
        }
        Ok(state)
    }

    /// Replays the whole history.
    pub fn current(&self) -> Result<GameState, EngineError> {
        self.reconstruct(self.current_position())
    }

    /// Appends a move already validated against the current position.
    pub fn push(&mut self, mv: Move) {
        self.history.push(mv);
    }

    /// Drops the last `offset` moves.
    pub fn rollback(&mut self, offset: u32) -> Result<(), EngineError> {
        if offset == 0 || offset as usize > self.history.len() {
            return Err(EngineError::contract(format!(
                "cannot take back {} positions of {}",
                offset,
                self.history.len()
            )));
        }
        self.history.truncate(self.history.len() - offset as usize);
        Ok(())
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        GameRecord::new(GameState::initial())
    }
}
