//! Rules and search core of the chess server.
//!
//! This crate provides:
//! - [`Board`] - 8×8 piece placement with a position counter and cached king points
//! - [`Rights`] - per-side castling and en passant eligibility
//! - [`MoveGenerator`] - exact legal destinations (checks, pins, castling, en passant)
//! - [`apply_move`] / [`undo_move`] - in-place move application with exact rollback
//! - [`GameRecord`] - replay of a move history to any recorded position
//! - [`SearchEngine`] - depth-limited traversal on a single rollback-driven board
//!
//! # Architecture
//!
//! Read access to a board goes through [`BoardView`]; mutation goes through
//! [`MutableBoard`]. The move generator only needs the former, so it works
//! the same on a plain [`Board`] and on the search engine's [`BoardHolder`].
//! Rights are kept next to the board rather than inside it: the applier
//! returns everything needed to undo a move, rights included.
//!
//! # Example
//!
//! ```
//! use chess_core::{Move, Point, Side};
//! use chess_engine::{apply_move, undo_move, GameState, MoveGenerator};
//!
//! let mut state = GameState::initial();
//! let generator = MoveGenerator::default();
//!
//! let e2 = Point::parse("e2").unwrap();
//! let destinations = generator
//!     .legal_destinations(&state.board, &state.rights, Side::White, e2)
//!     .unwrap();
//! assert_eq!(destinations.len(), 2);
//!
//! let before = state.clone();
//! let applied = apply_move(&mut state.board, &mut state.rights, Move::parse("e2-e4").unwrap()).unwrap();
//! undo_move(&mut state.board, &mut state.rights, &applied).unwrap();
//! assert_eq!(state, before);
//! ```

mod applier;
mod board;
mod error;
pub mod movegen;
mod point_set;
mod record;
mod rights;
pub mod search;

pub use applier::{apply_move, undo_move, update_rights, AppliedMove};
pub use board::{Board, BoardView, MutableBoard};
pub use error::EngineError;
pub use movegen::{GameStatus, MoveGenerator, MoveList};
pub use point_set::{PointSet, PointSetIter};
pub use record::{GameRecord, GameState};
pub use rights::{Rights, SideRights};
pub use search::{
    BoardHolder, BranchReport, BranchScorer, FirstBranchScorer, SearchEngine, SearchReport,
    DEFAULT_DEPTH,
};
