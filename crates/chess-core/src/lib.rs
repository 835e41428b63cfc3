//! Core types for chess.
//!
//! This crate provides the value types shared by the engine and the server:
//! - [`Side`], [`PieceType`] and [`Piece`] for piece representation
//! - [`Point`] for board coordinates
//! - [`Move`] for move representation
//! - [`Vector`] and the [`Vectors`] direction table
//! - FEN parsing

mod fen;
mod mov;
mod piece;
mod point;
mod side;
mod vector;

pub use fen::{FenCastling, FenError, FenParser};
pub use mov::{Move, MoveParseError};
pub use piece::{Piece, PieceType};
pub use point::{Point, PointError, BOARD_SIZE};
pub use side::Side;
pub use vector::{Vector, Vectors};
