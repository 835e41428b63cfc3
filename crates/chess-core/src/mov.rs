//! Move representation.

use crate::{Piece, PieceType, Point, PointError};
use std::fmt;
use thiserror::Error;

/// Errors produced when parsing move text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("malformed move: '{0}'")]
    Malformed(String),

    #[error("invalid promotion piece '{0}'")]
    InvalidPromotion(char),

    #[error(transparent)]
    Point(#[from] PointError),
}

/// A move from one point to another, with an optional pawn promotion piece.
///
/// Encoded compactly: 6 bits from, 6 bits to, 3 bits promotion piece.
/// A move whose origin equals its destination is a *cut* marker: it
/// names a single square whose piece was removed as a side effect (the
/// pawn taken en passant).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    #[inline]
    const fn encode(from: Point, to: Point, promotion: u16) -> Self {
        Move((from.index() as u16) | ((to.index() as u16) << 6) | (promotion << 12))
    }

    /// Creates a plain move.
    #[inline]
    pub const fn new(from: Point, to: Point) -> Self {
        Self::encode(from, to, 0)
    }

    /// Creates a pawn move that promotes to `kind` on arrival.
    #[inline]
    pub const fn with_promotion(from: Point, to: Point, kind: PieceType) -> Self {
        Self::encode(from, to, kind as u16 + 1)
    }

    /// Creates a cut marker for the piece removed from `point`.
    #[inline]
    pub const fn cut(point: Point) -> Self {
        Self::encode(point, point, 0)
    }

    /// Returns the origin point.
    #[inline]
    pub const fn from(self) -> Point {
        Point::at(((self.0 >> 3) & 7) as u8, (self.0 & 7) as u8)
    }

    /// Returns the destination point.
    #[inline]
    pub const fn to(self) -> Point {
        Point::at(((self.0 >> 9) & 7) as u8, ((self.0 >> 6) & 7) as u8)
    }

    /// Returns the promotion piece, if any.
    #[inline]
    pub const fn promotion(self) -> Option<PieceType> {
        match (self.0 >> 12) & 7 {
            2 => Some(PieceType::Knight),
            3 => Some(PieceType::Bishop),
            4 => Some(PieceType::Rook),
            5 => Some(PieceType::Queen),
            _ => None,
        }
    }

    /// Returns true if this is a cut marker.
    #[inline]
    pub const fn is_cut(self) -> bool {
        (self.0 & 0x3F) == ((self.0 >> 6) & 0x3F)
    }

    /// Returns true if `piece` making this move is castling.
    #[inline]
    pub fn is_castling(self, piece: Piece) -> bool {
        piece.is(PieceType::King) && self.from().col().abs_diff(self.to().col()) == 2
    }

    /// Returns true if `piece` making this move is castling towards column 7.
    #[inline]
    pub fn is_short_castling(self, piece: Piece) -> bool {
        self.is_castling(piece) && self.to().col() > self.from().col()
    }

    /// Returns true if `piece` making this move is castling towards column 0.
    #[inline]
    pub fn is_long_castling(self, piece: Piece) -> bool {
        self.is_castling(piece) && self.to().col() < self.from().col()
    }

    /// Returns true if `piece` making this move is a two-square pawn advance.
    #[inline]
    pub fn is_long_pawn_move(self, piece: Piece) -> bool {
        piece.is(PieceType::Pawn) && self.from().row().abs_diff(self.to().row()) == 2
    }

    /// Returns true if `piece` making this move changes column as a pawn.
    #[inline]
    pub fn is_pawn_diagonal(self, piece: Piece) -> bool {
        piece.is(PieceType::Pawn) && self.from().col() != self.to().col()
    }

    /// Returns true if `piece` arrives on its promotion row with this move.
    #[inline]
    pub fn reaches_promotion_row(self, piece: Piece) -> bool {
        piece.is(PieceType::Pawn) && self.to().row() == piece.side.promotion_row()
    }

    /// Parses move text such as `e2-e4`, `e2e4`, or `e7-e8=Q`.
    pub fn parse(s: &str) -> Result<Self, MoveParseError> {
        let (body, promotion) = match s.split_once('=') {
            Some((body, suffix)) => {
                let mut chars = suffix.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(MoveParseError::Malformed(s.to_string()));
                };
                match PieceType::from_letter(c) {
                    Some(kind) if kind.is_promotion_target() => (body, Some(kind)),
                    _ => return Err(MoveParseError::InvalidPromotion(c)),
                }
            }
            None => (s, None),
        };

        let (from, to) = match body.split_once('-') {
            Some(parts) => parts,
            None if body.len() == 4 && body.is_ascii() => body.split_at(2),
            None => return Err(MoveParseError::Malformed(s.to_string())),
        };
        let from = Point::parse(from)?;
        let to = Point::parse(to)?;
        if from == to {
            return Err(MoveParseError::Malformed(s.to_string()));
        }

        Ok(match promotion {
            Some(kind) => Move::with_promotion(from, to, kind),
            None => Move::new(from, to),
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_cut() {
            return write!(f, "x{}", self.from());
        }
        write!(f, "{}-{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion() {
            write!(f, "={}", kind.letter().to_ascii_uppercase())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self)
    }
}
