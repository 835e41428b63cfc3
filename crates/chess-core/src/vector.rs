//! Movement directions per piece type.

use crate::{PieceType, Point};

/// A unit step on the board, in rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vector {
    pub row: i8,
    pub col: i8,
}

impl Vector {
    #[inline]
    pub const fn new(row: i8, col: i8) -> Self {
        Vector { row, col }
    }

    /// Returns true if both components are non-zero.
    #[inline]
    pub const fn is_diagonal(self) -> bool {
        self.row != 0 && self.col != 0
    }

    /// Returns the unit direction leading from `from` towards `to`, if the
    /// two points share a row, column, or diagonal.
    pub fn between(from: Point, to: Point) -> Option<Vector> {
        if !from.has_common_vector_with(to) {
            return None;
        }
        let row = (to.row() as i8 - from.row() as i8).signum();
        let col = (to.col() as i8 - from.col() as i8).signum();
        Some(Vector::new(row, col))
    }

    /// Returns true if a piece of the given type slides along this direction.
    #[inline]
    pub fn is_slid_by(self, kind: PieceType) -> bool {
        match kind {
            PieceType::Queen => true,
            PieceType::Rook => !self.is_diagonal(),
            PieceType::Bishop => self.is_diagonal(),
            _ => false,
        }
    }

    /// Applies this step to `point`.
    #[inline]
    pub const fn step(self, point: Point) -> Option<Point> {
        point.offset(self.row, self.col)
    }
}

/// Direction table for every piece type.
///
/// Built once at start-up and handed to the move generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vectors {
    rook: [Vector; 4],
    bishop: [Vector; 4],
    queen: [Vector; 8],
    knight: [Vector; 8],
}

impl Vectors {
    /// The standard chess direction table.
    pub fn standard() -> Self {
        let rook = [
            Vector::new(1, 0),
            Vector::new(-1, 0),
            Vector::new(0, 1),
            Vector::new(0, -1),
        ];
        let bishop = [
            Vector::new(1, 1),
            Vector::new(1, -1),
            Vector::new(-1, 1),
            Vector::new(-1, -1),
        ];
        let mut queen = [Vector::new(0, 0); 8];
        queen[..4].copy_from_slice(&rook);
        queen[4..].copy_from_slice(&bishop);
        let knight = [
            Vector::new(2, 1),
            Vector::new(2, -1),
            Vector::new(-2, 1),
            Vector::new(-2, -1),
            Vector::new(1, 2),
            Vector::new(1, -2),
            Vector::new(-1, 2),
            Vector::new(-1, -2),
        ];
        Vectors {
            rook,
            bishop,
            queen,
            knight,
        }
    }

    /// Directions a piece of the given type moves along.
    ///
    /// Sliders repeat the step until blocked; knights and kings take it once.
    /// Pawns are handled separately and have no entry.
    pub fn for_piece(&self, kind: PieceType) -> &[Vector] {
        match kind {
            PieceType::Pawn => &[],
            PieceType::Knight => &self.knight,
            PieceType::Bishop => &self.bishop,
            PieceType::Rook => &self.rook,
            PieceType::Queen | PieceType::King => &self.queen,
        }
    }

    /// All eight line directions (rook and bishop).
    #[inline]
    pub fn lines(&self) -> &[Vector; 8] {
        &self.queen
    }

    #[inline]
    pub fn knight(&self) -> &[Vector; 8] {
        &self.knight
    }
}

impl Default for Vectors {
    fn default() -> Self {
        Self::standard()
    }
}
