//! Board coordinates.

use std::fmt;
use thiserror::Error;

/// Number of rows and columns on the board.
pub const BOARD_SIZE: u8 = 8;

/// Errors produced when building or parsing a [`Point`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointError {
    #[error("point ({row}, {col}) is outside the board")]
    OutOfBoard { row: i16, col: i16 },

    #[error("malformed point: '{0}'")]
    Malformed(String),
}

/// A square on the board, identified by row and column.
///
/// Row 0 is the first rank (White's back row) and column 0 is the a-file.
/// The compact encoding `row << 3 | col` fits in 6 bits and is used as an
/// array index throughout the engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point(u8);

impl Point {
    /// Total number of points on the board.
    pub const COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

    /// Creates a point, failing when either coordinate is out of range.
    pub fn new(row: u8, col: u8) -> Result<Self, PointError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(PointError::OutOfBoard {
                row: row as i16,
                col: col as i16,
            });
        }
        Ok(Point((row << 3) | col))
    }

    /// Creates a point from its compact index (0-63).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Point(index))
        } else {
            None
        }
    }

    /// Creates a point from coordinates known to be in range.
    ///
    /// Each coordinate is masked to its low three bits.
    #[inline]
    pub const fn at(row: u8, col: u8) -> Self {
        Point(((row & 7) << 3) | (col & 7))
    }

    /// Returns the compact index (0-63).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.0 & 7
    }

    /// Returns the point shifted by the given offsets, or `None` off the board.
    #[inline]
    pub const fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = self.row() as i8 + d_row;
        let col = self.col() as i8 + d_col;
        if row < 0 || row >= BOARD_SIZE as i8 || col < 0 || col >= BOARD_SIZE as i8 {
            None
        } else {
            Some(Point::at(row as u8, col as u8))
        }
    }

    /// Iterates over all 64 points in index order.
    pub fn all() -> impl Iterator<Item = Point> {
        (0..Self::COUNT as u8).map(Point)
    }

    /// Parses algebraic notation such as `e4`.
    pub fn parse(s: &str) -> Result<Self, PointError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(PointError::Malformed(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(PointError::Malformed(s.to_string()));
        }
        Point::new(rank - b'1', file - b'a')
    }

    /// Returns true if both points lie on one row, column, or diagonal.
    pub fn has_common_vector_with(self, other: Point) -> bool {
        if self == other {
            return false;
        }
        let dr = self.row().abs_diff(other.row());
        let dc = self.col().abs_diff(other.col());
        dr == 0 || dc == 0 || dr == dc
    }

    /// Returns true if the points are adjacent (including diagonally).
    pub fn is_bordered_with(self, other: Point) -> bool {
        self != other
            && self.row().abs_diff(other.row()) <= 1
            && self.col().abs_diff(other.col()) <= 1
    }

    /// Returns true if `self` lies strictly between `a` and `b` on a shared
    /// row, column, or diagonal.
    pub fn is_between(self, a: Point, b: Point) -> bool {
        if !a.has_common_vector_with(b) || !a.has_common_vector_with(self) {
            return false;
        }
        let (ar, ac) = (a.row() as i8, a.col() as i8);
        let (br, bc) = (b.row() as i8, b.col() as i8);
        let (sr, sc) = (self.row() as i8, self.col() as i8);
        // collinear via cross product, then strictly inside the bounding box
        if (br - ar) * (sc - ac) != (bc - ac) * (sr - ar) {
            return false;
        }
        let inside = |v: i8, lo: i8, hi: i8| v > lo.min(hi) && v < lo.max(hi);
        let row_ok = if ar == br { sr == ar } else { inside(sr, ar, br) };
        let col_ok = if ac == bc { sc == ac } else { inside(sc, ac, bc) };
        row_ok && col_ok
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.col()) as char,
            (b'1' + self.row()) as char
        )
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(s: &str) -> Point {
        Point::parse(s).unwrap()
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(Point::new(7, 7).is_ok());
        assert_eq!(
            Point::new(8, 0),
            Err(PointError::OutOfBoard { row: 8, col: 0 })
        );
        assert!(Point::new(0, 8).is_err());
    }

    #[test]
    fn parse_and_display() {
        let e4 = p("e4");
        assert_eq!(e4.row(), 3);
        assert_eq!(e4.col(), 4);
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(p("a1").index(), 0);
        assert_eq!(p("h8").index(), 63);
        assert!(Point::parse("i1").is_err());
        assert!(Point::parse("a9").is_err());
        assert!(Point::parse("e").is_err());
    }

    #[test]
    fn offset_stays_on_board() {
        assert_eq!(p("e4").offset(1, 1), Some(p("f5")));
        assert_eq!(p("a1").offset(-1, 0), None);
        assert_eq!(p("h8").offset(0, 1), None);
        assert_eq!(p("b1").offset(2, -1), Some(p("a3")));
    }

    #[test]
    fn common_vector() {
        assert!(p("a1").has_common_vector_with(p("h8")));
        assert!(p("e1").has_common_vector_with(p("e8")));
        assert!(p("a4").has_common_vector_with(p("h4")));
        assert!(!p("a1").has_common_vector_with(p("b3")));
        assert!(!p("a1").has_common_vector_with(p("a1")));
    }

    #[test]
    fn bordered() {
        assert!(p("e4").is_bordered_with(p("d5")));
        assert!(p("e4").is_bordered_with(p("e5")));
        assert!(!p("e4").is_bordered_with(p("e6")));
        assert!(!p("e4").is_bordered_with(p("e4")));
    }

    #[test]
    fn between() {
        assert!(p("e4").is_between(p("e1"), p("e8")));
        assert!(p("d4").is_between(p("a1"), p("h8")));
        assert!(p("c6").is_between(p("e4"), p("a8")));
        assert!(!p("e1").is_between(p("e1"), p("e8")));
        assert!(!p("e8").is_between(p("e1"), p("e8")));
        assert!(!p("d5").is_between(p("e1"), p("e8")));
        assert!(!p("b3").is_between(p("a1"), p("c4")));
    }

    proptest! {
        #[test]
        fn compact_encoding_round_trips(row in 0u8..8, col in 0u8..8) {
            let point = Point::new(row, col).unwrap();
            prop_assert_eq!(point.row(), row);
            prop_assert_eq!(point.col(), col);
            prop_assert_eq!(Point::from_index(point.index() as u8), Some(point));
            prop_assert_eq!(Point::parse(&point.to_string()), Ok(point));
        }

        #[test]
        fn between_is_symmetric(a in 0u8..64, b in 0u8..64, s in 0u8..64) {
            let (a, b, s) = (Point(a), Point(b), Point(s));
            prop_assert_eq!(s.is_between(a, b), s.is_between(b, a));
        }
    }
}
