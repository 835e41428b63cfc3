//! Board representation: piece placement, position counter, king points.

use crate::{EngineError, PointSet};
use chess_core::{FenParser, Move, Piece, PieceType, Point, Side, BOARD_SIZE};
use std::fmt;

/// Read-only board capabilities.
pub trait BoardView {
    /// Returns the piece on `point`, if any.
    fn piece_at(&self, point: Point) -> Option<Piece>;

    /// Returns the point holding the king of `side`.
    fn king_point(&self, side: Side) -> Point;

    /// Half-move position counter. Even means White is to move.
    fn position(&self) -> u32;

    /// Returns an owned copy of the board.
    fn snapshot(&self) -> Board;

    /// Side whose turn it is.
    #[inline]
    fn side_to_move(&self) -> Side {
        Side::to_move_at(self.position())
    }

    /// Points holding pieces of `side`.
    fn occupied(&self, side: Side) -> PointSet {
        Point::all()
            .filter(|point| matches!(self.piece_at(*point), Some(piece) if piece.side == side))
            .collect()
    }
}

/// Board mutation capabilities.
pub trait MutableBoard: BoardView {
    /// Applies `mv` and returns the implied secondary move (the castling
    /// rook relocation or the en passant cut marker), if any.
    fn apply(&mut self, mv: Move) -> Result<Option<Move>, EngineError>;

    /// Reverts `mv`, given the values the matching `apply` produced and the
    /// piece `mv` captured on its destination.
    fn rollback(
        &mut self,
        mv: Move,
        secondary: Option<Move>,
        captured: Option<Piece>,
    ) -> Result<(), EngineError>;
}

/// An 8x8 grid of optional pieces.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Piece>; 64],
    position: u32,
    kings: [Point; 2],
}

impl Board {
    /// The standard starting arrangement at position 0.
    pub fn initial() -> Self {
        const BACK_ROW: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        let mut cells = [None; 64];
        for side in Side::ALL {
            let back = side.back_row() as usize;
            let pawns = side.pawn_initial_row() as usize;
            for (col, kind) in BACK_ROW.iter().enumerate() {
                cells[back * 8 + col] = Some(Piece::new(side, *kind));
                cells[pawns * 8 + col] = Some(Piece::new(side, PieceType::Pawn));
            }
        }
        Board {
            cells,
            position: 0,
            kings: [
                Point::at(Side::White.back_row(), 4),
                Point::at(Side::Black.back_row(), 4),
            ],
        }
    }

    /// Builds a board from an arrangement.
    ///
    /// Each side must have exactly one king and no point may be listed twice.
    pub fn from_pieces(
        pieces: impl IntoIterator<Item = (Point, Piece)>,
        position: u32,
    ) -> Result<Self, EngineError> {
        let mut cells = [None; 64];
        let mut kings: [Option<Point>; 2] = [None, None];
        for (point, piece) in pieces {
            if cells[point.index()].is_some() {
                return Err(EngineError::InvalidArrangement(format!(
                    "point {} is occupied twice",
                    point
                )));
            }
            if piece.is(PieceType::King) {
                let slot = &mut kings[piece.side.index()];
                if slot.is_some() {
                    return Err(EngineError::InvalidArrangement(format!(
                        "{} has more than one king",
                        piece.side
                    )));
                }
                *slot = Some(point);
            }
            cells[point.index()] = Some(piece);
        }
        let king = |side: Side| {
            kings[side.index()].ok_or_else(|| {
                EngineError::InvalidArrangement(format!("{} has no king", side))
            })
        };
        Ok(Board {
            cells,
            position,
            kings: [king(Side::White)?, king(Side::Black)?],
        })
    }

    /// Builds a board from the placement, side and move number of a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let parsed = FenParser::parse(fen)?;
        Self::from_parsed(&parsed)
    }

    pub(crate) fn from_parsed(parsed: &FenParser) -> Result<Self, EngineError> {
        Self::from_pieces(parsed.placement.iter().copied(), parsed.position())
    }

    #[inline]
    pub fn piece_at(&self, point: Point) -> Option<Piece> {
        self.cells[point.index()]
    }

    #[inline]
    pub fn king_point(&self, side: Side) -> Point {
        self.kings[side.index()]
    }

    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Iterates over the pieces of `side` with their points.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = (Point, Piece)> + '_ {
        Point::all().filter_map(move |point| match self.cells[point.index()] {
            Some(piece) if piece.side == side => Some((point, piece)),
            _ => None,
        })
    }

    /// Places `piece` on `point` and returns what stood there before.
    #[inline]
    pub(crate) fn put(&mut self, point: Point, piece: Option<Piece>) -> Option<Piece> {
        if let Some(p) = piece {
            if p.is(PieceType::King) {
                self.kings[p.side.index()] = point;
            }
        }
        std::mem::replace(&mut self.cells[point.index()], piece)
    }

    /// Removes the piece on `point`.
    #[inline]
    pub(crate) fn take(&mut self, point: Point) -> Option<Piece> {
        self.cells[point.index()].take()
    }

    #[inline]
    pub(crate) fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    /// Renders the placement field of a FEN string.
    pub fn to_fen_placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for row in (0..BOARD_SIZE).rev() {
            let mut empty = 0;
            for col in 0..BOARD_SIZE {
                match self.cells[(row * BOARD_SIZE + col) as usize] {
                    Some(piece) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if row > 0 {
                out.push('/');
            }
        }
        out
    }

    /// Multi-line diagram, rank 8 on top, with coordinates.
    pub fn pretty(&self) -> String {
        let mut out = String::with_capacity(200);
        for row in (0..BOARD_SIZE).rev() {
            out.push(char::from(b'1' + row));
            out.push(' ');
            for col in 0..BOARD_SIZE {
                let c = self.cells[(row * BOARD_SIZE + col) as usize]
                    .map(Piece::to_fen_char)
                    .unwrap_or('.');
                out.push(c);
                if col + 1 < BOARD_SIZE {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h\n");
        out
    }
}

impl BoardView for Board {
    #[inline]
    fn piece_at(&self, point: Point) -> Option<Piece> {
        Board::piece_at(self, point)
    }

    #[inline]
    fn king_point(&self, side: Side) -> Point {
        Board::king_point(self, side)
    }

    #[inline]
    fn position(&self) -> u32 {
        self.position
    }

    fn snapshot(&self) -> Board {
        self.clone()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board(position {})", self.position)?;
        write!(f, "{}", self.pretty())
    }
}
