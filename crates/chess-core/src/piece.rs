//! Chess piece representation.

use crate::Side;

/// The six types of chess pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Piece types a pawn may be promoted to, strongest first.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Returns the index of this piece type (0-5).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the lowercase letter used in FEN and move text.
    pub const fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// Parses a piece letter, ignoring case.
    pub const fn from_letter(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Material value in pawns; the king is priceless.
    pub const fn value(self) -> u16 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight | PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 9999,
        }
    }

    /// Returns true if this piece type is a sliding piece (bishop, rook, or queen).
    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    /// Returns true if a pawn may be promoted to this piece type.
    #[inline]
    pub const fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceType::Knight | PieceType::Bishop | PieceType::Rook | PieceType::Queen
        )
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PieceType::Pawn => "Pawn",
            PieceType::Knight => "Knight",
            PieceType::Bishop => "Bishop",
            PieceType::Rook => "Rook",
            PieceType::Queen => "Queen",
            PieceType::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// A piece standing on the board: a type owned by a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceType,
    pub side: Side,
}

impl Piece {
    #[inline]
    pub const fn new(side: Side, kind: PieceType) -> Self {
        Piece { kind, side }
    }

    /// Returns true if this piece has the given type.
    #[inline]
    pub fn is(self, kind: PieceType) -> bool {
        self.kind == kind
    }

    /// Returns true if `other` is a piece of the opposite side.
    #[inline]
    pub fn is_enemy_for(self, other: Option<Piece>) -> bool {
        matches!(other, Some(p) if p.side != self.side)
    }

    /// Returns the FEN character (uppercase for White).
    pub const fn to_fen_char(self) -> char {
        let c = self.kind.letter();
        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }

    /// Parses a FEN character into a piece.
    pub const fn from_fen_char(c: char) -> Option<Piece> {
        let side = if c.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        match PieceType::from_letter(c) {
            Some(kind) => Some(Piece { kind, side }),
            None => None,
        }
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.side, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_to_fen() {
        assert_eq!(Piece::new(Side::White, PieceType::Pawn).to_fen_char(), 'P');
        assert_eq!(Piece::new(Side::Black, PieceType::Pawn).to_fen_char(), 'p');
        assert_eq!(Piece::new(Side::White, PieceType::King).to_fen_char(), 'K');
        assert_eq!(Piece::new(Side::Black, PieceType::Knight).to_fen_char(), 'n');
    }

    #[test]
    fn piece_from_fen() {
        assert_eq!(
            Piece::from_fen_char('P'),
            Some(Piece::new(Side::White, PieceType::Pawn))
        );
        assert_eq!(
            Piece::from_fen_char('q'),
            Some(Piece::new(Side::Black, PieceType::Queen))
        );
        assert_eq!(Piece::from_fen_char('x'), None);
    }

    #[test]
    fn enemy_detection() {
        let white_rook = Piece::new(Side::White, PieceType::Rook);
        assert!(white_rook.is_enemy_for(Some(Piece::new(Side::Black, PieceType::Pawn))));
        assert!(!white_rook.is_enemy_for(Some(Piece::new(Side::White, PieceType::Pawn))));
        assert!(!white_rook.is_enemy_for(None));
    }

    #[test]
    fn is_slider() {
        assert!(!PieceType::Pawn.is_slider());
        assert!(!PieceType::Knight.is_slider());
        assert!(PieceType::Bishop.is_slider());
        assert!(PieceType::Rook.is_slider());
        assert!(PieceType::Queen.is_slider());
        assert!(!PieceType::King.is_slider());
    }

    #[test]
    fn promotion_targets() {
        assert!(!PieceType::Pawn.is_promotion_target());
        assert!(!PieceType::King.is_promotion_target());
        assert!(PieceType::PROMOTIONS
            .iter()
            .all(|kind| kind.is_promotion_target()));
    }
}
