//! Player side representation.

/// Represents the two sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    White = 0,
    Black = 1,
}

impl Side {
    /// Both sides, white first.
    pub const ALL: [Side; 2] = [Side::White, Side::Black];

    /// Returns the side whose turn it is at the given half-move position.
    ///
    /// Even positions belong to White, odd positions to Black.
    #[inline]
    pub const fn to_move_at(position: u32) -> Self {
        if position % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Returns the index (0 for White, 1 for Black).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the row offset of a pawn advance (+1 for White, -1 for Black).
    #[inline]
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// Returns the back row for this side (0 for White, 7 for Black).
    #[inline]
    pub const fn back_row(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }

    /// Returns the row pawns of this side start from.
    #[inline]
    pub const fn pawn_initial_row(self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 6,
        }
    }

    /// Returns the row a pawn of this side must stand on to capture en passant.
    #[inline]
    pub const fn en_passant_row(self) -> u8 {
        match self {
            Side::White => 4,
            Side::Black => 3,
        }
    }

    /// Returns the row on which pawns of this side are promoted.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        self.opposite().back_row()
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}
