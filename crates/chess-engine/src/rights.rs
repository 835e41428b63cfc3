//! Per-side game rights: castling availability and en passant eligibility.

use chess_core::{FenParser, Side};

/// Rights held by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideRights {
    /// Castling towards the rook on column 7 is still possible.
    pub short_castling: bool,
    /// Castling towards the rook on column 0 is still possible.
    pub long_castling: bool,
    /// Column of this side's last two-square pawn advance, valid for the
    /// opponent's very next move only.
    pub pawn_long_move_column: Option<u8>,
}

impl SideRights {
    /// Rights at the start of a game.
    pub const INITIAL: SideRights = SideRights {
        short_castling: true,
        long_castling: true,
        pawn_long_move_column: None,
    };

    /// No castling and no en passant eligibility.
    pub const NONE: SideRights = SideRights {
        short_castling: false,
        long_castling: false,
        pawn_long_move_column: None,
    };

    /// Returns the castling flag for the given wing.
    #[inline]
    pub const fn castling(self, short: bool) -> bool {
        if short {
            self.short_castling
        } else {
            self.long_castling
        }
    }
}

/// Rights for both sides, indexed by [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rights([SideRights; 2]);

impl Rights {
    #[inline]
    pub const fn initial() -> Self {
        Rights([SideRights::INITIAL; 2])
    }

    #[inline]
    pub const fn none() -> Self {
        Rights([SideRights::NONE; 2])
    }

    #[inline]
    pub const fn new(white: SideRights, black: SideRights) -> Self {
        Rights([white, black])
    }

    /// Builds rights from parsed FEN.
    ///
    /// The en passant target is recorded as the long-move column of the side
    /// that just moved, i.e. the opponent of the side to move.
    pub fn from_fen(fen: &FenParser) -> Self {
        let mut rights = Rights::none();
        for side in Side::ALL {
            let entry = rights.side_mut(side);
            entry.short_castling = fen.castling.short[side.index()];
            entry.long_castling = fen.castling.long[side.index()];
        }
        if let Some(target) = fen.en_passant {
            rights.side_mut(fen.side_to_move.opposite()).pawn_long_move_column = Some(target.col());
        }
        rights
    }

    #[inline]
    pub fn side(&self, side: Side) -> &SideRights {
        &self.0[side.index()]
    }

    #[inline]
    pub fn side_mut(&mut self, side: Side) -> &mut SideRights {
        &mut self.0[side.index()]
    }

    /// Column on which `side` may capture en passant this move, if any.
    #[inline]
    pub fn en_passant_column(&self, side: Side) -> Option<u8> {
        self.side(side.opposite()).pawn_long_move_column
    }

    /// Drops both castling rights of `side`.
    #[inline]
    pub fn disable_castling(&mut self, side: Side) {
        let entry = self.side_mut(side);
        entry.short_castling = false;
        entry.long_castling = false;
    }

    /// Renders the castling field in FEN form.
    pub fn castling_fen(&self) -> String {
        let mut out = String::new();
        for (side, short, c) in [
            (Side::White, true, 'K'),
            (Side::White, false, 'Q'),
            (Side::Black, true, 'k'),
            (Side::Black, false, 'q'),
        ] {
            if self.side(side).castling(short) {
                out.push(c);
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }
}

impl Default for Rights {
    fn default() -> Self {
        Rights::initial()
    }
}
