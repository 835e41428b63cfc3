//! Applying and reverting moves, and the rights bookkeeping that goes with them.

use crate::{Board, EngineError, MutableBoard, Rights};
use chess_core::{Move, Piece, PieceType, Point};

/// Everything needed to revert a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub mv: Move,
    /// Castling rook relocation or en passant cut marker.
    pub secondary: Option<Move>,
    /// Piece that stood on the destination.
    pub captured: Option<Piece>,
    /// Rights before the move.
    pub previous_rights: Rights,
}

impl AppliedMove {
    /// Returns the pawn removed en passant, if this move was an en passant capture.
    pub fn en_passant_square(&self) -> Option<Point> {
        self.secondary.filter(|m| m.is_cut()).map(Move::from)
    }
}

/// Rook relocation implied by a castling king move.
fn castling_rook_move(mv: Move, king: Piece) -> Move {
    let row = mv.from().row();
    if mv.is_short_castling(king) {
        Move::new(Point::at(row, 7), Point::at(row, mv.to().col() - 1))
    } else {
        Move::new(Point::at(row, 0), Point::at(row, mv.to().col() + 1))
    }
}

impl Board {
    /// Moves a piece, handling the rook of castling, the captured pawn of en
    /// passant and promotion. Returns the implied secondary move, if any.
    ///
    /// All checks happen before the board is touched, so an error leaves the
    /// board unchanged.
    pub fn apply(&mut self, mv: Move) -> Result<Option<Move>, EngineError> {
        let from = mv.from();
        let to = mv.to();
        if mv.is_cut() {
            return Err(EngineError::contract(format!("{} is not a move", mv)));
        }
        let piece = self
            .piece_at(from)
            .ok_or_else(|| EngineError::contract(format!("no piece on {} for {}", from, mv)))?;
        if let Some(target) = self.piece_at(to) {
            if target.side == piece.side || target.is(PieceType::King) {
                return Err(EngineError::contract(format!(
                    "{} cannot capture the {} on {}",
                    mv, target, to
                )));
            }
        }

        let placed = if mv.reaches_promotion_row(piece) {
            let kind = mv.promotion().ok_or_else(|| {
                EngineError::contract(format!("{} reaches the last row without a promotion piece", mv))
            })?;
            Piece::new(piece.side, kind)
        } else if mv.promotion().is_some() {
            return Err(EngineError::contract(format!(
                "{} carries a promotion piece but is not a promotion",
                mv
            )));
        } else {
            piece
        };

        let secondary = if mv.is_castling(piece) {
            let rook_move = castling_rook_move(mv, piece);
            match self.piece_at(rook_move.from()) {
                Some(rook) if rook.is(PieceType::Rook) && rook.side == piece.side => {}
                _ => {
                    return Err(EngineError::invariant(format!(
                        "castling {} without a rook on {}\n{}",
                        mv,
                        rook_move.from(),
                        self.pretty()
                    )))
                }
            }
            if self.piece_at(to).is_some() || self.piece_at(rook_move.to()).is_some() {
                return Err(EngineError::invariant(format!(
                    "castling {} through occupied squares\n{}",
                    mv,
                    self.pretty()
                )));
            }
            Some(rook_move)
        } else if mv.is_pawn_diagonal(piece) && self.piece_at(to).is_none() {
            let captured = Point::at(from.row(), to.col());
            match self.piece_at(captured) {
                Some(pawn) if pawn.is(PieceType::Pawn) && pawn.side != piece.side => {}
                _ => {
                    return Err(EngineError::invariant(format!(
                        "en passant {} without a pawn on {}\n{}",
                        mv,
                        captured,
                        self.pretty()
                    )))
                }
            }
            Some(Move::cut(captured))
        } else {
            None
        };

        match secondary {
            Some(cut) if cut.is_cut() => {
                self.take(cut.from());
            }
            Some(rook_move) => {
                let rook = self.take(rook_move.from());
                self.put(rook_move.to(), rook);
            }
            None => {}
        }
        self.take(from);
        self.put(to, Some(placed));
        self.set_position(self.position() + 1);
        Ok(secondary)
    }

    /// Exact inverse of [`Board::apply`].
    ///
    /// `secondary` must be what `apply` returned and `captured` the piece
    /// that stood on the destination before the move.
    pub fn rollback(
        &mut self,
        mv: Move,
        secondary: Option<Move>,
        captured: Option<Piece>,
    ) -> Result<(), EngineError> {
        let from = mv.from();
        let to = mv.to();
        let moved = self.piece_at(to).ok_or_else(|| {
            EngineError::invariant(format!("rollback of {}: {} is empty\n{}", mv, to, self.pretty()))
        })?;
        if self.piece_at(from).is_some() {
            return Err(EngineError::invariant(format!(
                "rollback of {}: {} is occupied\n{}",
                mv,
                from,
                self.pretty()
            )));
        }
        if self.position() == 0 {
            return Err(EngineError::invariant(format!(
                "rollback of {} below position 0",
                mv
            )));
        }
        if let Some(rook_move) = secondary.filter(|m| !m.is_cut()) {
            if self.piece_at(rook_move.to()).is_none() {
                return Err(EngineError::invariant(format!(
                    "rollback of {}: no rook on {}",
                    mv,
                    rook_move.to()
                )));
            }
        }

        let original = if mv.promotion().is_some() {
            Piece::new(moved.side, PieceType::Pawn)
        } else {
            moved
        };
        self.take(to);
        self.put(from, Some(original));
        self.put(to, captured);
        match secondary {
            Some(cut) if cut.is_cut() => {
                self.put(
                    cut.from(),
                    Some(Piece::new(moved.side.opposite(), PieceType::Pawn)),
                );
            }
            Some(rook_move) => {
                let rook = self.take(rook_move.to());
                self.put(rook_move.from(), rook);
            }
            None => {}
        }
        self.set_position(self.position() - 1);
        Ok(())
    }
}

impl MutableBoard for Board {
    #[inline]
    fn apply(&mut self, mv: Move) -> Result<Option<Move>, EngineError> {
        Board::apply(self, mv)
    }

    #[inline]
    fn rollback(
        &mut self,
        mv: Move,
        secondary: Option<Move>,
        captured: Option<Piece>,
    ) -> Result<(), EngineError> {
        Board::rollback(self, mv, secondary, captured)
    }
}

/// Updates `rights` after `piece` made `mv`, capturing `captured`.
///
/// The mover loses its own en passant marker, a king move drops both
/// castling rights, a rook leaving (or captured on) its home corner drops
/// that wing, and a two-square pawn advance records its column.
pub fn update_rights(rights: &mut Rights, piece: Piece, mv: Move, captured: Option<Piece>) {
    let side = piece.side;
    let own = rights.side_mut(side);
    own.pawn_long_move_column = None;
    match piece.kind {
        PieceType::King => {
            own.short_castling = false;
            own.long_castling = false;
        }
        PieceType::Rook if mv.from().row() == side.back_row() => match mv.from().col() {
            7 => own.short_castling = false,
            0 => own.long_castling = false,
            _ => {}
        },
        PieceType::Pawn if mv.is_long_pawn_move(piece) => {
            own.pawn_long_move_column = Some(mv.from().col());
        }
        _ => {}
    }

    if let Some(victim) = captured.filter(|p| p.is(PieceType::Rook)) {
        if mv.to().row() == victim.side.back_row() {
            let theirs = rights.side_mut(victim.side);
            match mv.to().col() {
                7 => theirs.short_castling = false,
                0 => theirs.long_castling = false,
                _ => {}
            }
        }
    }
}

/// Applies `mv` to the board and maintains `rights` alongside it.
pub fn apply_move<B: MutableBoard>(
    board: &mut B,
    rights: &mut Rights,
    mv: Move,
) -> Result<AppliedMove, EngineError> {
    let piece = board
        .piece_at(mv.from())
        .ok_or_else(|| EngineError::contract(format!("no piece on {} for {}", mv.from(), mv)))?;
    let captured = board.piece_at(mv.to());
    let secondary = board.apply(mv)?;
    let previous_rights = *rights;
    update_rights(rights, piece, mv, captured);
    Ok(AppliedMove {
        mv,
        secondary,
        captured,
        previous_rights,
    })
}

/// Reverts a move made by [`apply_move`], restoring board and rights.
pub fn undo_move<B: MutableBoard>(
    board: &mut B,
    rights: &mut Rights,
    applied: &AppliedMove,
) -> Result<(), EngineError> {
    board.rollback(applied.mv, applied.secondary, applied.captured)?;
    *rights = applied.previous_rights;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SideRights;
    use chess_core::Side;

    fn p(s: &str) -> Point {
        Point::parse(s).unwrap()
    }

    fn mv(s: &str) -> Move {
        Move::parse(s).unwrap()
    }

    #[test]
    fn simple_move_and_rollback() {
        let mut board = Board::initial();
        let before = board.clone();
        assert_eq!(board.apply(mv("e2-e4")).unwrap(), None);
        assert_eq!(board.position(), 1);
        assert_eq!(board.piece_at(p("e2")), None);
        assert_eq!(
            board.piece_at(p("e4")),
            Some(Piece::new(Side::White, PieceType::Pawn))
        );
        board.rollback(mv("e2-e4"), None, None).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn castling_moves_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = board.clone();

        let secondary = board.apply(mv("e1-g1")).unwrap();
        assert_eq!(secondary, Some(mv("h1-f1")));
        assert_eq!(board.king_point(Side::White), p("g1"));
        assert_eq!(
            board.piece_at(p("f1")),
            Some(Piece::new(Side::White, PieceType::Rook))
        );
        board.rollback(mv("e1-g1"), secondary, None).unwrap();
        assert_eq!(board, before);

        let secondary = board.apply(mv("e1-c1")).unwrap();
        assert_eq!(secondary, Some(mv("a1-d1")));
        assert_eq!(board.king_point(Side::White), p("c1"));
        board.rollback(mv("e1-c1"), secondary, None).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn en_passant_removes_passed_pawn() {
        let mut board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let before = board.clone();
        let secondary = board.apply(mv("e5-d6")).unwrap();
        assert_eq!(secondary, Some(Move::cut(p("d5"))));
        assert_eq!(board.piece_at(p("d5")), None);
        assert_eq!(
            board.piece_at(p("d6")),
            Some(Piece::new(Side::White, PieceType::Pawn))
        );
        board.rollback(mv("e5-d6"), secondary, None).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn promotion_requires_piece() {
        let mut board = Board::from_fen("8/P3k3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let before = board.clone();
        assert!(matches!(
            board.apply(mv("a7-a8")),
            Err(EngineError::ContractViolation(_))
        ));
        assert_eq!(board, before);

        let promotion = mv("a7-a8=N");
        board.apply(promotion).unwrap();
        assert_eq!(
            board.piece_at(p("a8")),
            Some(Piece::new(Side::White, PieceType::Knight))
        );
        board.rollback(promotion, None, None).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn promotion_flag_on_plain_move_is_rejected() {
        let mut board = Board::initial();
        assert!(matches!(
            board.apply(mv("e2-e4=Q")),
            Err(EngineError::ContractViolation(_))
        ));
    }

    #[test]
    fn capture_rollback_restores_victim() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
                .unwrap();
        let before = board.clone();
        let captured = board.piece_at(p("d5"));
        board.apply(mv("e4-d5")).unwrap();
        board.rollback(mv("e4-d5"), None, captured).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn empty_origin_is_contract_violation() {
        let mut board = Board::initial();
        assert!(matches!(
            board.apply(mv("e4-e5")),
            Err(EngineError::ContractViolation(_))
        ));
        assert!(matches!(
            board.apply(mv("e1-e2")),
            Err(EngineError::ContractViolation(_))
        ));
    }

    #[test]
    fn rights_after_king_and_rook_moves() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut rights = Rights::initial();

        apply_move(&mut board, &mut rights, mv("h1-h2")).unwrap();
        assert!(!rights.side(Side::White).short_castling);
        assert!(rights.side(Side::White).long_castling);

        apply_move(&mut board, &mut rights, mv("e8-d8")).unwrap();
        assert_eq!(*rights.side(Side::Black), SideRights::NONE);
    }

    #[test]
    fn rights_after_long_pawn_move() {
        let mut board = Board::initial();
        let mut rights = Rights::initial();
        apply_move(&mut board, &mut rights, mv("e2-e4")).unwrap();
        assert_eq!(rights.side(Side::White).pawn_long_move_column, Some(4));
        assert_eq!(rights.en_passant_column(Side::Black), Some(4));

        apply_move(&mut board, &mut rights, mv("g8-f6")).unwrap();
        apply_move(&mut board, &mut rights, mv("g1-f3")).unwrap();
        assert_eq!(rights.side(Side::White).pawn_long_move_column, None);
    }

    #[test]
    fn capturing_home_rook_drops_opponent_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut rights = Rights::initial();
        apply_move(&mut board, &mut rights, mv("a1-a8")).unwrap();
        assert!(!rights.side(Side::White).long_castling);
        assert!(!rights.side(Side::Black).long_castling);
        assert!(rights.side(Side::Black).short_castling);
    }

    #[test]
    fn undo_restores_rights() {
        let mut board = Board::initial();
        let mut rights = Rights::initial();
        let board_before = board.clone();
        let applied = apply_move(&mut board, &mut rights, mv("e2-e4")).unwrap();
        undo_move(&mut board, &mut rights, &applied).unwrap();
        assert_eq!(board, board_before);
        assert_eq!(rights, Rights::initial());
    }
}
