//! Attacker scans: checks, pins and threat counts.
//!
//! Every query walks outward from the target square: the eight line
//! directions for sliders (with kings and pawns caught at distance one) and
//! the eight knight offsets.

use super::MoveGenerator;
use crate::{BoardView, PointSet, Rights};
use chess_core::{Piece, PieceType, Point, Side, Vector};

/// Returns true if `piece`, standing `distance` steps from a target along
/// `direction` (target towards piece), attacks that target.
fn attacks_along(piece: Piece, direction: Vector, distance: u8) -> bool {
    match piece.kind {
        PieceType::Bishop | PieceType::Rook | PieceType::Queen => direction.is_slid_by(piece.kind),
        PieceType::King => distance == 1,
        PieceType::Pawn => {
            distance == 1 && direction.is_diagonal() && direction.row == -piece.side.pawn_direction()
        }
        PieceType::Knight => false,
    }
}

impl MoveGenerator {
    /// Points holding pieces of `attacker_side` that attack `target`.
    pub fn attackers_of<B: BoardView>(&self, board: &B, target: Point, attacker_side: Side) -> PointSet {
        self.scan_attackers(board, target, attacker_side, false, None)
    }

    /// Enemy pieces giving check to the king of `side`.
    pub fn king_attackers<B: BoardView>(&self, board: &B, side: Side) -> PointSet {
        self.attackers_of(board, board.king_point(side), side.opposite())
    }

    /// Returns true if the king of `side` is attacked.
    pub fn is_in_check<B: BoardView>(&self, board: &B, side: Side) -> bool {
        !self.king_attackers(board, side).is_empty()
    }

    /// Counts how many pieces of `attacker_side` threaten `target`.
    ///
    /// Unlike [`MoveGenerator::attackers_of`] this also counts batteries
    /// (a slider lined up behind another attacker on the same ray) and a
    /// pawn that could take `target` en passant.
    pub fn threat_count<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        target: Point,
        attacker_side: Side,
    ) -> usize {
        let mut count = self.scan_attackers(board, target, attacker_side, true, None).len();

        let victim_side = attacker_side.opposite();
        let just_advanced = rights.side(victim_side).pawn_long_move_column == Some(target.col())
            && target.row() == attacker_side.en_passant_row()
            && matches!(board.piece_at(target), Some(p) if p.is(PieceType::Pawn) && p.side == victim_side);
        if just_advanced {
            for d_col in [-1, 1] {
                if let Some(neighbor) = target.offset(0, d_col) {
                    if board.piece_at(neighbor) == Some(Piece::new(attacker_side, PieceType::Pawn)) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Returns the enemy slider pinning the piece on `origin` to the king of
    /// `side`, if there is one.
    pub fn pinning_piece<B: BoardView>(&self, board: &B, side: Side, origin: Point) -> Option<Point> {
        let king = board.king_point(side);
        let direction = Vector::between(king, origin)?;

        let mut cursor = direction.step(king)?;
        while cursor != origin {
            if board.piece_at(cursor).is_some() {
                return None;
            }
            cursor = direction.step(cursor)?;
        }

        let mut cursor = direction.step(origin)?;
        loop {
            if let Some(piece) = board.piece_at(cursor) {
                return (piece.side != side && direction.is_slid_by(piece.kind)).then_some(cursor);
            }
            cursor = direction.step(cursor)?;
        }
    }

    /// Scans every ray and knight offset around `target` for attackers.
    ///
    /// With `battery`, the ray scan continues past a slider or pawn attacker
    /// to collect the sliders backing it up. `ignored` is treated as empty;
    /// king moves pass their own origin here so a slider is seen through it.
    pub(crate) fn scan_attackers<B: BoardView>(
        &self,
        board: &B,
        target: Point,
        attacker_side: Side,
        battery: bool,
        ignored: Option<Point>,
    ) -> PointSet {
        let mut found = PointSet::EMPTY;

        for &direction in self.vectors.lines() {
            let mut cursor = target;
            let mut distance = 0u8;
            while let Some(next) = direction.step(cursor) {
                cursor = next;
                distance += 1;
                if Some(cursor) == ignored {
                    continue;
                }
                let Some(piece) = board.piece_at(cursor) else {
                    continue;
                };
                if piece.side != attacker_side || !attacks_along(piece, direction, distance) {
                    break;
                }
                found.insert(cursor);
                if !battery || !(piece.kind.is_slider() || piece.is(PieceType::Pawn)) {
                    break;
                }
            }
        }

        for &offset in self.vectors.knight() {
            if let Some(point) = offset.step(target) {
                if Some(point) != ignored
                    && board.piece_at(point) == Some(Piece::new(attacker_side, PieceType::Knight))
                {
                    found.insert(point);
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Board;
    use chess_core::Vectors;

    fn p(s: &str) -> Point {
        Point::parse(s).unwrap()
    }

    fn generator() -> MoveGenerator {
        MoveGenerator::new(Vectors::standard())
    }

    #[test]
    fn no_check_at_start() {
        let board = Board::initial();
        let gen = generator();
        assert!(!gen.is_in_check(&board, Side::White));
        assert!(!gen.is_in_check(&board, Side::Black));
    }

    #[test]
    fn attackers_by_each_piece_type() {
        let gen = generator();
        let board = Board::from_fen("4k3/8/8/3p4/4K3/8/8/8 w - - 0 1").unwrap();
        assert_eq!(gen.king_attackers(&board, Side::White), PointSet::single(p("d5")));

        let board = Board::from_fen("4k3/8/3n4/8/4K3/8/8/8 w - - 0 1").unwrap();
        assert_eq!(gen.king_attackers(&board, Side::White), PointSet::single(p("d6")));

        let board = Board::from_fen("4k3/8/8/8/4K2r/8/8/8 w - - 0 1").unwrap();
        assert_eq!(gen.king_attackers(&board, Side::White), PointSet::single(p("h4")));

        let board = Board::from_fen("4k3/8/8/8/4K3/8/8/1b6 w - - 0 1").unwrap();
        assert_eq!(gen.king_attackers(&board, Side::White), PointSet::single(p("b1")));
    }

    #[test]
    fn pawn_attacks_only_forward() {
        let gen = generator();
        // a black pawn behind the white king does not attack it
        let board = Board::from_fen("4k3/8/8/8/4K3/3p4/8/8 w - - 0 1").unwrap();
        assert!(!gen.is_in_check(&board, Side::White));
    }

    #[test]
    fn blocked_slider_does_not_attack() {
        let gen = generator();
        let board = Board::from_fen("4r2k/8/8/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert!(!gen.is_in_check(&board, Side::White));
    }

    #[test]
    fn double_check_is_two_attackers() {
        let gen = generator();
        let board = Board::from_fen("4r2k/8/8/8/8/5n2/8/4K3 w - - 0 1").unwrap();
        let attackers = gen.king_attackers(&board, Side::White);
        assert_eq!(attackers.len(), 2);
        assert!(attackers.contains(p("e8")));
        assert!(attackers.contains(p("f3")));
    }

    #[test]
    fn pin_detection() {
        let gen = generator();
        let board = Board::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(gen.pinning_piece(&board, Side::White, p("e2")), Some(p("e8")));

        // a bishop cannot pin along a file
        let board = Board::from_fen("4b2k/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(gen.pinning_piece(&board, Side::White, p("e2")), None);

        // two pieces on the line: neither is pinned
        let board = Board::from_fen("4r2k/8/8/8/4P3/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(gen.pinning_piece(&board, Side::White, p("e2")), None);
        assert_eq!(gen.pinning_piece(&board, Side::White, p("e4")), None);
    }

    #[test]
    fn threat_count_with_battery() {
        let gen = generator();
        let rights = Rights::none();
        // rooks doubled on the d-file plus a knight, all aimed at d4
        let board = Board::from_fen("3r3k/3r4/8/8/3P4/8/2n5/K7 w - - 0 1").unwrap();
        assert_eq!(gen.attackers_of(&board, p("d4"), Side::Black).len(), 2);
        assert_eq!(gen.threat_count(&board, &rights, p("d4"), Side::Black), 3);
    }

    #[test]
    fn threat_count_includes_en_passant() {
        let gen = generator();
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let fen = chess_core::FenParser::parse("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let rights = Rights::from_fen(&fen);
        assert_eq!(gen.threat_count(&board, &rights, p("d5"), Side::White), 1);
        assert_eq!(gen.threat_count(&board, &Rights::none(), p("d5"), Side::White), 0);
    }
}
