//! Legal move generation.
//!
//! Destinations are produced per origin square. Pseudo-legal geometry is
//! filtered by two independent constraints: resolving a single check
//! (capture the attacker or block its ray) and staying on a pin line.
//! Kings are handled on their own path, and en passant captures are
//! verified by playing them on a scratch copy of the board.

mod attacks;
pub mod perft;

use crate::{BoardView, EngineError, PointSet, Rights};
use chess_core::{Move, Piece, PieceType, Point, Side, Vectors};

/// A list of moves with a fixed maximum capacity.
///
/// Chess positions have at most 218 legal moves, so a fixed-size array
/// avoids heap allocations during generation.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// Maximum number of legal moves in any chess position.
    pub const MAX_MOVES: usize = 256;

    /// Creates an empty move list.
    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::cut(Point::at(0, 0)); Self::MAX_MOVES],
            len: 0,
        }
    }

    /// Adds a move to the list.
    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        debug_assert!(index < self.len);
        &self.moves[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Outcome of a position from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// The side to move is mated; the winner is given.
    Checkmate(Side),
    Stalemate,
}

/// Legal move generator over an explicit direction table.
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    vectors: Vectors,
}

impl MoveGenerator {
    pub fn new(vectors: Vectors) -> Self {
        MoveGenerator { vectors }
    }

    #[inline]
    pub fn vectors(&self) -> &Vectors {
        &self.vectors
    }

    /// Exact set of points the piece on `origin` may legally move to.
    ///
    /// `origin` must hold a piece of `side`; anything else is a contract
    /// violation. More than two pieces checking one king is an invariant
    /// violation.
    pub fn legal_destinations<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
        origin: Point,
    ) -> Result<PointSet, EngineError> {
        let piece = board
            .piece_at(origin)
            .ok_or_else(|| EngineError::contract(format!("no piece on {}", origin)))?;
        if piece.side != side {
            return Err(EngineError::contract(format!(
                "{} on {} does not belong to {}",
                piece, origin, side
            )));
        }

        let attackers = self.king_attackers(board, side);
        if attackers.len() > 2 {
            return Err(EngineError::invariant(format!(
                "{} pieces attack the {} king\n{}",
                attackers.len(),
                side,
                board.snapshot().pretty()
            )));
        }
        if piece.is(PieceType::King) {
            return Ok(self.king_destinations(board, rights, side, origin));
        }

        let attacker = match attackers.len() {
            0 => None,
            1 => attackers.first(),
            _ => return Ok(PointSet::EMPTY),
        };
        let pinner = self.pinning_piece(board, side, origin);
        let king = board.king_point(side);

        let (mut destinations, en_passant) = self.pseudo_destinations(board, rights, piece, origin)?;
        if let Some(attacker) = attacker {
            destinations.retain(|to| to == attacker || to.is_between(king, attacker));
        }
        if let Some(pinner) = pinner {
            destinations.retain(|to| to == pinner || to.is_between(king, pinner));
        }

        if let Some(target) = en_passant {
            let mut scratch = board.snapshot();
            scratch.apply(Move::new(origin, target))?;
            if !self.is_in_check(&scratch, side) {
                destinations.insert(target);
            }
        }
        Ok(destinations)
    }

    /// All legal moves of `side`, promotions expanded to every piece type.
    pub fn legal_moves<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
    ) -> Result<MoveList, EngineError> {
        let mut moves = MoveList::new();
        for origin in board.occupied(side) {
            let promotes = matches!(
                board.piece_at(origin),
                Some(p) if p.is(PieceType::Pawn)
                    && origin.row() as i8 + side.pawn_direction() == side.promotion_row() as i8
            );
            for to in self.legal_destinations(board, rights, side, origin)? {
                if promotes {
                    for kind in PieceType::PROMOTIONS {
                        moves.push(Move::with_promotion(origin, to, kind));
                    }
                } else {
                    moves.push(Move::new(origin, to));
                }
            }
        }
        Ok(moves)
    }

    /// Returns true if `side` has at least one legal move.
    pub fn has_legal_moves<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
    ) -> Result<bool, EngineError> {
        for origin in board.occupied(side) {
            if !self.legal_destinations(board, rights, side, origin)?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Checks that `mv` is legal for the side to move, including the
    /// promotion piece being present exactly when a pawn reaches the last row.
    pub fn validate_move<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        mv: Move,
    ) -> Result<(), EngineError> {
        let side = board.side_to_move();
        let destinations = self.legal_destinations(board, rights, side, mv.from())?;
        if !destinations.contains(mv.to()) {
            return Err(EngineError::contract(format!("{} is not a legal move", mv)));
        }
        let promotes = matches!(board.piece_at(mv.from()), Some(p) if mv.reaches_promotion_row(p));
        match (promotes, mv.promotion()) {
            (true, None) => Err(EngineError::contract(format!(
                "{} needs a promotion piece",
                mv
            ))),
            (false, Some(_)) => Err(EngineError::contract(format!(
                "{} is not a promotion",
                mv
            ))),
            _ => Ok(()),
        }
    }

    /// Classifies the position for the side to move.
    pub fn status<B: BoardView>(&self, board: &B, rights: &Rights) -> Result<GameStatus, EngineError> {
        let side = board.side_to_move();
        if self.has_legal_moves(board, rights, side)? {
            Ok(GameStatus::Ongoing)
        } else if self.is_in_check(board, side) {
            Ok(GameStatus::Checkmate(side.opposite()))
        } else {
            Ok(GameStatus::Stalemate)
        }
    }

    /// Rejects arrangements that cannot arise in play: pawns on a back row,
    /// adjacent kings, or the side that just moved left in check.
    pub fn validate_arrangement<B: BoardView>(&self, board: &B, rights: &Rights) -> Result<(), EngineError> {
        for side in Side::ALL {
            for point in board.occupied(side) {
                if matches!(board.piece_at(point), Some(p) if p.is(PieceType::Pawn))
                    && (point.row() == 0 || point.row() == 7)
                {
                    return Err(EngineError::InvalidArrangement(format!(
                        "pawn on back row at {}",
                        point
                    )));
                }
            }
        }
        if board
            .king_point(Side::White)
            .is_bordered_with(board.king_point(Side::Black))
        {
            return Err(EngineError::InvalidArrangement("kings are adjacent".into()));
        }
        let to_move = board.side_to_move();
        let waiting = to_move.opposite();
        let threats = self.threat_count(board, rights, board.king_point(waiting), to_move);
        if threats > 0 {
            return Err(EngineError::InvalidArrangement(format!(
                "{} is in check while {} is to move",
                waiting, to_move
            )));
        }
        Ok(())
    }

    /// Geometry of the piece on `origin` ignoring checks and pins, plus the
    /// en passant destination if one is available.
    fn pseudo_destinations<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        piece: Piece,
        origin: Point,
    ) -> Result<(PointSet, Option<Point>), EngineError> {
        let mut destinations = PointSet::EMPTY;
        match piece.kind {
            PieceType::Pawn => return self.pawn_destinations(board, rights, piece, origin),
            PieceType::Knight => {
                for offset in self.vectors.knight() {
                    if let Some(to) = offset.step(origin) {
                        if board.piece_at(to).map_or(true, |p| p.side != piece.side) {
                            destinations.insert(to);
                        }
                    }
                }
            }
            PieceType::Bishop | PieceType::Rook | PieceType::Queen => {
                for &direction in self.vectors.for_piece(piece.kind) {
                    let mut cursor = origin;
                    while let Some(to) = direction.step(cursor) {
                        match board.piece_at(to) {
                            None => destinations.insert(to),
                            Some(other) => {
                                if other.side != piece.side {
                                    destinations.insert(to);
                                }
                                break;
                            }
                        }
                        cursor = to;
                    }
                }
            }
            PieceType::King => {
                return Err(EngineError::invariant("king routed through pseudo destinations"))
            }
        }
        Ok((destinations, None))
    }

    fn pawn_destinations<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        piece: Piece,
        origin: Point,
    ) -> Result<(PointSet, Option<Point>), EngineError> {
        let side = piece.side;
        let dir = side.pawn_direction();
        let mut destinations = PointSet::EMPTY;

        if let Some(one) = origin.offset(dir, 0).filter(|p| board.piece_at(*p).is_none()) {
            destinations.insert(one);
            if origin.row() == side.pawn_initial_row() {
                if let Some(two) = origin.offset(2 * dir, 0).filter(|p| board.piece_at(*p).is_none()) {
                    destinations.insert(two);
                }
            }
        }

        for d_col in [-1, 1] {
            if let Some(to) = origin.offset(dir, d_col) {
                if piece.is_enemy_for(board.piece_at(to)) {
                    destinations.insert(to);
                }
            }
        }

        let mut en_passant = None;
        if origin.row() == side.en_passant_row() {
            if let Some(col) = rights.en_passant_column(side) {
                if col.abs_diff(origin.col()) == 1 {
                    let target = Point::at((origin.row() as i8 + dir) as u8, col);
                    let passed = Point::at(origin.row(), col);
                    if board.piece_at(target).is_some() {
                        return Err(EngineError::invariant(format!(
                            "en passant target {} is occupied\n{}",
                            target,
                            board.snapshot().pretty()
                        )));
                    }
                    if board.piece_at(passed) != Some(Piece::new(side.opposite(), PieceType::Pawn)) {
                        return Err(EngineError::invariant(format!(
                            "no pawn to take en passant on {}\n{}",
                            passed,
                            board.snapshot().pretty()
                        )));
                    }
                    en_passant = Some(target);
                }
            }
        }

        Ok((destinations, en_passant))
    }

    fn king_destinations<B: BoardView>(&self, board: &B, rights: &Rights, side: Side, origin: Point) -> PointSet {
        let enemy = side.opposite();
        let enemy_king = board.king_point(enemy);
        let attacked = |point: Point| !self.scan_attackers(board, point, enemy, false, Some(origin)).is_empty();

        let mut destinations = PointSet::EMPTY;
        for offset in self.vectors.for_piece(PieceType::King) {
            let Some(to) = offset.step(origin) else {
                continue;
            };
            if matches!(board.piece_at(to), Some(p) if p.side == side) {
                continue;
            }
            if to.is_bordered_with(enemy_king) || attacked(to) {
                continue;
            }
            destinations.insert(to);
        }

        let home = Point::at(side.back_row(), 4);
        if origin != home || attacked(origin) {
            return destinations;
        }
        for short in [true, false] {
            if !rights.side(side).castling(short) {
                continue;
            }
            let (rook_col, step) = if short { (7u8, 1i8) } else { (0u8, -1i8) };
            let rook = Point::at(side.back_row(), rook_col);
            if board.piece_at(rook) != Some(Piece::new(side, PieceType::Rook)) {
                continue;
            }
            let clear = Point::all()
                .filter(|p| p.is_between(origin, rook))
                .all(|p| board.piece_at(p).is_none());
            if !clear {
                continue;
            }
            let (Some(transit), Some(landing)) = (origin.offset(0, step), origin.offset(0, 2 * step)) else {
                continue;
            };
            if attacked(transit) || attacked(landing) || landing.is_bordered_with(enemy_king) {
                continue;
            }
            destinations.insert(landing);
        }
        destinations
    }
}

impl Default for MoveGenerator {
    fn default() -> Self {
        MoveGenerator::new(Vectors::standard())
    }
}
