//! The search engine's private board with its rollback stack.

use super::SearchTree;
use crate::{apply_move, undo_move, AppliedMove, Board, BoardView, EngineError, Rights};
use chess_core::{Move, Piece, Point, Side};

/// One applied step on the path from the root to the current node.
#[derive(Debug, Clone, Copy)]
struct Rollback {
    node: usize,
    applied: AppliedMove,
}

/// Owns a board copy and walks it between tree nodes by applying and
/// rolling back moves, never copying the board per node.
///
/// The stack always mirrors the root-to-current path: entry `i` is the
/// node at ply `i + 1`.
#[derive(Debug)]
pub struct BoardHolder {
    board: Board,
    rights: Rights,
    root_position: u32,
    stack: Vec<Rollback>,
    path: Vec<usize>,
    transitions: TransitionStats,
}

/// How the holder reached each visited node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// One rollback plus one apply between siblings.
    pub sibling: u64,
    /// Rollback to a deeper common ancestor, then apply forward.
    pub ancestor: u64,
    /// Full rollback to the root, then apply forward.
    pub root: u64,
    pub applied: u64,
    pub rolled_back: u64,
}

impl BoardHolder {
    pub fn new(board: Board, rights: Rights) -> Self {
        let root_position = board.position();
        BoardHolder {
            board,
            rights,
            root_position,
            stack: Vec::with_capacity(16),
            path: Vec::with_capacity(16),
            transitions: TransitionStats::default(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn rights(&self) -> &Rights {
        &self.rights
    }

    #[inline]
    pub fn root_position(&self) -> u32 {
        self.root_position
    }

    /// Node the board currently represents.
    #[inline]
    pub fn current_node(&self) -> usize {
        self.stack.last().map_or(SearchTree::ROOT, |r| r.node)
    }

    #[inline]
    pub fn transitions(&self) -> TransitionStats {
        self.transitions
    }

    /// Moves on the path from the root to the current node.
    pub fn line(&self) -> Vec<Move> {
        self.stack.iter().map(|r| r.applied.mv).collect()
    }

    /// Brings the board to the position of `target`.
    ///
    /// Pops the stack down to the nearest common ancestor of the current
    /// node and `target`, then applies the remaining moves forward. The
    /// board position and the stack top are checked against the target
    /// afterwards.
    pub fn actualize(&mut self, tree: &SearchTree, target: usize) -> Result<(), EngineError> {
        let current = self.current_node();
        if current != target {
            let mut path = std::mem::take(&mut self.path);
            tree.path_into(target, &mut path);
            debug_assert_eq!(path.len() as u32, tree.node(target).ply);

            let common = self
                .stack
                .iter()
                .zip(&path)
                .take_while(|(entry, node)| entry.node == **node)
                .count();
            if tree.are_siblings(current, target) {
                self.transitions.sibling += 1;
            } else if common == 0 {
                self.transitions.root += 1;
            } else {
                self.transitions.ancestor += 1;
            }

            let result = self.walk(tree, &path, common);
            self.path = path;
            result?;
        }
        self.check(tree, target)
    }

    /// Rolls every applied move back, returning the board to the root.
    pub fn rollback_to_root(&mut self) -> Result<(), EngineError> {
        while !self.stack.is_empty() {
            self.pop()?;
        }
        if self.board.position() != self.root_position {
            return Err(EngineError::invariant(format!(
                "board at position {} after rolling back to root position {}",
                self.board.position(),
                self.root_position
            )));
        }
        Ok(())
    }

    fn walk(&mut self, tree: &SearchTree, path: &[usize], common: usize) -> Result<(), EngineError> {
        while self.stack.len() > common {
            self.pop()?;
        }
        for &node in &path[common..] {
            let mv = tree.node(node).previous_move.ok_or_else(|| {
                EngineError::invariant(format!("node {} below the root has no move", node))
            })?;
            let applied = apply_move(&mut self.board, &mut self.rights, mv)?;
            self.stack.push(Rollback { node, applied });
            self.transitions.applied += 1;
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<(), EngineError> {
        if let Some(entry) = self.stack.pop() {
            undo_move(&mut self.board, &mut self.rights, &entry.applied)?;
            self.transitions.rolled_back += 1;
        }
        Ok(())
    }

    fn check(&self, tree: &SearchTree, target: usize) -> Result<(), EngineError> {
        let expected = self.root_position + tree.node(target).ply;
        if self.board.position() != expected {
            return Err(EngineError::invariant(format!(
                "board at position {} while visiting node {} at position {}\n{}",
                self.board.position(),
                target,
                expected,
                self.board.pretty()
            )));
        }
        if self.current_node() != target {
            return Err(EngineError::invariant(format!(
                "rollback stack ends at node {} while visiting node {}",
                self.current_node(),
                target
            )));
        }
        Ok(())
    }
}

impl BoardView for BoardHolder {
    #[inline]
    fn piece_at(&self, point: Point) -> Option<Piece> {
        self.board.piece_at(point)
    }

    #[inline]
    fn king_point(&self, side: Side) -> Point {
        self.board.king_point(side)
    }

    #[inline]
    fn position(&self) -> u32 {
        self.board.position()
    }

    fn snapshot(&self) -> Board {
        self.board.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameState;

    fn mv(s: &str) -> Move {
        Move::parse(s).unwrap()
    }

    fn sample_tree() -> SearchTree {
        let mut tree = SearchTree::new();
        // 1, 2
        tree.expand(SearchTree::ROOT, &[mv("e2-e4"), mv("d2-d4")]);
        // 3, 4 under e2-e4
        tree.expand(1, &[mv("e7-e5"), mv("d7-d5")]);
        // 5 under d2-d4
        tree.expand(2, &[mv("d7-d5")]);
        // 6 under e2-e4 e7-e5
        tree.expand(3, &[mv("g1-f3")]);
        tree
    }

    #[test]
    fn actualize_walks_between_nodes() {
        let tree = sample_tree();
        let state = GameState::initial();
        let mut holder = BoardHolder::new(state.board.clone(), state.rights);

        holder.actualize(&tree, 6).unwrap();
        assert_eq!(holder.position(), 3);
        assert_eq!(holder.line(), vec![mv("e2-e4"), mv("e7-e5"), mv("g1-f3")]);

        // common ancestor is node 1
        holder.actualize(&tree, 4).unwrap();
        assert_eq!(holder.line(), vec![mv("e2-e4"), mv("d7-d5")]);
        assert_eq!(holder.transitions().ancestor, 1);

        // sibling of node 4
        holder.actualize(&tree, 3).unwrap();
        assert_eq!(holder.transitions().sibling, 1);

        // different top-level branch
        holder.actualize(&tree, 5).unwrap();
        assert_eq!(holder.line(), vec![mv("d2-d4"), mv("d7-d5")]);
        assert_eq!(holder.transitions().root, 2);

        holder.rollback_to_root().unwrap();
        assert_eq!(holder.board(), &state.board);
        assert_eq!(holder.rights(), &state.rights);
        assert_eq!(holder.current_node(), SearchTree::ROOT);
    }

    #[test]
    fn actualize_same_node_is_noop() {
        let tree = sample_tree();
        let state = GameState::initial();
        let mut holder = BoardHolder::new(state.board, state.rights);
        holder.actualize(&tree, 1).unwrap();
        let applied = holder.transitions().applied;
        holder.actualize(&tree, 1).unwrap();
        assert_eq!(holder.transitions().applied, applied);
    }

    #[test]
    fn position_drift_is_invariant_violation() {
        let tree = sample_tree();
        let state = GameState::initial();
        let mut holder = BoardHolder::new(state.board, state.rights);
        holder.actualize(&tree, 1).unwrap();

        holder.root_position += 1;
        assert!(matches!(
            holder.actualize(&tree, 1),
            Err(EngineError::InvariantViolation(_))
        ));
    }

    #[test]
    fn stack_not_ending_at_target_is_invariant_violation() {
        let tree = sample_tree();
        let state = GameState::initial();
        let mut holder = BoardHolder::new(state.board, state.rights);
        holder.actualize(&tree, 3).unwrap();

        // relabel the top entry so it no longer names the visited node
        if let Some(top) = holder.stack.last_mut() {
            top.node = 4;
        }
        assert!(matches!(
            holder.check(&tree, 3),
            Err(EngineError::InvariantViolation(_))
        ));
    }

    #[test]
    fn unappliable_move_surfaces_error() {
        let mut tree = SearchTree::new();
        tree.expand(SearchTree::ROOT, &[mv("e2-e4")]);
        // e2 is empty by the time the third move is applied
        tree.expand(1, &[mv("e7-e5")]);
        tree.expand(2, &[mv("e2-e3")]);
        let state = GameState::initial();
        let mut holder = BoardHolder::new(state.board, state.rights);
        assert!(matches!(
            holder.actualize(&tree, 3),
            Err(EngineError::ContractViolation(_))
        ));
    }
}
