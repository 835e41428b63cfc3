//! Bot move selection.
//!
//! The tree search walks every legal line up to a fixed depth, one
//! top-level branch at a time, on a single board owned by a
//! [`BoardHolder`]. The board is never copied per node: moving between
//! nodes is done with apply and rollback calls, and the holder checks the
//! board position against the visited node after every transition.
//!
//! Branches are not evaluated. Each one is summarized by its node count
//! and a [`BranchScorer`] picks the move to play.

mod holder;
mod tree;

pub use holder::{BoardHolder, TransitionStats};
pub use tree::{SearchNode, SearchTree};

use crate::{BoardView, EngineError, MoveGenerator, Rights};
use chess_core::{Move, PieceType, Point, Side};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Default number of plies explored below the root.
pub const DEFAULT_DEPTH: u32 = 5;

/// Node count below one root move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchReport {
    pub mv: Move,
    /// Nodes visited in the branch, the branch node included.
    pub nodes: u64,
}

/// Outcome of one full traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub branches: Vec<BranchReport>,
    pub total_nodes: u64,
    pub elapsed: Duration,
    pub transitions: TransitionStats,
}

/// Picks the move to play from the per-branch reports.
pub trait BranchScorer: Send + Sync {
    /// Returns `None` only when `branches` is empty.
    fn choose(&self, branches: &[BranchReport]) -> Option<Move>;
}

/// Keeps the first enumerated branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstBranchScorer;

impl BranchScorer for FirstBranchScorer {
    fn choose(&self, branches: &[BranchReport]) -> Option<Move> {
        branches.first().map(|b| b.mv)
    }
}

/// Depth-limited traversal engine used for machine-opponent moves.
pub struct SearchEngine {
    generator: MoveGenerator,
    depth: u32,
    scorer: Box<dyn BranchScorer>,
}

impl SearchEngine {
    /// Creates an engine exploring `depth` plies (at least one).
    pub fn new(generator: MoveGenerator, depth: u32) -> Self {
        SearchEngine {
            generator,
            depth: depth.max(1),
            scorer: Box::new(FirstBranchScorer),
        }
    }

    pub fn with_scorer(mut self, scorer: impl BranchScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn generator(&self) -> &MoveGenerator {
        &self.generator
    }

    /// Traverses every line up to the configured depth from the position
    /// where `side` is to move.
    ///
    /// The caller's board is not touched: the search runs on its own copy.
    pub fn search<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
    ) -> Result<SearchReport, EngineError> {
        if board.side_to_move() != side {
            return Err(EngineError::contract(format!(
                "search for {} at position {} where {} is to move",
                side,
                board.position(),
                board.side_to_move()
            )));
        }

        let start = Instant::now();
        let mut holder = BoardHolder::new(board.snapshot(), *rights);
        let root_moves = self.generator.legal_moves(&holder, rights, side)?;

        let mut branches = Vec::with_capacity(root_moves.len());
        let mut total_nodes = 0u64;
        for &mv in &root_moves {
            let nodes = self.explore_branch(&mut holder, mv)?;
            debug!(mv = %mv, nodes, "branch explored");
            total_nodes += nodes;
            branches.push(BranchReport { mv, nodes });
        }

        let elapsed = start.elapsed();
        info!(
            side = %side,
            position = board.position(),
            depth = self.depth,
            branches = branches.len(),
            nodes = total_nodes,
            elapsed_ms = elapsed.as_millis() as u64,
            "search finished"
        );
        Ok(SearchReport {
            branches,
            total_nodes,
            elapsed,
            transitions: holder.transitions(),
        })
    }

    /// Searches and lets the scorer pick. `None` means `side` has no legal
    /// move (checkmate or stalemate).
    pub fn select_move<B: BoardView>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
    ) -> Result<Option<Move>, EngineError> {
        let report = self.search(board, rights, side)?;
        let choice = self.scorer.choose(&report.branches);
        if let Some(mv) = choice {
            debug!(mv = %mv, "move selected");
        }
        Ok(choice)
    }

    /// Picks a random origin with at least one legal destination, then a
    /// random destination from it. Promotions always become queens.
    pub fn select_random<B: BoardView, R: Rng + ?Sized>(
        &self,
        board: &B,
        rights: &Rights,
        side: Side,
        rng: &mut R,
    ) -> Result<Option<Move>, EngineError> {
        if board.side_to_move() != side {
            return Err(EngineError::contract(format!(
                "random move for {} while {} is to move",
                side,
                board.side_to_move()
            )));
        }

        let mut candidates: Vec<(Point, Vec<Point>)> = Vec::new();
        for origin in board.occupied(side) {
            let destinations = self.generator.legal_destinations(board, rights, side, origin)?;
            if !destinations.is_empty() {
                candidates.push((origin, destinations.iter().collect()));
            }
        }

        let Some((origin, destinations)) = candidates.choose(rng) else {
            return Ok(None);
        };
        let Some(&to) = destinations.choose(rng) else {
            return Ok(None);
        };

        let mut mv = Move::new(*origin, to);
        if let Some(piece) = board.piece_at(*origin) {
            if mv.reaches_promotion_row(piece) {
                mv = Move::with_promotion(*origin, to, PieceType::Queen);
            }
        }
        trace!(mv = %mv, origins = candidates.len(), "random move picked");
        Ok(Some(mv))
    }

    /// Builds and walks the tree below one root move, then discards it.
    fn explore_branch(&self, holder: &mut BoardHolder, mv: Move) -> Result<u64, EngineError> {
        let mut tree = SearchTree::new();
        let mut pending: Vec<usize> = tree.expand(SearchTree::ROOT, &[mv]).collect();
        let mut nodes = 0u64;

        while let Some(node) = pending.pop() {
            holder.actualize(&tree, node)?;
            nodes += 1;
            if tree.node(node).ply >= self.depth {
                continue;
            }
            let moves =
                self.generator
                    .legal_moves(&*holder, holder.rights(), holder.side_to_move())?;
            // reversed so children are visited in generation order
            pending.extend(tree.expand(node, moves.as_slice()).rev());
        }

        holder.rollback_to_root()?;
        Ok(nodes)
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(MoveGenerator::default(), DEFAULT_DEPTH)
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
