//! Arena-allocated search tree.

use chess_core::Move;
use std::ops::Range;

/// A position reachable from the search root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    /// Index of the parent node; `None` only for the root.
    pub parent: Option<usize>,
    /// Move leading from the parent to this node.
    pub previous_move: Option<Move>,
    /// Distance from the root.
    pub ply: u32,
    /// Child index range, `None` until the node is expanded.
    pub children: Option<Range<usize>>,
}

/// Nodes addressed by index. The root is always node 0; the children of
/// a node occupy one contiguous index range.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub const ROOT: usize = 0;

    /// Creates a tree holding only the root.
    pub fn new() -> Self {
        SearchTree {
            nodes: vec![SearchNode {
                parent: None,
                previous_move: None,
                ply: 0,
                children: None,
            }],
        }
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, index: usize) -> &SearchNode {
        &self.nodes[index]
    }

    /// Expands `parent` with one child per move and returns their indices.
    pub fn expand(&mut self, parent: usize, moves: &[Move]) -> Range<usize> {
        let ply = self.nodes[parent].ply + 1;
        let start = self.nodes.len();
        self.nodes.extend(moves.iter().map(|&mv| SearchNode {
            parent: Some(parent),
            previous_move: Some(mv),
            ply,
            children: None,
        }));
        let range = start..self.nodes.len();
        self.nodes[parent].children = Some(range.clone());
        range
    }

    /// Writes the node indices from just below the root down to `target`
    /// into `path`.
    pub fn path_into(&self, target: usize, path: &mut Vec<usize>) {
        path.clear();
        let mut cursor = target;
        while let Some(parent) = self.nodes[cursor].parent {
            path.push(cursor);
            cursor = parent;
        }
        path.reverse();
    }

    /// Returns true if both nodes hang off the same parent.
    pub fn are_siblings(&self, a: usize, b: usize) -> bool {
        a != b && self.nodes[a].parent.is_some() && self.nodes[a].parent == self.nodes[b].parent
    }
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}
