//! Rooted polytomous tree structure
//!
//! The tree is an arena of [`Node`]s addressed by [`NodeId`]: children
//! are an owned, ordered list of indices and the ancestor is a
//! non-owning back-reference. Structural edits (`add_child`,
//! `remove_child`, `swap_children`, `rotate`, `ladderize`) preserve
//! sibling order; `swap_children` also exchanges the previously
//! assigned identifiers and traversal indices so a reorder does not
//! require re-deriving the nested-set numbering.
//!
//! Derived quantities (tip count, node count) are recomputed on demand
//! rather than cached, so structural mutation can never leave a stale
//! count behind.

mod node;
mod traversal;

pub use node::{Node, NodeId};
pub use traversal::{LevelOrder, Postorder, Preorder};

use std::collections::HashSet;

use thiserror::Error;

/// Errors from structural tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The two nodes passed to an operation must be distinct.
    #[error("operation requires two distinct nodes")]
    IdenticalNodes,

    /// A node was expected to be a child of the given parent.
    #[error("node {child} is not a child of node {parent}")]
    NotAChild {
        /// Arena index of the presumed parent.
        parent: NodeId,
        /// Arena index of the node that is not its child.
        child: NodeId,
    },

    /// The two nodes do not belong to the same tree.
    #[error("nodes {0} and {1} share no common ancestor")]
    NoCommonAncestor(NodeId, NodeId),
}

/// A rooted, polytomous phylogenetic tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree consisting of a single blank root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            root: 0,
        }
    }

    /// Arena index of the root.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// Panics if `id` is not a valid arena index.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Mutably borrow a node.
    ///
    /// # Panics
    /// Panics if `id` is not a valid arena index.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Number of nodes ever allocated in the arena, including any that
    /// were detached by [`remove_child`](Self::remove_child).
    #[inline]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append a blank child under `parent` and return its index.
    pub fn add_child(&mut self, parent: NodeId) -> NodeId {
        let child = self.nodes.len();
        let mut node = Node::new();
        node.ancestor = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(child);
        child
    }

    /// Detach `child` from `parent`, preserving the order of its
    /// remaining siblings. The detached node stays in the arena with no
    /// ancestor and is returned.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, TreeError> {
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        self.nodes[parent].children.remove(position);
        self.nodes[child].ancestor = None;
        Ok(child)
    }

    /// Exchange the positions of two children of the same parent,
    /// together with their previously assigned identifiers and
    /// nested-set indices. The rest of both subtrees is untouched, so
    /// the tree-wide index invariants keep holding without a re-walk.
    pub fn swap_children(&mut self, parent: NodeId, a: NodeId, b: NodeId) -> Result<(), TreeError> {
        if a == b {
            return Err(TreeError::IdenticalNodes);
        }
        let pos_a = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == a)
            .ok_or(TreeError::NotAChild { parent, child: a })?;
        let pos_b = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == b)
            .ok_or(TreeError::NotAChild { parent, child: b })?;
        self.nodes[parent].children.swap(pos_a, pos_b);

        let (a_id, a_left, a_right) = {
            let n = &self.nodes[a];
            (n.id, n.left_index, n.right_index)
        };
        {
            let nb = &mut self.nodes[b];
            let (b_id, b_left, b_right) = (nb.id, nb.left_index, nb.right_index);
            nb.id = a_id;
            nb.left_index = a_left;
            nb.right_index = a_right;
            let na = &mut self.nodes[a];
            na.id = b_id;
            na.left_index = b_left;
            na.right_index = b_right;
        }
        Ok(())
    }

    /// Reverse the order of `node`'s children via pairwise swaps.
    pub fn rotate(&mut self, node: NodeId) {
        let mut start = 0;
        let mut end = self.nodes[node].children.len();
        while end > start + 1 {
            let a = self.nodes[node].children[start];
            let b = self.nodes[node].children[end - 1];
            // Children of the same parent, so the swap cannot fail.
            let _ = self.swap_children(node, a, b);
            start += 1;
            end -= 1;
        }
    }

    /// Reorder children by descending tip count throughout the subtree
    /// rooted at `from`, using [`swap_children`](Self::swap_children)
    /// so identifiers and indices travel with the positions.
    pub fn ladderize(&mut self, from: NodeId) {
        let internals: Vec<NodeId> = self
            .level_order(from)
            .filter(|&n| !self.node(n).is_tip())
            .collect();
        for node in internals {
            let mut unsorted = self.nodes[node].children.len();
            while unsorted > 1 {
                let mut last_swap = 0;
                for i in 1..unsorted {
                    let prev = self.nodes[node].children[i - 1];
                    let cur = self.nodes[node].children[i];
                    if self.tip_count(prev) < self.tip_count(cur) {
                        let _ = self.swap_children(node, prev, cur);
                        last_swap = i;
                    }
                }
                unsorted = last_swap;
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Most recent common ancestor of two distinct nodes.
    ///
    /// Walks both ancestor chains to their first intersection. Fails if
    /// the nodes are identical or live in disjoint components (e.g. one
    /// of them was detached).
    pub fn mrca(&self, a: NodeId, b: NodeId) -> Result<NodeId, TreeError> {
        if a == b {
            return Err(TreeError::IdenticalNodes);
        }
        let mut on_path: HashSet<NodeId> = HashSet::new();
        let mut cursor = Some(a);
        while let Some(n) = cursor {
            on_path.insert(n);
            cursor = self.node(n).ancestor;
        }
        let mut cursor = Some(b);
        while let Some(n) = cursor {
            if on_path.contains(&n) {
                return Ok(n);
            }
            cursor = self.node(n).ancestor;
        }
        Err(TreeError::NoCommonAncestor(a, b))
    }

    /// Number of tips in the subtree rooted at `from`. Recomputed on
    /// every call.
    pub fn tip_count(&self, from: NodeId) -> usize {
        self.tips(from).count()
    }

    /// Number of nodes in the subtree rooted at `from`. Recomputed on
    /// every call.
    pub fn node_count(&self, from: NodeId) -> usize {
        self.preorder(from).count()
    }

    /// Whether the subtree rooted at `from` is strictly bifurcating.
    /// Tips are not considered binary trees.
    pub fn is_binary(&self, from: NodeId) -> bool {
        if self.node(from).is_tip() {
            return false;
        }
        self.node_count(from) == 2 * self.tip_count(from) - 1
    }

    /// Greatest cumulative height among the tips below `from`.
    pub fn max_height(&self, from: NodeId) -> f64 {
        self.tips(from)
            .map(|n| self.node(n).height)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    // ------------------------------------------------------------------
    // Traversals
    // ------------------------------------------------------------------

    /// Lazy preorder traversal of the subtree rooted at `from`.
    pub fn preorder(&self, from: NodeId) -> Preorder<'_> {
        Preorder::new(self, from)
    }

    /// Lazy postorder traversal of the subtree rooted at `from`.
    pub fn postorder(&self, from: NodeId) -> Postorder<'_> {
        Postorder::new(self, from)
    }

    /// Lazy level-order traversal of the subtree rooted at `from`.
    pub fn level_order(&self, from: NodeId) -> LevelOrder<'_> {
        LevelOrder::new(self, from)
    }

    /// Tips of the subtree rooted at `from`, in left-to-right order.
    pub fn tips(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preorder(from).filter(|&n| self.node(n).is_tip())
    }

    /// Internal nodes of the subtree rooted at `from`, in preorder.
    pub fn internals(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preorder(from).filter(|&n| !self.node(n).is_tip())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
