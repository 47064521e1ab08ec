//! Node storage for the arena-based tree
//!
//! Nodes live in a contiguous arena owned by [`Tree`](super::Tree) and
//! reference each other by [`NodeId`]. The ancestor link is a plain
//! back-reference, never an owning pointer, so the structure is
//! cycle-free by construction.

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// A single node of a rooted, polytomous phylogenetic tree.
///
/// Identifiers and traversal indices are assigned by the Newick builder
/// after parsing (see [`crate::newick`]): tips get identifiers `1..=T`
/// in left-to-right order, internal nodes `T+1..` in preorder, and
/// `left_index`/`right_index` form a nested-set (Euler tour) numbering
/// so that subtree membership is an integer range query.
#[derive(Debug, Clone)]
pub struct Node {
    /// Analysis identifier (1-based). Zero until assigned by indexing.
    pub id: usize,

    /// Arena index of the ancestor; `None` for the root.
    pub ancestor: Option<NodeId>,

    /// Ordered arena indices of the children (insertion order).
    pub(crate) children: Vec<NodeId>,

    /// Length of the branch leading to this node (non-negative).
    pub branch_length: f64,

    /// Cumulative branch length from the root.
    pub height: f64,

    /// Node label; may be empty, typically so for internal nodes.
    pub label: String,

    /// Bracketed `[...]` comment attached to the node, if any.
    pub note: String,

    /// Nested-set index assigned on entry during the Euler tour.
    pub left_index: usize,

    /// Nested-set index assigned on exit; equals `left_index` for tips.
    pub right_index: usize,
}

impl Node {
    /// Create a blank, unindexed node.
    pub(crate) fn new() -> Self {
        Self {
            id: 0,
            ancestor: None,
            children: Vec::new(),
            branch_length: 0.0,
            height: 0.0,
            label: String::new(),
            note: String::new(),
            left_index: 0,
            right_index: 0,
        }
    }

    /// Whether this node is a tip (no children).
    #[inline]
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Ordered child indices.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether `other`'s subtree lies within this node's subtree,
    /// answered by nested-set range containment.
    #[inline]
    pub fn spans(&self, other: &Node) -> bool {
        self.left_index <= other.left_index && other.right_index <= self.right_index
    }
}
