//! Lazy traversal iterators
//!
//! All traversals yield [`NodeId`]s and borrow the tree immutably, so
//! they can be chained with standard iterator adapters. The tip-only
//! and internal-only variants exposed on [`Tree`](super::Tree) are
//! plain filters over these.

use std::collections::VecDeque;

use super::node::NodeId;
use super::Tree;

/// Depth-first preorder: every node before any of its descendants,
/// children visited left to right.
#[derive(Debug)]
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Preorder<'a> {
    pub(crate) fn new(tree: &'a Tree, from: NodeId) -> Self {
        Self {
            tree,
            stack: vec![from],
        }
    }
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        // Push right-to-left so the leftmost child is visited next.
        for &child in self.tree.node(current).children().iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}

/// Depth-first postorder: every node after all of its descendants.
#[derive(Debug)]
pub struct Postorder<'a> {
    tree: &'a Tree,
    // (node, index of the next child to descend into)
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Postorder<'a> {
    pub(crate) fn new(tree: &'a Tree, from: NodeId) -> Self {
        Self {
            tree,
            stack: vec![(from, 0)],
        }
    }
}

impl Iterator for Postorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let &mut (current, ref mut cursor) = self.stack.last_mut()?;
            let children = self.tree.node(current).children();
            if *cursor < children.len() {
                let child = children[*cursor];
                *cursor += 1;
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(current);
            }
        }
    }
}

/// Breadth-first level order: nodes in order of increasing depth,
/// left to right within a level.
#[derive(Debug)]
pub struct LevelOrder<'a> {
    tree: &'a Tree,
    queue: VecDeque<NodeId>,
}

impl<'a> LevelOrder<'a> {
    pub(crate) fn new(tree: &'a Tree, from: NodeId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(from);
        Self { tree, queue }
    }
}

impl Iterator for LevelOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.queue.pop_front()?;
        self.queue
            .extend(self.tree.node(current).children().iter().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::newick;

    #[test]
    fn preorder_visits_parent_first() {
        let tree = newick::parse("((A:1,B:1):1,C:2);").unwrap();
        let order: Vec<usize> = tree
            .preorder(tree.root())
            .map(|n| tree.node(n).id)
            .collect();
        // Root (4), inner (5), A (1), B (2), C (3).
        assert_eq!(order, vec![4, 5, 1, 2, 3]);
    }

    #[test]
    fn postorder_visits_children_first() {
        let tree = newick::parse("((A:1,B:1):1,C:2);").unwrap();
        let order: Vec<usize> = tree
            .postorder(tree.root())
            .map(|n| tree.node(n).id)
            .collect();
        assert_eq!(order, vec![1, 2, 5, 3, 4]);
    }

    #[test]
    fn level_order_by_depth() {
        let tree = newick::parse("((A:1,B:1):1,C:2);").unwrap();
        let order: Vec<usize> = tree
            .level_order(tree.root())
            .map(|n| tree.node(n).id)
            .collect();
        assert_eq!(order, vec![4, 5, 3, 1, 2]);
    }
}
