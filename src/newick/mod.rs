//! Newick tree builder
//!
//! Parses a `;`-terminated Newick description into a fully indexed
//! [`Tree`]:
//!
//! 1. **Structural scan**: a single cursor pass over the bytes.
//!    `(` opens a group by descending into a fresh child, `,` starts a
//!    sibling, `)` climbs back to the group node; any other position
//!    reads the node's own text (label, optional `[...]` note, optional
//!    `:`-prefixed branch length).
//! 2. **Identifier assignment**: tips are numbered `1..=T` left to
//!    right, internal nodes `T+1..` in preorder among internals.
//! 3. **Heights**: cumulative branch length from the root, computed
//!    top-down.
//! 4. **Nested-set indices**: one counter, started at 1, advanced on
//!    entry to every node and again on exit from every internal node;
//!    tips end up with `left_index == right_index` and every subtree
//!    occupies the contiguous range `[left_index, right_index]`.
//!
//! Parsing never returns a partial tree: every malformed construct is a
//! distinct, immediate [`NewickError`].

use thiserror::Error;

use crate::tree::{NodeId, Tree};

/// Errors raised while parsing a Newick description.
#[derive(Debug, Error, PartialEq)]
pub enum NewickError {
    /// The description does not end with `;`.
    #[error("missing terminating ';' in tree description")]
    MissingTerminator,

    /// A `(` was never closed before the description ended.
    #[error("unmatched opening parenthesis")]
    UnmatchedOpen,

    /// A `)` has no matching `(`.
    #[error("unmatched closing parenthesis")]
    UnmatchedClose,

    /// A `,` appeared outside any parenthesized group.
    #[error("',' outside of any parenthesized group")]
    UnexpectedComma,

    /// A `[...]` note was never closed.
    #[error("missing closing ']' in note")]
    UnterminatedNote,

    /// The text after `:` does not parse as a non-negative real.
    #[error("invalid branch length: {0:?}")]
    InvalidBranchLength(String),

    /// A label contains whitespace or `(`.
    #[error("invalid character in node label: {0:?}")]
    InvalidLabelCharacter(char),
}

/// Parse a Newick description into a fully indexed [`Tree`].
pub fn parse(description: &str) -> Result<Tree, NewickError> {
    let text = description.trim();
    let bytes = text.as_bytes();

    let mut tree = Tree::new();
    let mut current = tree.root();
    let mut depth: usize = 0;
    let mut cursor: usize = 0;

    while cursor < bytes.len() && bytes[cursor] != b';' {
        match bytes[cursor] {
            b'(' => {
                // The node we sit on becomes the group; descend into
                // its first member.
                current = tree.add_child(current);
                depth += 1;
                cursor += 1;
            }
            b',' => {
                let parent = tree
                    .node(current)
                    .ancestor
                    .ok_or(NewickError::UnexpectedComma)?;
                current = tree.add_child(parent);
                cursor += 1;
            }
            b')' => {
                current = tree
                    .node(current)
                    .ancestor
                    .ok_or(NewickError::UnmatchedClose)?;
                depth -= 1;
                cursor += 1;
            }
            _ => {
                let (after_label, label) = read_label(text, cursor)?;
                let (after_note, note) = read_note(text, after_label)?;
                let (after_brlen, branch_length) = read_branch_length(text, after_note)?;
                let node = tree.node_mut(current);
                node.label = label;
                node.note = note;
                node.branch_length = branch_length;
                // Cursor now rests on the next delimiter (or the end).
                cursor = after_brlen;
            }
        }
    }

    if depth != 0 {
        return Err(NewickError::UnmatchedOpen);
    }
    if cursor == bytes.len() {
        return Err(NewickError::MissingTerminator);
    }

    index(&mut tree);
    Ok(tree)
}

/// Read a label starting at `cursor`; stops at `:`, `,`, `)`, `[`, `;`
/// or the end of input.
fn read_label(text: &str, mut cursor: usize) -> Result<(usize, String), NewickError> {
    let bytes = text.as_bytes();
    let start = cursor;
    while cursor < bytes.len() {
        let c = bytes[cursor];
        if matches!(c, b':' | b',' | b')' | b'[' | b';') {
            break;
        }
        if c.is_ascii_whitespace() || c == b'(' {
            return Err(NewickError::InvalidLabelCharacter(c as char));
        }
        cursor += 1;
    }
    Ok((cursor, text[start..cursor].to_string()))
}

/// Read an optional `[...]` note starting at `cursor`.
fn read_note(text: &str, mut cursor: usize) -> Result<(usize, String), NewickError> {
    let bytes = text.as_bytes();
    if bytes.get(cursor) != Some(&b'[') {
        return Ok((cursor, String::new()));
    }
    cursor += 1;
    let start = cursor;
    while cursor < bytes.len() && bytes[cursor] != b']' {
        cursor += 1;
    }
    if cursor == bytes.len() {
        return Err(NewickError::UnterminatedNote);
    }
    Ok((cursor + 1, text[start..cursor].to_string()))
}

/// Read an optional `:`-prefixed branch length starting at `cursor`.
/// Missing branch lengths default to zero.
fn read_branch_length(text: &str, mut cursor: usize) -> Result<(usize, f64), NewickError> {
    let bytes = text.as_bytes();
    if bytes.get(cursor) != Some(&b':') {
        return Ok((cursor, 0.0));
    }
    cursor += 1;
    let start = cursor;
    while cursor < bytes.len() && !matches!(bytes[cursor], b',' | b')' | b';') {
        cursor += 1;
    }
    let raw = &text[start..cursor];
    let value: f64 = raw
        .parse()
        .map_err(|_| NewickError::InvalidBranchLength(raw.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(NewickError::InvalidBranchLength(raw.to_string()));
    }
    Ok((cursor, value))
}

/// Assign identifiers, heights and nested-set indices to a freshly
/// parsed tree.
fn index(tree: &mut Tree) {
    let root = tree.root();
    let preorder: Vec<NodeId> = tree.preorder(root).collect();

    // Tips first: 1..=T left to right, then internals T+1.. in preorder.
    let mut next_id = 0;
    for &n in &preorder {
        if tree.node(n).is_tip() {
            next_id += 1;
            tree.node_mut(n).id = next_id;
        }
    }
    for &n in &preorder {
        if !tree.node(n).is_tip() {
            next_id += 1;
            tree.node_mut(n).id = next_id;
        }
    }

    // Heights top-down; preorder guarantees the ancestor is done first.
    for &n in &preorder {
        let base = match tree.node(n).ancestor {
            Some(ancestor) => tree.node(ancestor).height,
            None => 0.0,
        };
        let node = tree.node_mut(n);
        node.height = base + node.branch_length;
    }

    // Euler tour with a single counter: one value on entry to every
    // node, one more on exit from every internal node.
    let mut counter: usize = 1;
    let mut stack: Vec<(NodeId, usize)> = Vec::new();
    let root_is_tip = tree.node(root).is_tip();
    {
        let node = tree.node_mut(root);
        node.left_index = counter;
        if root_is_tip {
            node.right_index = counter;
        }
    }
    counter += 1;
    if !root_is_tip {
        stack.push((root, 0));
    }
    loop {
        let Some(&(n, child_cursor)) = stack.last() else {
            break;
        };
        if child_cursor < tree.node(n).children().len() {
            let child = tree.node(n).children()[child_cursor];
            if let Some(top) = stack.last_mut() {
                top.1 = child_cursor + 1;
            }
            let child_is_tip = tree.node(child).is_tip();
            let node = tree.node_mut(child);
            node.left_index = counter;
            if child_is_tip {
                node.right_index = counter;
            }
            counter += 1;
            if !child_is_tip {
                stack.push((child, 0));
            }
        } else {
            stack.pop();
            tree.node_mut(n).right_index = counter;
            counter += 1;
        }
    }
}
