//! Generalized (Sankoff) parsimony engine
//!
//! Two dynamic-programming passes over an indexed tree:
//!
//! - **Downpass** (bottom-up, ascending `right_index`, so children are
//!   always finished before their parent): per node and state `j`, the
//!   node cost `g[j]`: for a tip, 0 for admissible states and
//!   [`UNREACHABLE`] otherwise; for an internal node, the sum over all
//!   children of their stem costs `h_child[j]`. Each node's own stem
//!   cost `h[i] = min_j (cost(i,j) + g[j])` is derived as soon as `g`
//!   is known.
//! - **Uppass** (top-down, ascending `left_index`, parents first): the
//!   final vector. Root: `f = g`. Otherwise
//!   `f[j] = min_i ((f_parent[i] − h[i]) + cost(i,j)) + g[j]`, the
//!   minimum total cost over the whole tree conditioned on this node
//!   taking state `j`.
//!
//! The engine re-runs both passes from scratch via [`recompute`]
//! whenever the cost matrix is replaced; fresh vectors are installed
//! only after both passes finish, so readers never observe a downpass
//! from one matrix paired with an uppass from another.
//!
//! [`recompute`]: ParsimonyEngine::recompute

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::character::CharacterData;
use crate::cost::{CostMatrix, CostMatrixError, UNREACHABLE};
use crate::tree::{NodeId, Tree};

/// Errors raised by the parsimony engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The analysis has no character states.
    #[error("character data defines no states")]
    EmptyStateSpace,

    /// The cost matrix does not match the state space.
    #[error("cost matrix covers {matrix} states but the analysis has {states}")]
    DimensionMismatch {
        /// Number of states in the state space.
        states: usize,
        /// Number of states the matrix covers.
        matrix: usize,
    },

    /// Cost vectors were requested before the first recompute.
    #[error("cost vectors not computed yet; call recompute() first")]
    NotComputed,

    /// A replacement cost matrix could not be built.
    #[error("cost matrix rebuild failed: {0}")]
    CostMatrix(#[from] CostMatrixError),
}

/// Result surface for one node: its identity and both cost vectors,
/// ordered by ascending state id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeReconstruction {
    /// Analysis identifier of the node (tips `1..=T`, internals above).
    pub node_id: usize,

    /// Node label; empty for most internal nodes.
    pub label: String,

    /// Downpass cost vector `g`.
    pub downpass: Vec<f64>,

    /// Final (uppass) cost vector `f`.
    pub uppass: Vec<f64>,
}

/// Per-node working vectors for one engine run.
#[derive(Debug, Clone, Default)]
struct PassVectors {
    g: Vec<f64>,
    h: Vec<f64>,
    f: Vec<f64>,
}

/// Sankoff parsimony engine over one tree, one character and one cost
/// matrix.
#[derive(Debug)]
pub struct ParsimonyEngine {
    tree: Tree,
    data: CharacterData,
    matrix: CostMatrix,
    /// Node ids sorted by ascending `right_index`: children before
    /// parents.
    down_order: Vec<NodeId>,
    /// Node ids sorted by ascending `left_index`: parents before
    /// children.
    up_order: Vec<NodeId>,
    vectors: Option<Vec<PassVectors>>,
}

impl ParsimonyEngine {
    /// Create an engine. No vectors exist until the first
    /// [`recompute`](Self::recompute).
    pub fn new(
        tree: Tree,
        data: CharacterData,
        matrix: CostMatrix,
    ) -> Result<Self, EngineError> {
        let states = data.space().len();
        if states == 0 {
            return Err(EngineError::EmptyStateSpace);
        }
        if matrix.len() != states {
            return Err(EngineError::DimensionMismatch {
                states,
                matrix: matrix.len(),
            });
        }

        let root = tree.root();
        let tip_labels: HashSet<&str> = tree
            .tips(root)
            .map(|n| tree.node(n).label.as_str())
            .collect();
        for label in data.observed_labels() {
            if !tip_labels.contains(label) {
                warn!(tip = label, "observation does not match any tip; ignored");
            }
        }

        let mut down_order: Vec<NodeId> = tree.preorder(root).collect();
        down_order.sort_by_key(|&n| tree.node(n).right_index);
        let mut up_order = down_order.clone();
        up_order.sort_by_key(|&n| tree.node(n).left_index);

        Ok(Self {
            tree,
            data,
            matrix,
            down_order,
            up_order,
            vectors: None,
        })
    }

    /// The analyzed tree.
    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The character data in use.
    #[inline]
    pub fn data(&self) -> &CharacterData {
        &self.data
    }

    /// The cost matrix in use.
    #[inline]
    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Replace the cost matrix. Existing vectors (still consistent with
    /// the previous matrix) remain readable until the next successful
    /// [`recompute`](Self::recompute).
    pub fn set_cost_matrix(&mut self, matrix: CostMatrix) -> Result<(), EngineError> {
        let states = self.data.space().len();
        if matrix.len() != states {
            return Err(EngineError::DimensionMismatch {
                states,
                matrix: matrix.len(),
            });
        }
        self.matrix = matrix;
        Ok(())
    }

    /// Regenerate the asymmetric cost matrix for a new λ and re-run
    /// both passes. On error nothing changes: neither the matrix nor
    /// the previously computed vectors.
    pub fn update_asymmetry(&mut self, lambda: f64) -> Result<(), EngineError> {
        let matrix = CostMatrix::asymmetric(self.data.space(), lambda)?;
        self.matrix = matrix;
        self.recompute();
        Ok(())
    }

    /// Run both passes from scratch against the current cost matrix and
    /// atomically install the resulting vectors.
    pub fn recompute(&mut self) {
        let states = self.data.space().len();
        debug!(states, nodes = self.down_order.len(), "running parsimony passes");
        let mut vectors: Vec<PassVectors> = vec![PassVectors::default(); self.tree.arena_len()];

        // Downpass: children strictly before parents.
        for &node in &self.down_order {
            let g = if self.tree.node(node).is_tip() {
                self.leaf_vector(node)
            } else {
                let mut g = vec![0.0; states];
                for &child in self.tree.node(node).children() {
                    for (slot, h) in g.iter_mut().zip(&vectors[child].h) {
                        *slot += h;
                    }
                }
                g
            };
            let h = self.stem_vector(&g);
            vectors[node].g = g;
            vectors[node].h = h;
        }

        // Uppass: parents strictly before children.
        for &node in &self.up_order {
            let f = match self.tree.node(node).ancestor {
                None => vectors[node].g.clone(),
                Some(parent) => {
                    let mut f = vec![0.0; states];
                    for j in 0..states {
                        let mut best = f64::INFINITY;
                        for i in 0..states {
                            let above = vectors[parent].f[i] - vectors[node].h[i];
                            let candidate = above + self.matrix.cost(i + 1, j + 1);
                            if candidate < best {
                                best = candidate;
                            }
                        }
                        f[j] = best + vectors[node].g[j];
                    }
                    f
                }
            };
            vectors[node].f = f;
        }

        self.vectors = Some(vectors);
    }

    /// The tree's parsimony score: the minimum entry of the root's
    /// final cost vector.
    pub fn score(&self) -> Result<f64, EngineError> {
        let vectors = self.vectors.as_ref().ok_or(EngineError::NotComputed)?;
        Ok(vectors[self.tree.root()]
            .f
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min))
    }

    /// Downpass vector of one node (by arena index).
    pub fn downpass_vector(&self, node: NodeId) -> Result<&[f64], EngineError> {
        let vectors = self.vectors.as_ref().ok_or(EngineError::NotComputed)?;
        Ok(&vectors[node].g)
    }

    /// Final (uppass) vector of one node (by arena index).
    pub fn final_vector(&self, node: NodeId) -> Result<&[f64], EngineError> {
        let vectors = self.vectors.as_ref().ok_or(EngineError::NotComputed)?;
        Ok(&vectors[node].f)
    }

    /// Full result surface, ordered by ascending node identifier.
    pub fn results(&self) -> Result<Vec<NodeReconstruction>, EngineError> {
        let vectors = self.vectors.as_ref().ok_or(EngineError::NotComputed)?;
        let root = self.tree.root();
        let mut results: Vec<NodeReconstruction> = self
            .tree
            .preorder(root)
            .map(|node| NodeReconstruction {
                node_id: self.tree.node(node).id,
                label: self.tree.node(node).label.clone(),
                downpass: vectors[node].g.clone(),
                uppass: vectors[node].f.clone(),
            })
            .collect();
        results.sort_by_key(|r| r.node_id);
        Ok(results)
    }

    /// Leaf cost vector: 0 for every admissible state, unreachable for
    /// the rest; all zeros for an unobserved tip.
    fn leaf_vector(&self, node: NodeId) -> Vec<f64> {
        let states = self.data.space().len();
        match self.data.admissible(&self.tree.node(node).label) {
            None => vec![0.0; states],
            Some(admissible) => (1..=states)
                .map(|id| {
                    if admissible.contains(&id) {
                        0.0
                    } else {
                        UNREACHABLE
                    }
                })
                .collect(),
        }
    }

    /// Stem cost vector: `h[i] = min_j (cost(i,j) + g[j])`.
    fn stem_vector(&self, g: &[f64]) -> Vec<f64> {
        let states = g.len();
        (0..states)
            .map(|i| {
                (0..states)
                    .map(|j| self.matrix.cost(i + 1, j + 1) + g[j])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterData;
    use crate::newick;

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn two_tip_engine() -> ParsimonyEngine {
        let tree = newick::parse("(A:1,B:1);").unwrap();
        let data = CharacterData::categorical(&rows(&[("A", "0"), ("B", "1")]));
        let matrix = CostMatrix::unit(2);
        ParsimonyEngine::new(tree, data, matrix).unwrap()
    }

    #[test]
    fn leaf_vectors_mark_inadmissible_states_unreachable() {
        let mut engine = two_tip_engine();
        engine.recompute();
        let root = engine.tree().root();
        let a = engine.tree().node(root).children()[0];
        let g = engine.downpass_vector(a).unwrap();
        assert_eq!(g[0], 0.0);
        assert!(g[1].is_infinite());
    }

    #[test]
    fn unobserved_tip_is_fully_ambiguous() {
        let tree = newick::parse("(A:1,B:1,C:1);").unwrap();
        let data = CharacterData::categorical(&rows(&[("A", "0"), ("B", "1")]));
        let mut engine = ParsimonyEngine::new(tree, data, CostMatrix::unit(2)).unwrap();
        engine.recompute();
        let root = engine.tree().root();
        let c = engine.tree().node(root).children()[2];
        assert_eq!(engine.downpass_vector(c).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn two_tip_star_has_score_one() {
        let mut engine = two_tip_engine();
        engine.recompute();
        let root = engine.tree().root();
        assert_eq!(engine.downpass_vector(root).unwrap(), &[1.0, 1.0]);
        assert_eq!(engine.score().unwrap(), 1.0);
    }

    #[test]
    fn vectors_unavailable_before_recompute() {
        let engine = two_tip_engine();
        assert_eq!(engine.score(), Err(EngineError::NotComputed));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut engine = two_tip_engine();
        engine.recompute();
        let first = engine.results().unwrap();
        engine.recompute();
        assert_eq!(engine.results().unwrap(), first);
    }

    #[test]
    fn polytomy_downpass_sums_all_children() {
        // Three-tip star, observations 0, 0, 1: one change suffices and
        // the root cost for state 0 must count all three stems.
        let tree = newick::parse("(A:1,B:1,C:1);").unwrap();
        let data = CharacterData::categorical(&rows(&[("A", "0"), ("B", "0"), ("C", "1")]));
        let mut engine = ParsimonyEngine::new(tree, data, CostMatrix::unit(2)).unwrap();
        engine.recompute();
        let root = engine.tree().root();
        assert_eq!(engine.downpass_vector(root).unwrap(), &[1.0, 2.0]);
        assert_eq!(engine.score().unwrap(), 1.0);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let tree = newick::parse("(A:1,B:1);").unwrap();
        let data = CharacterData::categorical(&rows(&[("A", "0"), ("B", "1")]));
        let result = ParsimonyEngine::new(tree, data, CostMatrix::unit(3));
        assert_eq!(
            result.err(),
            Some(EngineError::DimensionMismatch {
                states: 2,
                matrix: 3
            })
        );
    }
}
