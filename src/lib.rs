//! # Ancestral state reconstruction under generalized parsimony
//!
//! This library reconstructs ancestral character states on a rooted
//! phylogenetic tree under generalized (Sankoff) parsimony, for
//! categorical traits and for continuous traits discretized into
//! ordered bins.
//!
//! ## Pipeline
//!
//! 1. **Tree building**: a Newick description is parsed into an
//!    arena-backed [`Tree`] with analysis identifiers, cumulative
//!    heights and nested-set (Euler tour) traversal indices.
//! 2. **Characters**: per-tip observations become admissible state
//!    sets over a fixed [`StateSpace`]: user labels for categorical
//!    traits, half-open bins for continuous ones.
//! 3. **Costs**: a [`CostMatrix`] maps ordered state pairs to
//!    non-negative transition costs (unit default, user triples, or
//!    the λ-asymmetric derivation from bin midpoints).
//! 4. **Engine**: the [`ParsimonyEngine`] runs the downpass/uppass
//!    dynamic program and exposes, per node and candidate state, the
//!    minimum total cost of change consistent with that assignment.
//!
//! ## Usage example
//!
//! ```
//! use ancestra::{analyze_categorical, Reconstruction};
//!
//! let rows = vec![
//!     ("A".to_string(), "0".to_string()),
//!     ("B".to_string(), "1".to_string()),
//! ];
//! let result = analyze_categorical("(A:1,B:1);", &rows, None).unwrap();
//! assert_eq!(result.score, 1.0);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules - each implements one stage of the pipeline
pub mod character; // States, observations, discretization
pub mod cost; // Transition cost matrices
pub mod engine; // Sankoff downpass/uppass dynamic program
pub mod newick; // Newick parsing and tree indexing
pub mod tree; // Arena-backed rooted tree structure

// Re-exports for convenience
pub use character::{Bin, Binning, CharacterData, DiscretizeError, State, StateId, StateSpace};
pub use cost::{CostMatrix, CostMatrixError, UNREACHABLE};
pub use engine::{EngineError, NodeReconstruction, ParsimonyEngine};
pub use newick::NewickError;
pub use tree::{Node, NodeId, Tree, TreeError};

use thiserror::Error;

/// Errors from a whole analysis, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The Newick description could not be parsed.
    #[error("tree parsing failed: {0}")]
    Parse(#[from] NewickError),

    /// A structural tree operation failed.
    #[error("tree operation failed: {0}")]
    Tree(#[from] TreeError),

    /// Continuous observations could not be discretized.
    #[error("discretization failed: {0}")]
    Discretize(#[from] DiscretizeError),

    /// The cost matrix could not be built.
    #[error("cost matrix construction failed: {0}")]
    CostMatrix(#[from] CostMatrixError),

    /// The parsimony engine rejected its inputs.
    #[error("parsimony engine failed: {0}")]
    Engine(#[from] EngineError),
}

/// Complete result of one analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Reconstruction {
    /// The tree's parsimony score (minimum over the root's final
    /// vector).
    pub score: f64,

    /// The fixed state ordering all vectors are aligned to.
    pub states: Vec<State>,

    /// Per-node cost vectors, ordered by ascending node identifier.
    pub nodes: Vec<NodeReconstruction>,
}

/// Reconstruct ancestral states for a categorical character.
///
/// `rows` are `(tip_label, state_label)` observations; `costs`, when
/// given, must cover every ordered state pair exactly once, otherwise
/// the unit-cost model is used.
pub fn analyze_categorical(
    description: &str,
    rows: &[(String, String)],
    costs: Option<&[(String, String, f64)]>,
) -> Result<Reconstruction, AnalysisError> {
    let tree = newick::parse(description)?;
    let data = CharacterData::categorical(rows);
    let matrix = match costs {
        Some(entries) => CostMatrix::from_entries(data.space(), entries)?,
        None => CostMatrix::unit(data.space().len()),
    };
    run(tree, data, matrix)
}

/// Reconstruct ancestral states for a continuous character.
///
/// `rows` are `(tip_label, value)` observations, cut into bins per
/// `binning`; `lambda` is the asymmetry parameter scaling the cost of
/// increasing the trait value (`1.0` gives the symmetric
/// absolute-difference model).
pub fn analyze_continuous(
    description: &str,
    rows: &[(String, f64)],
    binning: &Binning,
    lambda: f64,
) -> Result<Reconstruction, AnalysisError> {
    let tree = newick::parse(description)?;
    let values: Vec<f64> = rows.iter().map(|(_, value)| *value).collect();
    let bins = binning.bins(&values)?;
    let data = CharacterData::continuous(rows, &bins)?;
    let matrix = CostMatrix::asymmetric(data.space(), lambda)?;
    run(tree, data, matrix)
}

fn run(
    tree: Tree,
    data: CharacterData,
    matrix: CostMatrix,
) -> Result<Reconstruction, AnalysisError> {
    let states = data.space().states().to_vec();
    let mut engine = ParsimonyEngine::new(tree, data, matrix)?;
    engine.recompute();
    Ok(Reconstruction {
        score: engine.score()?,
        states,
        nodes: engine.results()?,
    })
}
