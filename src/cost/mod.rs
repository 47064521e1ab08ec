//! State transition cost matrices
//!
//! A [`CostMatrix`] is a dense square table of non-negative transition
//! costs between character states, indexed by 1-based state id. The
//! diagonal is always zero; off-diagonal entries need not be symmetric.
//!
//! Three constructions exist: the unit-cost default (categorical
//! analyses without a user matrix), user-supplied `(from, to, cost)`
//! triples validated against the state space, and the asymmetric
//! derivation from discretized continuous states where increasing the
//! trait value is scaled by an asymmetry parameter λ.
//!
//! "Forbidden" entries in leaf cost vectors use [`UNREACHABLE`]
//! (`f64::INFINITY`) rather than a large finite stand-in, so no
//! achievable total cost can ever collide with the sentinel.

use thiserror::Error;

use crate::character::{StateId, StateSpace};

/// Cost sentinel for states a leaf cannot take.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Errors raised while building a cost matrix.
#[derive(Debug, Error, PartialEq)]
pub enum CostMatrixError {
    /// A triple carries a negative cost.
    #[error("negative cost {cost} for transition {from:?} -> {to:?}")]
    NegativeCost {
        /// Source state label.
        from: String,
        /// Target state label.
        to: String,
        /// Offending cost value.
        cost: f64,
    },

    /// An ordered pair was specified more than once.
    #[error("duplicate cost for transition {from:?} -> {to:?}")]
    DuplicateCost {
        /// Source state label.
        from: String,
        /// Target state label.
        to: String,
    },

    /// A triple references a label outside the state space.
    #[error("unknown state label {0:?} in cost specification")]
    UnknownState(String),

    /// A diagonal entry was given a non-zero cost.
    #[error("non-zero cost for self-transition of state {0:?}")]
    NonZeroDiagonal(String),

    /// An off-diagonal ordered pair has no cost. An incomplete matrix
    /// is rejected outright instead of silently dropping the pair.
    #[error("missing cost for transition {from:?} -> {to:?}")]
    MissingCost {
        /// Source state label.
        from: String,
        /// Target state label.
        to: String,
    },

    /// The asymmetry parameter must be strictly positive.
    #[error("asymmetry parameter must be > 0, got {0}")]
    InvalidAsymmetry(f64),

    /// Asymmetric derivation needs continuous states with values.
    #[error("state {0:?} has no representative value")]
    MissingStateValue(String),
}

/// Square state-to-state transition cost table.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    // Row-major, index (from - 1) * size + (to - 1).
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Unit-cost model over `size` states: 0 on the diagonal, 1
    /// everywhere else.
    pub fn unit(size: usize) -> Self {
        let mut costs = vec![1.0; size * size];
        for s in 0..size {
            costs[s * size + s] = 0.0;
        }
        Self { size, costs }
    }

    /// Build from user-supplied `(from_label, to_label, cost)` triples.
    ///
    /// Every off-diagonal ordered pair must be covered exactly once;
    /// diagonal entries default to zero and may only be stated as zero.
    pub fn from_entries(
        space: &StateSpace,
        entries: &[(String, String, f64)],
    ) -> Result<Self, CostMatrixError> {
        let size = space.len();
        let mut table: Vec<Option<f64>> = vec![None; size * size];

        for (from_label, to_label, cost) in entries {
            let from = space
                .id_of(from_label)
                .ok_or_else(|| CostMatrixError::UnknownState(from_label.clone()))?;
            let to = space
                .id_of(to_label)
                .ok_or_else(|| CostMatrixError::UnknownState(to_label.clone()))?;
            if *cost < 0.0 {
                return Err(CostMatrixError::NegativeCost {
                    from: from_label.clone(),
                    to: to_label.clone(),
                    cost: *cost,
                });
            }
            if from == to && *cost != 0.0 {
                return Err(CostMatrixError::NonZeroDiagonal(from_label.clone()));
            }
            let slot = &mut table[(from - 1) * size + (to - 1)];
            if slot.is_some() {
                return Err(CostMatrixError::DuplicateCost {
                    from: from_label.clone(),
                    to: to_label.clone(),
                });
            }
            *slot = Some(*cost);
        }

        let mut costs = vec![0.0; size * size];
        for from in 1..=size {
            for to in 1..=size {
                let index = (from - 1) * size + (to - 1);
                match table[index] {
                    Some(cost) => costs[index] = cost,
                    None if from == to => costs[index] = 0.0,
                    None => {
                        let label = |id: StateId| {
                            space
                                .get(id)
                                .map(|s| s.label.clone())
                                .unwrap_or_default()
                        };
                        return Err(CostMatrixError::MissingCost {
                            from: label(from),
                            to: label(to),
                        });
                    }
                }
            }
        }
        Ok(Self { size, costs })
    }

    /// Asymmetric cost matrix over discretized continuous states:
    /// `cost(f,t) = λ·(t.value − f.value)` when the value increases,
    /// `f.value − t.value` when it decreases. `λ = 1` degenerates to
    /// the symmetric absolute difference of bin midpoints.
    pub fn asymmetric(space: &StateSpace, lambda: f64) -> Result<Self, CostMatrixError> {
        if !(lambda > 0.0) {
            return Err(CostMatrixError::InvalidAsymmetry(lambda));
        }
        let size = space.len();
        let values: Vec<f64> = space
            .states()
            .iter()
            .map(|s| {
                s.value
                    .ok_or_else(|| CostMatrixError::MissingStateValue(s.label.clone()))
            })
            .collect::<Result<_, _>>()?;

        let mut costs = vec![0.0; size * size];
        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                costs[from * size + to] = if values[from] < values[to] {
                    lambda * (values[to] - values[from])
                } else {
                    values[from] - values[to]
                };
            }
        }
        Ok(Self { size, costs })
    }

    /// Number of states the matrix covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the matrix covers no states.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Transition cost between two states (1-based ids).
    ///
    /// # Panics
    /// Panics if either id is out of range.
    #[inline]
    pub fn cost(&self, from: StateId, to: StateId) -> f64 {
        self.costs[(from - 1) * self.size + (to - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::StateSpace;

    fn two_states() -> StateSpace {
        StateSpace::categorical(["red", "blue"])
    }

    #[test]
    fn unit_matrix() {
        let m = CostMatrix::unit(3);
        for i in 1..=3 {
            for j in 1..=3 {
                let expected = if i == j { 0.0 } else { 1.0 };
                assert_eq!(m.cost(i, j), expected);
            }
        }
    }

    #[test]
    fn entries_resolve_labels() {
        let space = two_states();
        let entries = vec![
            ("red".to_string(), "blue".to_string(), 2.0),
            ("blue".to_string(), "red".to_string(), 0.5),
        ];
        let m = CostMatrix::from_entries(&space, &entries).unwrap();
        assert_eq!(m.cost(1, 2), 2.0);
        assert_eq!(m.cost(2, 1), 0.5);
        assert_eq!(m.cost(1, 1), 0.0);
    }

    #[test]
    fn negative_cost_rejected() {
        let space = two_states();
        let entries = vec![("red".to_string(), "blue".to_string(), -1.0)];
        assert!(matches!(
            CostMatrix::from_entries(&space, &entries),
            Err(CostMatrixError::NegativeCost { .. })
        ));
    }

    #[test]
    fn duplicate_pair_rejected() {
        let space = two_states();
        let entries = vec![
            ("red".to_string(), "blue".to_string(), 1.0),
            ("red".to_string(), "blue".to_string(), 1.0),
        ];
        assert!(matches!(
            CostMatrix::from_entries(&space, &entries),
            Err(CostMatrixError::DuplicateCost { .. })
        ));
    }

    #[test]
    fn missing_pair_rejected() {
        let space = two_states();
        let entries = vec![("red".to_string(), "blue".to_string(), 1.0)];
        assert!(matches!(
            CostMatrix::from_entries(&space, &entries),
            Err(CostMatrixError::MissingCost { .. })
        ));
    }

    #[test]
    fn unknown_label_rejected() {
        let space = two_states();
        let entries = vec![("red".to_string(), "green".to_string(), 1.0)];
        assert_eq!(
            CostMatrix::from_entries(&space, &entries),
            Err(CostMatrixError::UnknownState("green".to_string()))
        );
    }

    #[test]
    fn asymmetric_scales_increases_only() {
        use crate::character::Bin;
        let bins = [
            Bin { min: 0.0, max: 2.0 }, // midpoint 1
            Bin { min: 2.0, max: 4.0 }, // midpoint 3
        ];
        let space = StateSpace::from_bins(&bins);
        let m = CostMatrix::asymmetric(&space, 2.0).unwrap();
        assert_eq!(m.cost(1, 2), 4.0); // increase: 2 * (3 - 1)
        assert_eq!(m.cost(2, 1), 2.0); // decrease: 3 - 1
        assert_eq!(m.cost(1, 1), 0.0);
    }

    #[test]
    fn unit_lambda_is_symmetric_absolute_difference() {
        use crate::character::Bin;
        let bins = [
            Bin { min: 0.0, max: 1.0 },
            Bin { min: 1.0, max: 2.0 },
            Bin { min: 2.0, max: 3.0 },
        ];
        let space = StateSpace::from_bins(&bins);
        let m = CostMatrix::asymmetric(&space, 1.0).unwrap();
        for i in 1..=3 {
            for j in 1..=3 {
                assert_eq!(m.cost(i, j), m.cost(j, i));
                let vi = space.get(i).unwrap().value.unwrap();
                let vj = space.get(j).unwrap().value.unwrap();
                assert!((m.cost(i, j) - (vi - vj).abs()).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn non_positive_lambda_rejected() {
        let space = two_states();
        assert_eq!(
            CostMatrix::asymmetric(&space, 0.0),
            Err(CostMatrixError::InvalidAsymmetry(0.0))
        );
    }
}
