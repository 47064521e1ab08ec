//! Character states and per-tip observations
//!
//! A [`StateSpace`] is the fixed, ordered set of candidate states for
//! one analysis: user-supplied labels in the categorical case,
//! discretized `[min, max)` bins in the continuous case. Cost vectors
//! everywhere in the crate are ordered by ascending state id, with
//! vector index `id - 1`.
//!
//! [`CharacterData`] joins the state space with the observations: for
//! every observed tip label, the set of admissible state ids. Multiple
//! rows for the same tip widen that set (an ambiguous observation);
//! tips without any row stay fully unconstrained.

mod discretize;

pub use discretize::{
    bin_of, breakpoint_bins, equal_width_bins, Bin, Binning, DiscretizeError,
};

use std::collections::{BTreeSet, HashMap};

/// Identifier of a character state (1-based, dense).
pub type StateId = usize;

/// One candidate character state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    /// Dense 1-based identifier; vectors are indexed by `id - 1`.
    pub id: StateId,

    /// User-supplied label (categorical) or `[min,max)` (continuous).
    pub label: String,

    /// Bin bounds for discretized continuous states.
    pub bounds: Option<(f64, f64)>,

    /// Representative value (bin midpoint) for continuous states.
    pub value: Option<f64>,
}

/// The ordered set of candidate states for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    states: Vec<State>,
}

impl StateSpace {
    /// Build a categorical state space from observed state labels, one
    /// state per distinct label in order of first appearance.
    pub fn categorical<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut states: Vec<State> = Vec::new();
        let mut seen: HashMap<String, StateId> = HashMap::new();
        for label in labels {
            let label = label.as_ref();
            if !seen.contains_key(label) {
                let id = states.len() + 1;
                seen.insert(label.to_string(), id);
                states.push(State {
                    id,
                    label: label.to_string(),
                    bounds: None,
                    value: None,
                });
            }
        }
        Self { states }
    }

    /// Build a continuous state space, one state per bin, in bin order.
    pub fn from_bins(bins: &[Bin]) -> Self {
        let states = bins
            .iter()
            .enumerate()
            .map(|(index, bin)| State {
                id: index + 1,
                label: bin.label(),
                bounds: Some((bin.min, bin.max)),
                value: Some(bin.midpoint()),
            })
            .collect();
        Self { states }
    }

    /// Number of states.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the space has no states.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States in ascending id order.
    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state with the given id, if any.
    pub fn get(&self, id: StateId) -> Option<&State> {
        id.checked_sub(1).and_then(|index| self.states.get(index))
    }

    /// Resolve a state label to its id.
    pub fn id_of(&self, label: &str) -> Option<StateId> {
        self.states.iter().find(|s| s.label == label).map(|s| s.id)
    }
}

/// State space joined with per-tip admissible state sets.
#[derive(Debug, Clone)]
pub struct CharacterData {
    space: StateSpace,
    admissible: HashMap<String, BTreeSet<StateId>>,
}

impl CharacterData {
    /// Build categorical character data from `(tip_label, state_label)`
    /// rows. The state space is derived from the rows themselves.
    pub fn categorical(rows: &[(String, String)]) -> Self {
        let space = StateSpace::categorical(rows.iter().map(|(_, state)| state));
        let mut admissible: HashMap<String, BTreeSet<StateId>> = HashMap::new();
        for (tip, state) in rows {
            // The label is present by construction of the space.
            if let Some(id) = space.id_of(state) {
                admissible.entry(tip.clone()).or_default().insert(id);
            }
        }
        Self { space, admissible }
    }

    /// Build continuous character data from `(tip_label, value)` rows
    /// and a previously derived bin set. Every value must fall in
    /// exactly one bin.
    pub fn continuous(rows: &[(String, f64)], bins: &[Bin]) -> Result<Self, DiscretizeError> {
        let space = StateSpace::from_bins(bins);
        let mut admissible: HashMap<String, BTreeSet<StateId>> = HashMap::new();
        for (tip, value) in rows {
            let id = bin_of(bins, *value)? + 1;
            admissible.entry(tip.clone()).or_default().insert(id);
        }
        Ok(Self { space, admissible })
    }

    /// The fixed state ordering of this analysis.
    #[inline]
    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    /// Admissible state ids for a tip label; `None` when the tip was
    /// never observed.
    pub fn admissible(&self, tip_label: &str) -> Option<&BTreeSet<StateId>> {
        self.admissible.get(tip_label)
    }

    /// Labels that carry at least one observation.
    pub fn observed_labels(&self) -> impl Iterator<Item = &str> {
        self.admissible.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorical_space_orders_by_first_appearance() {
        let rows = vec![
            ("A".to_string(), "red".to_string()),
            ("B".to_string(), "blue".to_string()),
            ("C".to_string(), "red".to_string()),
        ];
        let data = CharacterData::categorical(&rows);
        let labels: Vec<&str> = data
            .space()
            .states()
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["red", "blue"]);
        assert_eq!(data.space().id_of("blue"), Some(2));
    }

    #[test]
    fn repeated_rows_widen_the_admissible_set() {
        let rows = vec![
            ("A".to_string(), "red".to_string()),
            ("A".to_string(), "blue".to_string()),
            ("B".to_string(), "blue".to_string()),
        ];
        let data = CharacterData::categorical(&rows);
        let a: Vec<StateId> = data.admissible("A").unwrap().iter().copied().collect();
        assert_eq!(a, vec![1, 2]);
        let b: Vec<StateId> = data.admissible("B").unwrap().iter().copied().collect();
        assert_eq!(b, vec![2]);
        assert!(data.admissible("C").is_none());
    }

    #[test]
    fn continuous_states_carry_bounds_and_midpoints() {
        let bins = [
            Bin { min: 0.0, max: 2.0 },
            Bin { min: 2.0, max: 4.0 },
        ];
        let rows = vec![("A".to_string(), 1.0), ("B".to_string(), 3.0)];
        let data = CharacterData::continuous(&rows, &bins).unwrap();
        let states = data.space().states();
        assert_eq!(states[0].value, Some(1.0));
        assert_eq!(states[1].value, Some(3.0));
        assert_eq!(states[0].bounds, Some((0.0, 2.0)));
        assert_eq!(states[0].label, "[0,2)");
        assert_eq!(
            data.admissible("B").unwrap().iter().copied().collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn continuous_value_outside_bins_fails() {
        let bins = [Bin { min: 0.0, max: 2.0 }];
        let rows = vec![("A".to_string(), 5.0)];
        assert_eq!(
            CharacterData::continuous(&rows, &bins).unwrap_err(),
            DiscretizeError::ValueOutsideBins(5.0)
        );
    }
}
