//! Evolutionary state record and parameter vector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named parameter vector: parameter name to numeric value.
pub type ParamVector = BTreeMap<String, f64>;

/// The single persisted record of the evolutionary search.
///
/// `stable` and `current` always carry the same parameter-name set, fixed
/// at bootstrap from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionState {
    /// Best vector ever confirmed by feedback.
    pub stable: ParamVector,

    /// Vector currently being evaluated.
    pub current: ParamVector,

    /// Feedback submissions seen so far.
    #[serde(default)]
    pub generation: u64,

    /// Highest score ever recorded at an evaluation boundary.
    #[serde(rename = "score", default)]
    pub best_score: f64,
}

impl EvolutionState {
    /// Fresh state built from the configured initial vector.
    pub fn bootstrap(initial: &ParamVector) -> Self {
        Self {
            stable: initial.clone(),
            current: initial.clone(),
            generation: 0,
            best_score: 0.0,
        }
    }

    /// Fill in parameters present in `initial` but missing from the loaded
    /// record; values the record already has win. Returns whether the
    /// record changed.
    pub fn backfill(&mut self, initial: &ParamVector) -> bool {
        let mut changed = false;
        for (name, value) in initial {
            if !self.stable.contains_key(name) {
                self.stable.insert(name.clone(), *value);
                changed = true;
            }
            if !self.current.contains_key(name) {
                self.current.insert(name.clone(), *value);
                changed = true;
            }
        }
        changed
    }
}
