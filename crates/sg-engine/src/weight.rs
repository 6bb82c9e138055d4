//! Weight tables — discrete distributions over symbol codes
//!
//! The table is the engine's only probability primitive: an ordered list of
//! `(value, weight)` pairs with a cached weight sum. Every draw is
//! proportional by construction, `P(value_i) = weight_i / max_weight`, and
//! fully reproducible from the roll sequence.

use serde::{Deserialize, Serialize};

use sg_core::{SgError, SgResult};

use crate::rng::RandomBackend;

/// Immutable-until-edited value↔weight table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTable {
    /// Table name, for error context
    name: String,
    values: Vec<i32>,
    weights: Vec<u32>,
    /// Invariant: `max_weight == weights.iter().sum()`
    max_weight: u32,
}

impl WeightTable {
    /// Create a table from parallel value/weight lists
    pub fn new(name: impl Into<String>, values: Vec<i32>, weights: Vec<u32>) -> SgResult<Self> {
        let name = name.into();
        if values.len() != weights.len() {
            return Err(SgError::config(
                &name,
                format!(
                    "weight table has {} values but {} weights",
                    values.len(),
                    weights.len()
                ),
            ));
        }
        let max_weight = weights.iter().sum();
        Ok(Self {
            name,
            values,
            weights,
            max_weight,
        })
    }

    /// Create a table from `(value, weight)` pairs
    pub fn from_pairs(name: impl Into<String>, pairs: &[(i32, u32)]) -> Self {
        let values = pairs.iter().map(|&(v, _)| v).collect();
        let weights: Vec<u32> = pairs.iter().map(|&(_, w)| w).collect();
        let max_weight = weights.iter().sum();
        Self {
            name: name.into(),
            values,
            weights,
            max_weight,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries (including zero-weighted ones)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cached weight sum
    pub fn max_weight(&self) -> u32 {
        self.max_weight
    }

    /// An exhausted table must not be drawn from; callers fall back to an
    /// unfiltered table instead.
    pub fn is_exhausted(&self) -> bool {
        self.max_weight == 0
    }

    /// Value at an entry index
    pub fn value_at(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    /// Weight at an entry index
    pub fn weight_at(&self, index: usize) -> Option<u32> {
        self.weights.get(index).copied()
    }

    /// All weights, in declaration order
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Draw a value proportional to weight
    pub fn draw(&self, backend: &mut dyn RandomBackend) -> SgResult<(i32, usize)> {
        let index = self.draw_index(backend)?;
        Ok((self.values[index], index))
    }

    /// Draw an entry index proportional to weight
    pub fn draw_index(&self, backend: &mut dyn RandomBackend) -> SgResult<usize> {
        if self.max_weight == 0 {
            return Err(SgError::ExhaustedDistribution(self.name.clone()));
        }
        let roll = backend.roll(self.max_weight)?;
        Ok(self.index_of_roll(roll))
    }

    /// Map a roll in `[0, max_weight)` to its entry index
    pub fn index_of_roll(&self, roll: u32) -> usize {
        let mut acc = 0u32;
        for (i, &w) in self.weights.iter().enumerate() {
            acc += w;
            if roll < acc {
                return i;
            }
        }
        // Unreachable while the max_weight invariant holds
        self.weights.len().saturating_sub(1)
    }

    /// Derived table with the listed values' weights zeroed
    ///
    /// The entries stay in place so branch indices remain stable; only the
    /// weights and the cached sum change.
    pub fn without_values(&self, excluded: &[i32]) -> WeightTable {
        let mut derived = self.clone();
        for (i, v) in derived.values.iter().enumerate() {
            if excluded.contains(v) {
                derived.weights[i] = 0;
            }
        }
        derived.max_weight = derived.weights.iter().sum();
        derived
    }

    /// Destructive removal of one value's entry, for draw-without-replacement
    /// loops. Callers must detect the single-remaining-value edge case
    /// themselves rather than loop on an emptying table.
    pub fn remove_value(&mut self, value: i32) -> bool {
        match self.values.iter().position(|&v| v == value) {
            Some(i) => {
                self.values.remove(i);
                self.weights.remove(i);
                self.max_weight = self.weights.iter().sum();
                true
            }
            None => false,
        }
    }
}
