//! Position sets — pooled scratch lists of grid coordinates
//!
//! Components that scan or select cells check a set out of the pool, fill
//! it, consume it and let the guard return it empty. The guard owns the
//! set for the duration of the operation, so no reference can outlive the
//! check-in, including on error paths.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Flat list of interleaved (x, y) coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSet {
    coords: Vec<i32>,
}

impl PositionSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a coordinate pair
    pub fn push(&mut self, x: i32, y: i32) {
        self.coords.push(x);
        self.coords.push(y);
    }

    /// Number of coordinate pairs
    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    /// Check if no pairs are stored
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Pair at an index
    pub fn get(&self, index: usize) -> Option<(i32, i32)> {
        let x = *self.coords.get(index * 2)?;
        let y = *self.coords.get(index * 2 + 1)?;
        Some((x, y))
    }

    /// Membership test
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.iter().any(|p| p == (x, y))
    }

    /// Iterate pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.coords.chunks_exact(2).map(|c| (c[0], c[1]))
    }

    /// Drop all pairs, keeping capacity
    pub fn clear(&mut self) {
        self.coords.clear();
    }
}

/// Shared free-list of position sets
#[derive(Debug, Default)]
pub struct PositionPool {
    free: Mutex<Vec<PositionSet>>,
}

impl PositionPool {
    /// Empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out an empty set; the guard checks it back in on drop
    pub fn checkout(&self) -> PositionGuard<'_> {
        let set = self.free.lock().pop().unwrap_or_default();
        PositionGuard {
            pool: self,
            set: Some(set),
        }
    }

    /// Pooled set count
    pub fn pooled(&self) -> usize {
        self.free.lock().len()
    }
}

/// Scoped ownership of a pooled `PositionSet`
pub struct PositionGuard<'a> {
    pool: &'a PositionPool,
    set: Option<PositionSet>,
}

impl Deref for PositionGuard<'_> {
    type Target = PositionSet;

    fn deref(&self) -> &PositionSet {
        self.set.as_ref().expect("guard holds set until drop")
    }
}

impl DerefMut for PositionGuard<'_> {
    fn deref_mut(&mut self) -> &mut PositionSet {
        self.set.as_mut().expect("guard holds set until drop")
    }
}

impl Drop for PositionGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut set) = self.set.take() {
            set.clear();
            self.pool.free.lock().push(set);
        }
    }
}
