//! Scenes — pooled symbol grids with clone-on-write snapshots
//!
//! A scene is a `width × height` grid of symbol codes, created once at
//! round start and shared behind `Arc`. Components read the current scene
//! and fork a pooled deep copy only on their first actual mutation; the
//! round context detects no-ops by pointer identity and never appends a
//! duplicate snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sg_core::EMPTY_SYMBOL;

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    /// Reel count
    pub width: usize,
    /// Rows per reel
    pub height: usize,
}

impl GridSpec {
    /// Cells per scene
    pub fn cells(&self) -> usize {
        self.width * self.height
    }
}

/// A symbol grid, column-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

impl Scene {
    /// Fresh unpooled scene, all cells empty
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY_SYMBOL; width * height],
        }
    }

    /// Reel count
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows per reel
    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as a spec
    pub fn spec(&self) -> GridSpec {
        GridSpec {
            width: self.width,
            height: self.height,
        }
    }

    /// Symbol code at (x, y); empty sentinel when out of bounds
    pub fn get(&self, x: usize, y: usize) -> i32 {
        if x >= self.width || y >= self.height {
            return EMPTY_SYMBOL;
        }
        self.cells[x * self.height + y]
    }

    /// Set the symbol code at (x, y); out-of-bounds writes are dropped
    pub fn set(&mut self, x: usize, y: usize, code: i32) {
        if x < self.width && y < self.height {
            self.cells[x * self.height + y] = code;
        }
    }

    /// One reel column, top to bottom
    pub fn column(&self, x: usize) -> &[i32] {
        &self.cells[x * self.height..(x + 1) * self.height]
    }

    /// Overwrite every cell
    pub fn fill(&mut self, code: i32) {
        self.cells.fill(code);
    }

    /// True when every cell is the empty sentinel
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == EMPTY_SYMBOL)
    }

    /// Occurrences of a single symbol code
    pub fn count_symbol(&self, code: i32) -> usize {
        self.cells.iter().filter(|&&c| c == code).count()
    }

    /// Per-symbol occurrence counts; with an empty set, counts every
    /// non-empty code present
    pub fn count_symbols(&self, set: &[i32]) -> HashMap<i32, usize> {
        let mut counts = HashMap::new();
        for &c in &self.cells {
            if c == EMPTY_SYMBOL {
                continue;
            }
            if set.is_empty() || set.contains(&c) {
                *counts.entry(c).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Raw cells, column-major
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.get(x, y);
                if c == EMPTY_SYMBOL {
                    write!(f, "  .")?;
                } else {
                    write!(f, "{c:3}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Free-list of scene buffers keyed by size class
///
/// Check-out and check-in are the only cross-round synchronization points;
/// a checked-out scene is exclusively owned by its round until released.
#[derive(Debug, Default)]
pub struct ScenePool {
    free: Mutex<HashMap<(usize, usize), Vec<Vec<i32>>>>,
}

impl ScenePool {
    /// Empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a blank scene of the given size
    pub fn checkout(&self, width: usize, height: usize) -> Scene {
        let buffer = self
            .free
            .lock()
            .get_mut(&(width, height))
            .and_then(|list| list.pop());
        match buffer {
            Some(mut cells) => {
                cells.fill(EMPTY_SYMBOL);
                Scene {
                    width,
                    height,
                    cells,
                }
            }
            None => Scene::new(width, height),
        }
    }

    /// Deep copy of `src` backed by a pooled buffer — the clone-on-write
    /// entry point for components about to mutate the grid
    pub fn fork(&self, src: &Scene) -> Scene {
        let mut copy = self.checkout(src.width, src.height);
        copy.cells.copy_from_slice(&src.cells);
        copy
    }

    /// Return a scene's buffer to the free list
    pub fn checkin(&self, scene: Scene) {
        self.free
            .lock()
            .entry((scene.width, scene.height))
            .or_default()
            .push(scene.cells);
    }

    /// Return a shared scene if this was the last reference
    pub fn release(&self, scene: Arc<Scene>) {
        if let Ok(owned) = Arc::try_unwrap(scene) {
            self.checkin(owned);
        }
    }

    /// Pooled buffer count across all size classes
    pub fn pooled(&self) -> usize {
        self.free.lock().values().map(Vec::len).sum()
    }
}
