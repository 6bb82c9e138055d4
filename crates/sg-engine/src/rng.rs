//! Random sources — live, forced-branch and replay strategies
//!
//! Two layers: a `RandomBackend` produces raw rolls, and an `RngSource`
//! strategy decides how a component's weighted draw is resolved. The
//! simulation driver picks the strategy; the graph never does.

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sg_core::{SgError, SgResult};

use crate::weight::WeightTable;

/// Raw roll producer, uniform in `[0, max)`
pub trait RandomBackend: Send {
    fn roll(&mut self, max: u32) -> SgResult<u32>;
}

/// ChaCha-backed roll source
///
/// ChaCha is used instead of `StdRng` so a recorded seed reproduces the
/// same stream across platforms and rand versions.
#[derive(Debug, Clone)]
pub struct ChaChaBackend {
    rng: ChaCha8Rng,
}

impl ChaChaBackend {
    /// Seeded, reproducible backend
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// OS-entropy backend for live play
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl RandomBackend for ChaChaBackend {
    fn roll(&mut self, max: u32) -> SgResult<u32> {
        if max == 0 {
            return Err(SgError::Random("roll with zero range".to_string()));
        }
        Ok(self.rng.random_range(0..max))
    }
}

/// How a draw was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// Backend randomness
    Live,
    /// Forced by branch enumeration
    Forced,
    /// Replayed from a recorded tape
    Replay,
}

/// One resolved weighted draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    /// Drawn value
    pub value: i32,
    /// Entry index within the table
    pub index: usize,
    /// True when the index was not chosen by the backend
    pub forced: bool,
    /// Resolution strategy
    pub kind: DrawKind,
}

/// Round-level draw strategy
pub trait RngSource: Send {
    /// Resolve the next weighted draw for `component` against `table`
    fn next_draw(&mut self, component: &str, table: &WeightTable) -> SgResult<Draw>;

    /// True once a forced-branch sweep has visited every branch
    fn is_iterate_ending(&self) -> bool {
        false
    }
}

/// Live randomness; optionally records the index tape for replay
pub struct LiveSource {
    backend: Box<dyn RandomBackend>,
    tape: Option<Vec<usize>>,
}

impl LiveSource {
    /// Live source without recording
    pub fn new(backend: Box<dyn RandomBackend>) -> Self {
        Self {
            backend,
            tape: None,
        }
    }

    /// Seeded live source
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(ChaChaBackend::seeded(seed)))
    }

    /// Live source that records every drawn index
    pub fn recording(backend: Box<dyn RandomBackend>) -> Self {
        Self {
            backend,
            tape: Some(Vec::new()),
        }
    }

    /// Recorded indices so far
    pub fn tape(&self) -> Option<&[usize]> {
        self.tape.as_deref()
    }

    /// Take the recorded tape, leaving recording enabled
    pub fn take_tape(&mut self) -> Vec<usize> {
        self.tape.replace(Vec::new()).unwrap_or_default()
    }
}

impl RngSource for LiveSource {
    fn next_draw(&mut self, _component: &str, table: &WeightTable) -> SgResult<Draw> {
        let index = table.draw_index(self.backend.as_mut())?;
        if let Some(tape) = &mut self.tape {
            tape.push(index);
        }
        Ok(Draw {
            value: table.value_at(index).unwrap_or_default(),
            index,
            forced: false,
            kind: DrawKind::Live,
        })
    }
}

/// Forced-branch source for exhaustive enumeration
///
/// Draws for the designated iterate component are forced through its
/// branch indices in declared order, one per visit, no repeats and no
/// skips; all other components fall through to the backend. The driver
/// loops rounds until `is_iterate_ending()` reports the sweep complete.
pub struct IterateSource {
    target: String,
    backend: Box<dyn RandomBackend>,
    /// Branch count, recorded on the first visit
    branch_count: Option<usize>,
    cursor: usize,
}

impl IterateSource {
    /// Enumerate `target`'s branches, backed by `backend` for everything else
    pub fn new(target: impl Into<String>, backend: Box<dyn RandomBackend>) -> Self {
        Self {
            target: target.into(),
            backend,
            branch_count: None,
            cursor: 0,
        }
    }

    /// Seeded convenience constructor
    pub fn seeded(target: impl Into<String>, seed: u64) -> Self {
        Self::new(target, Box::new(ChaChaBackend::seeded(seed)))
    }

    /// The component whose branches are being swept
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Branch indices visited so far
    pub fn visited(&self) -> usize {
        self.cursor
    }
}

impl RngSource for IterateSource {
    fn next_draw(&mut self, component: &str, table: &WeightTable) -> SgResult<Draw> {
        if component != self.target {
            let index = table.draw_index(self.backend.as_mut())?;
            return Ok(Draw {
                value: table.value_at(index).unwrap_or_default(),
                index,
                forced: false,
                kind: DrawKind::Live,
            });
        }

        if self.branch_count.is_none() {
            self.branch_count = Some(table.len());
        }
        let index = self.cursor;
        if index >= table.len() {
            return Err(SgError::Random(format!(
                "iterate sweep of {} overran {} branches",
                self.target,
                table.len()
            )));
        }
        self.cursor += 1;
        Ok(Draw {
            value: table.value_at(index).unwrap_or_default(),
            index,
            forced: true,
            kind: DrawKind::Forced,
        })
    }

    fn is_iterate_ending(&self) -> bool {
        matches!(self.branch_count, Some(n) if self.cursor >= n)
    }
}

/// Replays a recorded index tape verbatim
pub struct ReplaySource {
    draws: VecDeque<usize>,
    position: usize,
}

impl ReplaySource {
    /// Replay the given index sequence
    pub fn new(draws: Vec<usize>) -> Self {
        Self {
            draws: draws.into(),
            position: 0,
        }
    }

    /// Remaining draws on the tape
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RngSource for ReplaySource {
    fn next_draw(&mut self, component: &str, table: &WeightTable) -> SgResult<Draw> {
        let Some(index) = self.draws.pop_front() else {
            return Err(SgError::ReplayExhausted(self.position));
        };
        self.position += 1;
        if index >= table.len() {
            return Err(SgError::Random(format!(
                "replayed index {index} out of range for table {} at {component}",
                table.name()
            )));
        }
        Ok(Draw {
            value: table.value_at(index).unwrap_or_default(),
            index,
            forced: false,
            kind: DrawKind::Replay,
        })
    }
}
