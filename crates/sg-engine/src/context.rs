//! Round context — the state one graph traversal reads and mutates
//!
//! Owned exclusively by one round. Holds the scene stacks (primary and
//! auxiliary), the discrete result list, every component's round data, the
//! execution history and the published value store. Deep-clonable so
//! branch exploration can try an alternative continuation on a copy.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sg_core::{ScalarValue, SgError, SgResult};

use crate::data::ComponentData;
use crate::scene::{Scene, ScenePool};

/// Classification of a discrete round event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Left-to-right line win
    LineWin,
    /// Scatter pay
    ScatterWin,
    /// Feature trigger
    Trigger,
    /// Respin granted
    Respin,
    /// Collected per-cell value
    Collect,
}

/// One discrete win/trigger event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Component that produced the event
    pub component: String,
    pub kind: ResultKind,
    /// Scene stack index the event was evaluated against
    pub scene_index: usize,
    /// Participating cells
    #[serde(default)]
    pub positions: Vec<(u8, u8)>,
    /// Symbol code the event keys on
    pub symbol: i32,
    /// Win amount in stake units
    pub amount: i64,
}

/// Per-round execution context
#[derive(Debug)]
pub struct RoundContext {
    scenes: Vec<Arc<Scene>>,
    other_scenes: Vec<Arc<Scene>>,
    /// Discrete events, in production order
    pub results: Vec<RoundResult>,
    data: HashMap<String, Box<dyn ComponentData>>,
    /// Components executed this round, in order (repeats allowed)
    pub history: Vec<String>,
    /// Stake for the round, in stake units
    pub stake: i64,
    values: BTreeMap<String, BTreeMap<String, ScalarValue>>,
}

impl RoundContext {
    /// Empty context for the given stake
    pub fn new(stake: i64) -> Self {
        Self {
            scenes: Vec::new(),
            other_scenes: Vec::new(),
            results: Vec::new(),
            data: HashMap::new(),
            history: Vec::new(),
            stake,
            values: BTreeMap::new(),
        }
    }

    // ── Scenes ────────────────────────────────────────────────────────────

    /// Top of the primary scene stack
    pub fn current_scene(&self) -> Option<&Arc<Scene>> {
        self.scenes.last()
    }

    /// Scene at a stack index
    pub fn scene(&self, index: usize) -> Option<&Arc<Scene>> {
        self.scenes.get(index)
    }

    /// Primary stack depth
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Append the round's base scene
    pub fn push_base_scene(&mut self, scene: Arc<Scene>) -> usize {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    /// Append a scene snapshot unless it is identical (by pointer) to the
    /// current top — the clone-on-write no-op check. Returns the new stack
    /// index, or `None` for a detected no-op.
    pub fn commit_scene(&mut self, scene: Arc<Scene>) -> Option<usize> {
        if let Some(top) = self.scenes.last() {
            if Arc::ptr_eq(top, &scene) {
                return None;
            }
        }
        self.scenes.push(scene);
        Some(self.scenes.len() - 1)
    }

    /// Top of the auxiliary scene stack
    pub fn current_other_scene(&self) -> Option<&Arc<Scene>> {
        self.other_scenes.last()
    }

    /// Auxiliary-stack variant of `commit_scene`
    pub fn commit_other_scene(&mut self, scene: Arc<Scene>) -> Option<usize> {
        if let Some(top) = self.other_scenes.last() {
            if Arc::ptr_eq(top, &scene) {
                return None;
            }
        }
        self.other_scenes.push(scene);
        Some(self.other_scenes.len() - 1)
    }

    /// Auxiliary stack depth
    pub fn other_scene_count(&self) -> usize {
        self.other_scenes.len()
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// Append a result, returning its index
    pub fn push_result(&mut self, result: RoundResult) -> usize {
        self.results.push(result);
        self.results.len() - 1
    }

    /// Sum of all result amounts
    pub fn total_win(&self) -> i64 {
        self.results.iter().map(|r| r.amount).sum()
    }

    // ── Component data ────────────────────────────────────────────────────

    /// Install a component's round data
    pub fn insert_data(&mut self, name: impl Into<String>, data: Box<dyn ComponentData>) {
        self.data.insert(name.into(), data);
    }

    /// Borrow a component's round data
    pub fn data(&self, name: &str) -> Option<&dyn ComponentData> {
        self.data.get(name).map(|d| d.as_ref())
    }

    /// Remove a component's data for the duration of its `run` call
    pub fn take_data(&mut self, name: &str) -> SgResult<Box<dyn ComponentData>> {
        self.data
            .remove(name)
            .ok_or_else(|| SgError::UnknownComponent(name.to_string()))
    }

    /// Reinstall data after `run`
    pub fn put_data(&mut self, name: &str, data: Box<dyn ComponentData>) {
        self.data.insert(name.to_string(), data);
    }

    /// Reset every component's data for a fresh round
    pub fn reset_for_round(&mut self) {
        for data in self.data.values_mut() {
            data.on_new_round();
        }
        self.results.clear();
        self.history.clear();
        self.values.clear();
    }

    /// Route a once-per-key guard through a component's fired set
    pub fn fire_once(&mut self, component: &str, key: &str) -> SgResult<bool> {
        let data = self
            .data
            .get_mut(component)
            .ok_or_else(|| SgError::UnknownComponent(component.to_string()))?;
        Ok(data.base_mut().fire_once(key))
    }

    // ── History ───────────────────────────────────────────────────────────

    /// True when the component already executed this round
    pub fn has_run(&self, name: &str) -> bool {
        self.history.iter().any(|h| h == name)
    }

    /// Record an execution
    pub fn record_history(&mut self, name: &str) {
        self.history.push(name.to_string());
    }

    // ── Published values ──────────────────────────────────────────────────

    /// Store a value under `(component, key)`
    pub fn set_value(&mut self, component: &str, key: &str, value: ScalarValue) {
        self.values
            .entry(component.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Read a published value
    pub fn value(&self, component: &str, key: &str) -> Option<&ScalarValue> {
        self.values.get(component)?.get(key)
    }

    /// Integer value with a default of zero
    pub fn int_value(&self, component: &str, key: &str) -> i64 {
        self.value(component, key)
            .and_then(ScalarValue::as_int)
            .unwrap_or(0)
    }

    // ── Teardown ──────────────────────────────────────────────────────────

    /// Return every uniquely owned scene to the pool
    pub fn release(&mut self, pool: &ScenePool) {
        for scene in self.scenes.drain(..) {
            pool.release(scene);
        }
        for scene in self.other_scenes.drain(..) {
            pool.release(scene);
        }
    }
}

impl Clone for RoundContext {
    fn clone(&self) -> Self {
        Self {
            scenes: self.scenes.clone(),
            other_scenes: self.other_scenes.clone(),
            results: self.results.clone(),
            data: self
                .data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone_data()))
                .collect(),
            history: self.history.clone(),
            stake: self.stake,
            values: self.values.clone(),
        }
    }
}
