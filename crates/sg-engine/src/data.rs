//! Per-component round state
//!
//! Every component owns one `ComponentData` instance per round. The shared
//! `DataBase` tracks which scenes and results the component touched plus
//! its once-per-key fired set; component-specific fields live in the
//! concrete type. Deep cloning must never alias mutable storage — branch
//! exploration clones the whole context to try alternatives without
//! corrupting the original.

use std::any::Any;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Record format version
pub const DATA_RECORD_VERSION: u32 = 1;

/// Fields common to every component's round state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBase {
    /// Scene stack indices this component produced or consumed
    #[serde(default)]
    pub used_scenes: Vec<usize>,
    /// Auxiliary scene stack indices
    #[serde(default)]
    pub used_other_scenes: Vec<usize>,
    /// Result list indices this component appended
    #[serde(default)]
    pub used_results: Vec<usize>,
    /// Keys that have already fired once this round
    #[serde(default)]
    pub fired_keys: BTreeSet<String>,
}

impl DataBase {
    /// Reset everything for a fresh round
    pub fn on_new_round(&mut self) {
        self.used_scenes.clear();
        self.used_other_scenes.clear();
        self.used_results.clear();
        self.fired_keys.clear();
    }

    /// Mark a key fired; false when it already fired this round
    pub fn fire_once(&mut self, key: &str) -> bool {
        self.fired_keys.insert(key.to_string())
    }
}

/// Replay-safe, language-neutral snapshot of one component's round state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Owning component name
    pub component: String,
    /// Record format version
    pub version: u32,
    /// Shared fields
    pub base: DataBase,
    /// Component-specific fields
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl DataRecord {
    /// Record with empty component fields
    pub fn new(component: impl Into<String>, base: DataBase) -> Self {
        Self {
            component: component.into(),
            version: DATA_RECORD_VERSION,
            base,
            fields: serde_json::Map::new(),
        }
    }

    /// Builder: add a component field
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Mutable per-round state owned by one component
pub trait ComponentData: std::fmt::Debug + Send {
    /// Shared fields
    fn base(&self) -> &DataBase;

    /// Shared fields, mutable
    fn base_mut(&mut self) -> &mut DataBase;

    /// Reset for a new round
    fn on_new_round(&mut self);

    /// Reset per-invocation fields on graph re-entry; persistent counters
    /// survive
    fn on_new_step(&mut self) {}

    /// Deep copy with value semantics
    fn clone_data(&self) -> Box<dyn ComponentData>;

    /// Serialize to the audit record
    fn record(&self, component: &str) -> DataRecord;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Data for components with no state beyond the shared fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicData {
    pub base: DataBase,
}

impl ComponentData for BasicData {
    fn base(&self) -> &DataBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DataBase {
        &mut self.base
    }

    fn on_new_round(&mut self) {
        self.base.on_new_round();
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }

    fn record(&self, component: &str) -> DataRecord {
        DataRecord::new(component, self.base.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
