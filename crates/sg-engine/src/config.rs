//! Game configuration — document parsing, registry, link resolution
//!
//! A game document (YAML or JSON) declares the grid, the paytable
//! symbols, named weight tables and the component list. Loading resolves
//! symbol names to codes and table names to tables, builds each component
//! through an explicit registry, and wires the links into an
//! `ExecutionGraph`. Everything resolvable is validated at load time;
//! nothing registers itself through global state.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use sg_core::{SgError, SgResult, SymbolDef, SymbolTable};

use crate::award::Award;
use crate::component::{BoxedComponent, Links};
use crate::components;
use crate::graph::{DEFAULT_MAX_STEPS, ExecutionGraph};
use crate::scene::GridSpec;
use crate::weight::WeightTable;

/// Game identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    pub name: String,
    pub id: String,
    /// Configuration version, carried into audit records
    #[serde(default)]
    pub version: u32,
}

/// A weight table entry: raw code or symbol name resolved at load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolRef {
    Code(i32),
    Name(String),
}

/// Weight table as declared in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTableDoc {
    pub values: Vec<SymbolRef>,
    pub weights: Vec<u32>,
}

/// One component declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDoc {
    pub name: String,
    /// Registry label
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub jump: Option<String>,
    #[serde(default)]
    pub branches: BTreeMap<i64, String>,
    #[serde(default)]
    pub awards: Vec<Award>,
    /// Component-specific fields, parsed by the component's builder
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ComponentDoc {
    /// Links as declared
    pub fn links(&self) -> Links {
        Links {
            next: self.next.clone(),
            jump: self.jump.clone(),
            branches: self.branches.clone(),
            awards: self.awards.clone(),
        }
    }
}

/// The full game document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDoc {
    pub game: GameMeta,
    pub grid: GridSpec,
    pub symbols: Vec<SymbolDef>,
    #[serde(default)]
    pub weight_tables: BTreeMap<String, WeightTableDoc>,
    pub components: Vec<ComponentDoc>,
    /// Entry component name
    pub entry: String,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_max_steps() -> u32 {
    DEFAULT_MAX_STEPS
}

/// Parse a component's flattened params into its typed config
pub fn parse_params<T: DeserializeOwned>(doc: &ComponentDoc) -> SgResult<T> {
    serde_json::from_value(serde_json::Value::Object(doc.params.clone()))
        .map_err(|e| SgError::config(&doc.name, format!("invalid {} config: {e}", doc.kind)))
}

/// Named weight tables resolved from the document
#[derive(Debug, Clone, Default)]
pub struct WeightTableSet {
    tables: BTreeMap<String, WeightTable>,
}

impl WeightTableSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table under its name
    pub fn insert(&mut self, table: WeightTable) {
        self.tables.insert(table.name().to_string(), table);
    }

    /// Look up a table by name
    pub fn get(&self, name: &str) -> SgResult<&WeightTable> {
        self.tables
            .get(name)
            .ok_or_else(|| SgError::UnknownWeightTable(name.to_string()))
    }

    /// Table names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Table count
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no tables are stored
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Resolved collaborators handed to component builders
pub struct BuildContext<'a> {
    pub symbols: &'a SymbolTable,
    pub tables: &'a WeightTableSet,
}

/// Builder signature for one component type
pub type BuildFn = fn(&ComponentDoc, Links, &BuildContext<'_>) -> SgResult<BoxedComponent>;

/// Explicit type-label→builder table
///
/// Constructed by the composition root and passed to the loader; nothing
/// is registered through init-time side effects.
#[derive(Default)]
pub struct ComponentRegistry {
    builders: HashMap<String, BuildFn>,
}

impl ComponentRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the reference component set
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("reel_spin", components::ReelSpin::build);
        registry.register("win_check", components::WinCheck::build);
        registry.register("symbol_swap", components::SymbolSwap::build);
        registry.register("feature_pick", components::FeaturePick::build);
        registry.register("respin", components::Respin::build);
        registry
    }

    /// Add or replace a builder
    pub fn register(&mut self, label: impl Into<String>, builder: BuildFn) {
        self.builders.insert(label.into(), builder);
    }

    /// Look up a builder
    pub fn get(&self, label: &str) -> Option<BuildFn> {
        self.builders.get(label).copied()
    }

    /// Registered label count
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Check if no builders are registered
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

/// Structural limits applied before building
#[derive(Debug, Clone)]
pub struct LoadLimits {
    pub max_symbols: usize,
    pub max_components: usize,
    pub max_reels: usize,
    pub max_rows: usize,
    pub max_table_entries: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_symbols: 64,
            max_components: 128,
            max_reels: 10,
            max_rows: 10,
            max_table_entries: 512,
        }
    }
}

/// A loaded, link-resolved game
pub struct LoadedGame {
    pub meta: GameMeta,
    pub graph: ExecutionGraph,
}

impl std::fmt::Debug for LoadedGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedGame")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Document loader
pub struct GameLoader {
    registry: ComponentRegistry,
    limits: LoadLimits,
}

impl GameLoader {
    /// Loader over a registry
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            limits: LoadLimits::default(),
        }
    }

    /// Builder: custom limits
    pub fn with_limits(mut self, limits: LoadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Load a YAML document
    pub fn load_yaml(&self, source: &str) -> SgResult<LoadedGame> {
        let doc: GameDoc = serde_yml::from_str(source)
            .map_err(|e| SgError::Serialization(format!("YAML parse error: {e}")))?;
        self.build(doc)
    }

    /// Load a JSON document
    pub fn load_json(&self, source: &str) -> SgResult<LoadedGame> {
        let doc: GameDoc = serde_json::from_str(source)
            .map_err(|e| SgError::Serialization(format!("JSON parse error: {e}")))?;
        self.build(doc)
    }

    /// Load from a file, dispatching on extension
    pub fn load_path(&self, path: &Path) -> SgResult<LoadedGame> {
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => self.load_yaml(&source),
            Some("json") => self.load_json(&source),
            other => Err(SgError::Serialization(format!(
                "unsupported config extension {other:?}"
            ))),
        }
    }

    /// Validate and assemble the graph
    pub fn build(&self, doc: GameDoc) -> SgResult<LoadedGame> {
        self.check_limits(&doc)?;

        let symbols = SymbolTable::new(doc.symbols)?;

        let mut tables = WeightTableSet::new();
        for (name, table_doc) in &doc.weight_tables {
            let mut values = Vec::with_capacity(table_doc.values.len());
            for value in &table_doc.values {
                values.push(match value {
                    SymbolRef::Code(code) => *code,
                    SymbolRef::Name(symbol) => symbols.code(symbol)?,
                });
            }
            tables.insert(WeightTable::new(name.clone(), values, table_doc.weights.clone())?);
        }

        let bctx = BuildContext {
            symbols: &symbols,
            tables: &tables,
        };
        let mut graph = ExecutionGraph::new(doc.entry, doc.grid).with_max_steps(doc.max_steps);
        for component_doc in &doc.components {
            let builder = self.registry.get(&component_doc.kind).ok_or_else(|| {
                SgError::config(
                    &component_doc.name,
                    format!("unknown component type {}", component_doc.kind),
                )
            })?;
            graph.add(builder(component_doc, component_doc.links(), &bctx)?)?;
        }
        graph.link()?;

        log::info!(
            "loaded game {} ({} components, {} tables)",
            doc.game.id,
            graph.len(),
            tables.len()
        );
        Ok(LoadedGame {
            meta: doc.game,
            graph,
        })
    }

    fn check_limits(&self, doc: &GameDoc) -> SgResult<()> {
        if doc.grid.width == 0 || doc.grid.width > self.limits.max_reels {
            return Err(SgError::config(
                "grid",
                format!("width {} outside 1..={}", doc.grid.width, self.limits.max_reels),
            ));
        }
        if doc.grid.height == 0 || doc.grid.height > self.limits.max_rows {
            return Err(SgError::config(
                "grid",
                format!("height {} outside 1..={}", doc.grid.height, self.limits.max_rows),
            ));
        }
        if doc.symbols.len() > self.limits.max_symbols {
            return Err(SgError::config(
                "symbols",
                format!("{} symbols exceed limit {}", doc.symbols.len(), self.limits.max_symbols),
            ));
        }
        if doc.components.len() > self.limits.max_components {
            return Err(SgError::config(
                "components",
                format!(
                    "{} components exceed limit {}",
                    doc.components.len(),
                    self.limits.max_components
                ),
            ));
        }
        for (name, table) in &doc.weight_tables {
            if table.values.len() > self.limits.max_table_entries {
                return Err(SgError::config(
                    name,
                    format!(
                        "{} entries exceed limit {}",
                        table.values.len(),
                        self.limits.max_table_entries
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Default for GameLoader {
    fn default() -> Self {
        Self::new(ComponentRegistry::with_builtins())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r#"
game:
  name: Test Game
  id: test
  version: 3
grid:
  width: 5
  height: 3
symbols:
  - { code: 1, name: HP1, pays: [20, 100, 500] }
  - { code: 2, name: LP1, pays: [5, 10, 50] }
  - { code: 9, name: SCATTER, kind: scatter }
weight_tables:
  reel:
    values: [HP1, LP1, SCATTER]
    weights: [30, 60, 10]
components:
  - name: spin
    type: reel_spin
    reels: [reel]
    next: win_check
  - name: win_check
    type: win_check
entry: spin
"#;

    #[test]
    fn test_load_minimal_yaml() {
        let loaded = GameLoader::default().load_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(loaded.meta.id, "test");
        assert_eq!(loaded.meta.version, 3);
        assert_eq!(loaded.graph.len(), 2);
        assert_eq!(loaded.graph.entry(), "spin");
    }

    #[test]
    fn test_unknown_symbol_in_table() {
        let source = MINIMAL_YAML.replace("values: [HP1, LP1, SCATTER]", "values: [HP1, GHOST, SCATTER]");
        let err = GameLoader::default().load_yaml(&source).unwrap_err();
        assert!(matches!(err, SgError::UnknownSymbol(_)));
    }

    #[test]
    fn test_unknown_table_reference() {
        let source = MINIMAL_YAML.replace("reels: [reel]", "reels: [missing]");
        let err = GameLoader::default().load_yaml(&source).unwrap_err();
        assert!(matches!(err, SgError::UnknownWeightTable(_)));
    }

    #[test]
    fn test_unknown_component_type() {
        let source = MINIMAL_YAML.replace("type: win_check", "type: warp_drive");
        let err = GameLoader::default().load_yaml(&source).unwrap_err();
        assert!(matches!(err, SgError::Config { .. }));
    }

    #[test]
    fn test_unresolved_next_link() {
        let source = MINIMAL_YAML.replace("next: win_check", "next: ghost");
        assert!(GameLoader::default().load_yaml(&source).is_err());
    }

    #[test]
    fn test_grid_limits() {
        let source = MINIMAL_YAML.replace("width: 5", "width: 50");
        assert!(GameLoader::default().load_yaml(&source).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let loaded = GameLoader::default().load_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(loaded.graph.grid().width, 5);

        // The same document as JSON loads identically
        let doc: GameDoc = serde_yml::from_str(MINIMAL_YAML).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        let from_json = GameLoader::default().load_json(&json).unwrap();
        assert_eq!(from_json.graph.len(), loaded.graph.len());
    }
}
