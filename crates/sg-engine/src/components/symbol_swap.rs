//! Symbol swap — replaces a symbol with a freshly drawn one
//!
//! Scans the current scene for the source symbol, draws a replacement
//! from a weight table with the previously drawn value excluded, and
//! rewrites the matching cells on a forked scene. When the exclusion
//! empties the distribution the component falls back to the unfiltered
//! table; a scene without the source symbol is a soft no-op.

use std::any::Any;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use sg_core::{EMPTY_SYMBOL, SgError, SgResult};

use crate::component::{Component, Links, StepOutput, StepParams, Transition};
use crate::config::{BuildContext, ComponentDoc, parse_params};
use crate::context::RoundContext;
use crate::data::{ComponentData, DataBase, DataRecord};
use crate::weight::WeightTable;

/// Typed config for `symbol_swap`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSwapConfig {
    /// Symbol to replace
    pub source: String,
    /// Replacement distribution
    pub table: String,
}

/// Round state of a symbol swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSwapData {
    pub base: DataBase,
    /// Value drawn on the most recent swap; excluded from the next draw
    pub last_drawn: i32,
    /// Cells rewritten in the current invocation
    pub swapped: u32,
}

impl Default for SymbolSwapData {
    fn default() -> Self {
        Self {
            base: DataBase::default(),
            last_drawn: EMPTY_SYMBOL,
            swapped: 0,
        }
    }
}

impl ComponentData for SymbolSwapData {
    fn base(&self) -> &DataBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DataBase {
        &mut self.base
    }

    fn on_new_round(&mut self) {
        self.base.on_new_round();
        self.last_drawn = EMPTY_SYMBOL;
        self.swapped = 0;
    }

    // last_drawn survives re-entry: the exclusion spans the whole round
    fn on_new_step(&mut self) {
        self.swapped = 0;
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }

    fn record(&self, component: &str) -> DataRecord {
        DataRecord::new(component, self.base.clone())
            .with_field("last_drawn", self.last_drawn)
            .with_field("swapped", self.swapped)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Symbol replacement with repeat avoidance
pub struct SymbolSwap {
    name: String,
    links: Links,
    source: i32,
    table: WeightTable,
}

impl SymbolSwap {
    /// Build from resolved parts
    pub fn new(name: impl Into<String>, links: Links, source: i32, table: WeightTable) -> Self {
        Self {
            name: name.into(),
            links,
            source,
            table,
        }
    }

    /// Registry builder
    pub fn build(doc: &ComponentDoc, links: Links, bctx: &BuildContext<'_>) -> SgResult<Box<dyn Component>> {
        let config: SymbolSwapConfig = parse_params(doc)?;
        let source = bctx.symbols.code(&config.source)?;
        let table = bctx.tables.get(&config.table)?.clone();
        Ok(Box::new(Self::new(&doc.name, links, source, table)))
    }
}

impl Component for SymbolSwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "symbol_swap"
    }

    fn links(&self) -> &Links {
        &self.links
    }

    fn new_data(&self) -> Box<dyn ComponentData> {
        Box::new(SymbolSwapData::default())
    }

    fn run(
        &self,
        ctx: &mut RoundContext,
        data: &mut dyn ComponentData,
        step: &mut StepParams<'_>,
    ) -> SgResult<StepOutput> {
        let scene = ctx
            .current_scene()
            .cloned()
            .ok_or_else(|| SgError::config(&self.name, "round has no scene to rewrite"))?;

        let mut hits = step.positions.checkout();
        for x in 0..scene.width() {
            for y in 0..scene.height() {
                if scene.get(x, y) == self.source {
                    hits.push(x as i32, y as i32);
                }
            }
        }
        if hits.is_empty() {
            return Ok(StepOutput::did_nothing(Transition::Default));
        }

        let last_drawn = data
            .as_any()
            .downcast_ref::<SymbolSwapData>()
            .map(|d| d.last_drawn)
            .unwrap_or(EMPTY_SYMBOL);

        let filtered = if last_drawn != EMPTY_SYMBOL {
            self.table.without_values(&[last_drawn])
        } else {
            self.table.clone()
        };
        let draw = if filtered.is_exhausted() {
            // Excluding the previous value emptied the distribution; the
            // unfiltered table is the configured fallback
            warn!("{}: exclusion exhausted table {}, using unfiltered", self.name, self.table.name());
            step.rng.next_draw(&self.name, &self.table)?
        } else {
            step.rng.next_draw(&self.name, &filtered)?
        };

        let mut fork = step.scenes.fork(&scene);
        for (x, y) in hits.iter() {
            fork.set(x as usize, y as usize, draw.value);
        }
        let scene_index = ctx
            .commit_scene(Arc::new(fork))
            .unwrap_or_else(|| ctx.scene_count() - 1);

        data.base_mut().used_scenes.push(scene_index);
        if let Some(swap) = data.as_any_mut().downcast_mut::<SymbolSwapData>() {
            swap.last_drawn = draw.value;
            swap.swapped = hits.len() as u32;
        }

        Ok(StepOutput::applied(Transition::Default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionPool;
    use crate::rng::LiveSource;
    use crate::scene::{Scene, ScenePool};

    fn run_once(
        component: &SymbolSwap,
        ctx: &mut RoundContext,
        rng: &mut LiveSource,
        scenes: &ScenePool,
        positions: &PositionPool,
    ) -> StepOutput {
        let mut data = ctx.take_data("swap").unwrap();
        let mut step = StepParams {
            rng,
            scenes,
            positions,
            step_index: 1,
        };
        let output = component.run(ctx, data.as_mut(), &mut step).unwrap();
        ctx.put_data("swap", data);
        output
    }

    fn setup(component: &SymbolSwap, cells: &[(usize, usize, i32)]) -> RoundContext {
        let mut scene = Scene::new(3, 3);
        scene.fill(1);
        for &(x, y, code) in cells {
            scene.set(x, y, code);
        }
        let mut ctx = RoundContext::new(100);
        ctx.push_base_scene(Arc::new(scene));
        ctx.insert_data("swap", component.new_data());
        ctx
    }

    #[test]
    fn test_swaps_all_occurrences() {
        let component = SymbolSwap::new(
            "swap",
            Links::terminal(),
            5,
            WeightTable::from_pairs("swaps", &[(7, 1)]),
        );
        let scenes = ScenePool::new();
        let positions = PositionPool::new();
        let mut ctx = setup(&component, &[(0, 0, 5), (2, 2, 5)]);
        let mut rng = LiveSource::seeded(4);

        let output = run_once(&component, &mut ctx, &mut rng, &scenes, &positions);
        assert_eq!(output.change, crate::component::StepChange::Applied);

        let scene = ctx.current_scene().unwrap();
        assert_eq!(scene.count_symbol(5), 0);
        assert_eq!(scene.count_symbol(7), 2);
        assert_eq!(ctx.scene_count(), 2);
        // Scratch set went back to the pool
        assert_eq!(positions.pooled(), 1);
    }

    #[test]
    fn test_no_source_symbol_is_noop() {
        let component = SymbolSwap::new(
            "swap",
            Links::terminal(),
            5,
            WeightTable::from_pairs("swaps", &[(7, 1)]),
        );
        let scenes = ScenePool::new();
        let positions = PositionPool::new();
        let mut ctx = setup(&component, &[]);
        let before = Arc::clone(ctx.current_scene().unwrap());
        let mut rng = LiveSource::seeded(4);

        let output = run_once(&component, &mut ctx, &mut rng, &scenes, &positions);
        assert_eq!(output.change, crate::component::StepChange::DidNothing);
        assert!(Arc::ptr_eq(&before, ctx.current_scene().unwrap()));
    }

    #[test]
    fn test_single_value_table_falls_back() {
        // One-entry table: after the first draw the exclusion empties it,
        // so the second invocation must fall back instead of failing
        let component = SymbolSwap::new(
            "swap",
            Links::terminal(),
            5,
            WeightTable::from_pairs("swaps", &[(7, 1)]),
        );
        let scenes = ScenePool::new();
        let positions = PositionPool::new();
        let mut ctx = setup(&component, &[(0, 0, 5)]);
        let mut rng = LiveSource::seeded(4);

        run_once(&component, &mut ctx, &mut rng, &scenes, &positions);
        // Re-introduce the source symbol and run again
        let mut scene = scenes.fork(ctx.current_scene().unwrap());
        scene.set(1, 1, 5);
        ctx.commit_scene(Arc::new(scene));

        let output = run_once(&component, &mut ctx, &mut rng, &scenes, &positions);
        assert_eq!(output.change, crate::component::StepChange::Applied);
        assert_eq!(ctx.current_scene().unwrap().count_symbol(7), 2);
    }
}
