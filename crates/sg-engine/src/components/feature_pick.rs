//! Feature pick — weighted branch point
//!
//! Draws one value from its table and resolves it through the branch map.
//! This is the designated iterate component for exhaustive enumeration:
//! its table is exposed through `branch_weights`, and an `IterateSource`
//! targeting it forces every branch exactly once.

use std::any::Any;

use serde::{Deserialize, Serialize};

use sg_core::SgResult;

use crate::component::{Component, Links, StepOutput, StepParams, Transition};
use crate::config::{BuildContext, ComponentDoc, parse_params};
use crate::context::{ResultKind, RoundContext, RoundResult};
use crate::data::{ComponentData, DataBase, DataRecord};
use crate::weight::WeightTable;

/// Typed config for `feature_pick`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePickConfig {
    /// Branch distribution
    pub table: String,
}

/// Round state of a feature pick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturePickData {
    pub base: DataBase,
    /// Drawn branch value
    pub picked: i64,
    /// Entry index of the drawn branch
    pub pick_index: u32,
    /// True when the draw was forced by an enumeration sweep
    pub forced: bool,
}

impl ComponentData for FeaturePickData {
    fn base(&self) -> &DataBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DataBase {
        &mut self.base
    }

    fn on_new_round(&mut self) {
        self.base.on_new_round();
        self.picked = 0;
        self.pick_index = 0;
        self.forced = false;
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }

    fn record(&self, component: &str) -> DataRecord {
        DataRecord::new(component, self.base.clone())
            .with_field("picked", self.picked)
            .with_field("pick_index", self.pick_index)
            .with_field("forced", self.forced)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Weighted feature selector
pub struct FeaturePick {
    name: String,
    links: Links,
    table: WeightTable,
}

impl FeaturePick {
    /// Build from resolved parts
    pub fn new(name: impl Into<String>, links: Links, table: WeightTable) -> Self {
        Self {
            name: name.into(),
            links,
            table,
        }
    }

    /// Registry builder
    pub fn build(doc: &ComponentDoc, links: Links, bctx: &BuildContext<'_>) -> SgResult<Box<dyn Component>> {
        let config: FeaturePickConfig = parse_params(doc)?;
        let table = bctx.tables.get(&config.table)?.clone();
        Ok(Box::new(Self::new(&doc.name, links, table)))
    }
}

impl Component for FeaturePick {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "feature_pick"
    }

    fn links(&self) -> &Links {
        &self.links
    }

    fn new_data(&self) -> Box<dyn ComponentData> {
        Box::new(FeaturePickData::default())
    }

    fn run(
        &self,
        ctx: &mut RoundContext,
        data: &mut dyn ComponentData,
        step: &mut StepParams<'_>,
    ) -> SgResult<StepOutput> {
        let draw = step.rng.next_draw(&self.name, &self.table)?;

        let scene_index = ctx.scene_count().saturating_sub(1);
        let result_index = ctx.push_result(RoundResult {
            component: self.name.clone(),
            kind: ResultKind::Trigger,
            scene_index,
            positions: Vec::new(),
            symbol: draw.value,
            amount: 0,
        });
        data.base_mut().used_results.push(result_index);
        if let Some(pick) = data.as_any_mut().downcast_mut::<FeaturePickData>() {
            pick.picked = draw.value as i64;
            pick.pick_index = draw.index as u32;
            pick.forced = draw.forced;
        }

        Ok(StepOutput::applied(Transition::Branch(draw.value as i64)))
    }

    fn branch_weights(&self) -> Option<&WeightTable> {
        Some(&self.table)
    }
}
