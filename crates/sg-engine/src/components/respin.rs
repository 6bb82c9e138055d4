//! Respin gate — bounded re-entry into the graph
//!
//! Grants a respin while the trigger symbol is on the grid and the budget
//! allows, jumping back to the configured reel component. The spent
//! counter persists across re-entries; awards can extend the budget by
//! publishing an `extra` value on this component.

use std::any::Any;

use serde::{Deserialize, Serialize};

use sg_core::{SgError, SgResult};

use crate::component::{Component, Links, StepOutput, StepParams, Transition};
use crate::config::{BuildContext, ComponentDoc, parse_params};
use crate::context::{ResultKind, RoundContext, RoundResult};
use crate::data::{ComponentData, DataBase, DataRecord};

/// Key under which awards publish extra respins
pub const EXTRA_KEY: &str = "extra";

/// Typed config for `respin`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespinConfig {
    /// Respin budget per round, before awarded extras
    pub max_respins: u32,
    /// Symbol that keeps the loop alive
    pub trigger_symbol: String,
}

/// Round state of a respin gate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RespinData {
    pub base: DataBase,
    /// Respins granted so far this round; survives re-entry
    pub used: u32,
    /// Whether the current invocation granted a respin
    pub granted: bool,
}

impl ComponentData for RespinData {
    fn base(&self) -> &DataBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DataBase {
        &mut self.base
    }

    fn on_new_round(&mut self) {
        self.base.on_new_round();
        self.used = 0;
        self.granted = false;
    }

    // Only the per-invocation flag resets; the spent counter persists
    fn on_new_step(&mut self) {
        self.granted = false;
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }

    fn record(&self, component: &str) -> DataRecord {
        DataRecord::new(component, self.base.clone())
            .with_field("used", self.used)
            .with_field("granted", self.granted)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Bounded respin loop
pub struct Respin {
    name: String,
    links: Links,
    trigger_symbol: i32,
    max_respins: u32,
}

impl Respin {
    /// Build from resolved parts
    pub fn new(
        name: impl Into<String>,
        links: Links,
        trigger_symbol: i32,
        max_respins: u32,
    ) -> SgResult<Self> {
        let name = name.into();
        if links.jump.is_none() {
            return Err(SgError::config(&name, "respin requires a jump link"));
        }
        Ok(Self {
            name,
            links,
            trigger_symbol,
            max_respins,
        })
    }

    /// Registry builder
    pub fn build(doc: &ComponentDoc, links: Links, bctx: &BuildContext<'_>) -> SgResult<Box<dyn Component>> {
        let config: RespinConfig = parse_params(doc)?;
        let trigger_symbol = bctx.symbols.code(&config.trigger_symbol)?;
        Ok(Box::new(Self::new(
            &doc.name,
            links,
            trigger_symbol,
            config.max_respins,
        )?))
    }
}

impl Component for Respin {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "respin"
    }

    fn links(&self) -> &Links {
        &self.links
    }

    fn new_data(&self) -> Box<dyn ComponentData> {
        Box::new(RespinData::default())
    }

    fn run(
        &self,
        ctx: &mut RoundContext,
        data: &mut dyn ComponentData,
        _step: &mut StepParams<'_>,
    ) -> SgResult<StepOutput> {
        let scene = ctx
            .current_scene()
            .cloned()
            .ok_or_else(|| SgError::config(&self.name, "round has no scene to inspect"))?;

        let extra = ctx.int_value(&self.name, EXTRA_KEY).max(0) as u32;
        let budget = self.max_respins.saturating_add(extra);

        let used = data
            .as_any()
            .downcast_ref::<RespinData>()
            .map(|d| d.used)
            .unwrap_or(0);
        let live = scene.count_symbol(self.trigger_symbol) > 0;

        if !live || used >= budget {
            return Ok(StepOutput::did_nothing(Transition::Default));
        }

        let scene_index = ctx.scene_count() - 1;
        let result_index = ctx.push_result(RoundResult {
            component: self.name.clone(),
            kind: ResultKind::Respin,
            scene_index,
            positions: Vec::new(),
            symbol: self.trigger_symbol,
            amount: 0,
        });
        data.base_mut().used_results.push(result_index);
        if let Some(respin) = data.as_any_mut().downcast_mut::<RespinData>() {
            respin.used += 1;
            respin.granted = true;
        }

        Ok(StepOutput::applied(Transition::Jump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sg_core::ScalarValue;

    use crate::position::PositionPool;
    use crate::rng::LiveSource;
    use crate::scene::{Scene, ScenePool};

    fn gate(max_respins: u32) -> Respin {
        let mut links = Links::next_only("end");
        links.jump = Some("spin".to_string());
        Respin::new("respin", links, 9, max_respins).unwrap()
    }

    fn ctx_with_trigger() -> RoundContext {
        let mut scene = Scene::new(3, 3);
        scene.set(1, 1, 9);
        let mut ctx = RoundContext::new(100);
        ctx.push_base_scene(Arc::new(scene));
        ctx
    }

    fn step_once(component: &Respin, ctx: &mut RoundContext, data: &mut Box<dyn ComponentData>) -> StepOutput {
        let scenes = ScenePool::new();
        let positions = PositionPool::new();
        let mut rng = LiveSource::seeded(0);
        let mut step = StepParams {
            rng: &mut rng,
            scenes: &scenes,
            positions: &positions,
            step_index: 1,
        };
        component.run(ctx, data.as_mut(), &mut step).unwrap()
    }

    #[test]
    fn test_budget_bounds_the_loop() {
        let component = gate(2);
        let mut ctx = ctx_with_trigger();
        let mut data = component.new_data();

        for _ in 0..2 {
            let output = step_once(&component, &mut ctx, &mut data);
            assert_eq!(output.transition, Transition::Jump);
            data.on_new_step();
        }
        let output = step_once(&component, &mut ctx, &mut data);
        assert_eq!(output.change, crate::component::StepChange::DidNothing);
        assert_eq!(output.transition, Transition::Default);
    }

    #[test]
    fn test_awarded_extras_extend_budget() {
        let component = gate(1);
        let mut ctx = ctx_with_trigger();
        let mut data = component.new_data();

        step_once(&component, &mut ctx, &mut data);
        data.on_new_step();

        // Without the award this invocation would be a no-op
        ctx.set_value("respin", EXTRA_KEY, ScalarValue::Int(1));
        let output = step_once(&component, &mut ctx, &mut data);
        assert_eq!(output.transition, Transition::Jump);

        let respin = data.as_any().downcast_ref::<RespinData>().unwrap();
        assert_eq!(respin.used, 2);
    }

    #[test]
    fn test_no_trigger_symbol_is_noop() {
        let component = gate(5);
        let mut ctx = RoundContext::new(100);
        ctx.push_base_scene(Arc::new(Scene::new(3, 3)));
        let mut data = component.new_data();

        let output = step_once(&component, &mut ctx, &mut data);
        assert_eq!(output.change, crate::component::StepChange::DidNothing);
        assert!(ctx.results.is_empty());
    }

    #[test]
    fn test_missing_jump_rejected_at_build() {
        let result = Respin::new("respin", Links::next_only("end"), 9, 1);
        assert!(result.is_err());
    }
}
