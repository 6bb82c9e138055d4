//! Execution graph — the state machine that drives one round
//!
//! States are named components; a component's `run` is the transition
//! function. Execution starts at the configured entry and continues until
//! a component resolves to no continuation. Soft no-ops advance without a
//! trigger; any hard error aborts the round and is surfaced to the caller
//! untouched.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use sg_core::{SgError, SgResult};

use crate::award::AwardEngine;
use crate::component::{BoxedComponent, Component, StepChange, StepParams, Transition};
use crate::context::RoundContext;
use crate::data::DataRecord;
use crate::position::PositionPool;
use crate::rng::RngSource;
use crate::scene::{GridSpec, ScenePool};

/// Default ceiling on steps per round, against mis-configured cycles
pub const DEFAULT_MAX_STEPS: u32 = 1024;

/// Aggregate of one driven round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Components executed
    pub steps: u32,
    /// Steps that observably changed the round
    pub triggers: u32,
}

/// The component state machine
pub struct ExecutionGraph {
    components: HashMap<String, BoxedComponent>,
    /// Declaration order, for stable iteration and records
    order: Vec<String>,
    entry: String,
    grid: GridSpec,
    awards: AwardEngine,
    max_steps: u32,
}

impl ExecutionGraph {
    /// Graph with an entry component name and a grid size for base scenes
    pub fn new(entry: impl Into<String>, grid: GridSpec) -> Self {
        Self {
            components: HashMap::new(),
            order: Vec::new(),
            entry: entry.into(),
            grid,
            awards: AwardEngine::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Builder: override the per-round step ceiling
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Register a component; duplicate names are a configuration error
    pub fn add(&mut self, component: BoxedComponent) -> SgResult<()> {
        let name = component.name().to_string();
        if self.components.contains_key(&name) {
            return Err(SgError::config(&name, "duplicate component name"));
        }
        self.order.push(name.clone());
        self.components.insert(name, component);
        Ok(())
    }

    /// Resolve links: entry, every `next`/`jump`/branch target and every
    /// award target must name a registered component. Call once after all
    /// `add`s; detects configuration errors at load time instead of at
    /// first use.
    pub fn link(&mut self) -> SgResult<()> {
        if !self.components.contains_key(&self.entry) {
            return Err(SgError::UnknownComponent(self.entry.clone()));
        }
        self.awards = AwardEngine::new(self.components.keys().cloned().collect());

        for name in &self.order {
            let links = self.components[name].links();
            let mut targets: Vec<(&str, &String)> = Vec::new();
            if let Some(next) = &links.next {
                targets.push(("next", next));
            }
            if let Some(jump) = &links.jump {
                targets.push(("jump", jump));
            }
            for target in links.branches.values() {
                targets.push(("branch", target));
            }
            for (link, target) in targets {
                if !self.components.contains_key(target) {
                    return Err(SgError::config(
                        name,
                        format!("{link} link references unknown component {target}"),
                    ));
                }
            }
            self.awards.validate(name, &links.awards)?;
        }
        Ok(())
    }

    /// Entry component name
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Grid size used for base scenes
    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    /// Look up a component
    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    /// Component names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Registered component count
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if no components are registered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Fresh round context: one data instance per component and the base
    /// scene checked out of the pool
    pub fn new_round(&self, stake: i64, scenes: &ScenePool) -> RoundContext {
        let mut ctx = RoundContext::new(stake);
        for name in &self.order {
            ctx.insert_data(name.clone(), self.components[name].new_data());
        }
        ctx.push_base_scene(Arc::new(scenes.checkout(self.grid.width, self.grid.height)));
        ctx
    }

    /// Drive one round to completion
    pub fn run_round(
        &self,
        ctx: &mut RoundContext,
        rng: &mut dyn RngSource,
        scenes: &ScenePool,
        positions: &PositionPool,
    ) -> SgResult<RoundReport> {
        ctx.reset_for_round();
        let mut report = RoundReport::default();
        let mut current = self.entry.clone();

        while !current.is_empty() {
            report.steps += 1;
            if report.steps > self.max_steps {
                return Err(SgError::StepLimit {
                    component: current,
                    limit: self.max_steps,
                });
            }

            let component = self
                .components
                .get(&current)
                .ok_or_else(|| SgError::UnknownComponent(current.clone()))?;

            let re_entry = ctx.has_run(&current);
            let mut data = ctx.take_data(&current)?;
            if re_entry {
                data.on_new_step();
            }
            ctx.record_history(&current);

            let mut step = StepParams {
                rng: &mut *rng,
                scenes,
                positions,
                step_index: report.steps,
            };
            let run_result = component.run(ctx, data.as_mut(), &mut step);
            ctx.put_data(&current, data);
            let output = run_result?;

            match output.change {
                StepChange::Applied => {
                    report.triggers += 1;
                    let links = component.links();
                    if !links.awards.is_empty() {
                        self.awards.apply(&current, &links.awards, ctx)?;
                    }
                }
                StepChange::DidNothing => {
                    trace!("{current}: did nothing");
                }
            }

            let next = self.resolve(component.as_ref(), &output.transition)?;
            debug!(
                "step {}: {current} -> {}",
                report.steps,
                next.as_deref().unwrap_or("(end)")
            );
            current = next.unwrap_or_default();
        }

        Ok(report)
    }

    /// Map a transition onto the component's configured links
    fn resolve(&self, component: &dyn Component, transition: &Transition) -> SgResult<Option<String>> {
        let links = component.links();
        match transition {
            Transition::Default => Ok(links.next.clone()),
            Transition::End => Ok(None),
            Transition::Jump => links
                .jump
                .clone()
                .map(Some)
                .ok_or_else(|| SgError::MissingLink {
                    component: component.name().to_string(),
                    link: "jump".to_string(),
                }),
            Transition::To(name) => {
                if !self.components.contains_key(name) {
                    return Err(SgError::UnknownComponent(name.clone()));
                }
                Ok(Some(name.clone()))
            }
            Transition::Branch(key) => self.resolve_branches(component, &[*key]),
            Transition::Branches(keys) => self.resolve_branches(component, keys),
        }
    }

    /// Branch-map resolution. Keys are evaluated in ascending order and
    /// the last configured match wins; with no configured match the
    /// default `next` link is followed when present.
    fn resolve_branches(&self, component: &dyn Component, keys: &[i64]) -> SgResult<Option<String>> {
        let links = component.links();
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();

        let mut chosen: Option<&String> = None;
        for key in &sorted {
            if let Some(target) = links.branches.get(key) {
                chosen = Some(target);
            }
        }
        match chosen {
            Some(target) => Ok(Some(target.clone())),
            None if links.next.is_some() => Ok(links.next.clone()),
            None => Err(SgError::MissingLink {
                component: component.name().to_string(),
                link: format!("branch {sorted:?}"),
            }),
        }
    }

    /// Audit records for every component, in declaration order
    pub fn records(&self, ctx: &RoundContext) -> Vec<DataRecord> {
        self.order
            .iter()
            .filter_map(|name| ctx.data(name).map(|d| d.record(name)))
            .collect()
    }
}
