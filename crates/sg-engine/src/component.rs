//! The component contract
//!
//! A component is one configurable unit of game logic in the execution
//! graph. It reads and mutates the round context, then hands back a
//! transition for the graph to resolve against its configured links. A
//! step that changed nothing observable reports `StepChange::DidNothing`;
//! the graph still advances but records no trigger and applies no awards.

use std::collections::BTreeMap;

use sg_core::SgResult;

use crate::award::Award;
use crate::context::RoundContext;
use crate::data::ComponentData;
use crate::position::PositionPool;
use crate::rng::RngSource;
use crate::scene::ScenePool;
use crate::weight::WeightTable;

/// Configured continuations of one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Links {
    /// Default continuation; `None` ends the round
    pub next: Option<String>,
    /// Conditional jump target
    pub jump: Option<String>,
    /// Branch map keyed by an observed value
    pub branches: BTreeMap<i64, String>,
    /// Side effects applied on a non-no-op step
    pub awards: Vec<Award>,
}

impl Links {
    /// Links with only a default continuation
    pub fn next_only(next: impl Into<String>) -> Self {
        Self {
            next: Some(next.into()),
            ..Self::default()
        }
    }

    /// Terminal links (round ends after the component)
    pub fn terminal() -> Self {
        Self::default()
    }
}

/// How the component wants the graph to continue
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Follow the default `next` link (end of round when unset)
    Default,
    /// Follow the configured `jump` link
    Jump,
    /// Resolve one key through the branch map
    Branch(i64),
    /// Resolve several simultaneously matched keys; evaluated in ascending
    /// order, the last configured match wins
    Branches(Vec<i64>),
    /// Explicit target by name
    To(String),
    /// End the round regardless of links
    End,
}

/// Did the step observably change the round?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChange {
    /// State changed; counts as a trigger and fires awards
    Applied,
    /// Soft no-op; the graph advances without a trigger
    DidNothing,
}

/// Outcome of one component execution
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub transition: Transition,
    pub change: StepChange,
}

impl StepOutput {
    /// A step that changed the round
    pub fn applied(transition: Transition) -> Self {
        Self {
            transition,
            change: StepChange::Applied,
        }
    }

    /// A soft no-op step
    pub fn did_nothing(transition: Transition) -> Self {
        Self {
            transition,
            change: StepChange::DidNothing,
        }
    }
}

/// Per-step collaborators handed to `run`
pub struct StepParams<'a> {
    /// Draw strategy for this round
    pub rng: &'a mut dyn RngSource,
    /// Scene buffer pool
    pub scenes: &'a ScenePool,
    /// Scratch coordinate pool
    pub positions: &'a PositionPool,
    /// 1-based step counter within the round
    pub step_index: u32,
}

/// One configurable unit of game logic
pub trait Component: Send + Sync {
    /// Configured instance name (unique within the graph)
    fn name(&self) -> &str;

    /// Component type label (the registry key)
    fn kind(&self) -> &'static str;

    /// Configured continuations
    fn links(&self) -> &Links;

    /// Fresh round data for this component
    fn new_data(&self) -> Box<dyn ComponentData>;

    /// Execute one step of the round
    fn run(
        &self,
        ctx: &mut RoundContext,
        data: &mut dyn ComponentData,
        step: &mut StepParams<'_>,
    ) -> SgResult<StepOutput>;

    /// Branch weights for exhaustive enumeration, when this component is a
    /// weighted branch point
    fn branch_weights(&self) -> Option<&WeightTable> {
        None
    }
}

/// Boxed component, as stored by the graph
pub type BoxedComponent = Box<dyn Component>;
