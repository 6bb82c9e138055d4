//! # sg-engine — Component-graph slot round engine
//!
//! Computes the outcome of a single slot round by driving a configurable
//! graph of stateful components over a shared symbol grid, from a weighted
//! random source. Certified game math only: no rendering, no input, no
//! settlement.
//!
//! ## Architecture
//!
//! ```text
//! GameLoader (YAML/JSON)
//!     │
//!     v
//! ExecutionGraph ── entry ──> Component ──> Component ──> ...
//!     │                          │
//!     │                          ├── RoundContext (scenes, results, data)
//!     │                          ├── RngSource (live / iterate / replay)
//!     │                          └── ScenePool / PositionPool
//!     v
//! RoundReport + RoundRecord
//! ```
//!
//! One round runs synchronously on one thread; parallelism happens across
//! independent rounds, each owning its context and checking pooled
//! resources out of the shared pools.

pub mod award;
pub mod component;
pub mod components;
pub mod config;
pub mod context;
pub mod data;
pub mod graph;
pub mod player;
pub mod position;
pub mod replay;
pub mod rng;
pub mod scene;
pub mod weight;

pub use award::{Award, AwardEffect, AwardEngine};
pub use component::{
    BoxedComponent, Component, Links, StepChange, StepOutput, StepParams, Transition,
};
pub use config::{
    BuildContext, ComponentDoc, ComponentRegistry, GameDoc, GameLoader, GameMeta, LoadLimits,
    LoadedGame, WeightTableSet,
};
pub use context::{ResultKind, RoundContext, RoundResult};
pub use data::{BasicData, ComponentData, DataBase, DataRecord, DATA_RECORD_VERSION};
pub use graph::{DEFAULT_MAX_STEPS, ExecutionGraph, RoundReport};
pub use player::{PlayerBlob, PlayerKey, PlayerState};
pub use position::{PositionGuard, PositionPool, PositionSet};
pub use replay::{ROUND_RECORD_VERSION, RoundRecord};
pub use rng::{
    ChaChaBackend, Draw, DrawKind, IterateSource, LiveSource, RandomBackend, ReplaySource,
    RngSource,
};
pub use scene::{GridSpec, Scene, ScenePool};
pub use weight::WeightTable;
