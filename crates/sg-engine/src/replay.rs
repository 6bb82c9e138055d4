//! Round records — the replay/audit surface
//!
//! One record per round: the recorded draw-index tape, every component's
//! data record, the result list and the final scene. The format is a
//! field-for-field mirror of in-memory state and must stay stable for a
//! given configuration version; replaying the tape against the same
//! configuration reproduces the round exactly.

use serde::{Deserialize, Serialize};

use sg_core::{SgResult, SgError};

use crate::context::{RoundContext, RoundResult};
use crate::data::DataRecord;
use crate::graph::ExecutionGraph;
use crate::rng::ReplaySource;
use crate::scene::Scene;

/// Record format version
pub const ROUND_RECORD_VERSION: u32 = 1;

/// Serialized outcome of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Record format version
    pub version: u32,
    /// Game configuration version the round ran under
    pub game_version: u32,
    /// Stake in stake units
    pub stake: i64,
    /// Recorded draw-index tape
    pub draws: Vec<usize>,
    /// Per-component data records, in declaration order
    pub data: Vec<DataRecord>,
    /// Discrete events
    pub results: Vec<RoundResult>,
    /// Final primary scene
    pub final_scene: Option<Scene>,
}

impl RoundRecord {
    /// Capture a completed round
    pub fn capture(
        graph: &ExecutionGraph,
        ctx: &RoundContext,
        game_version: u32,
        draws: Vec<usize>,
    ) -> Self {
        Self {
            version: ROUND_RECORD_VERSION,
            game_version,
            stake: ctx.stake,
            draws,
            data: graph.records(ctx),
            results: ctx.results.clone(),
            final_scene: ctx.current_scene().map(|s| Scene::clone(s)),
        }
    }

    /// A replay source over the recorded tape
    pub fn replay_source(&self) -> ReplaySource {
        ReplaySource::new(self.draws.clone())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> SgResult<String> {
        serde_json::to_string(self).map_err(|e| SgError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> SgResult<Self> {
        serde_json::from_str(json).map_err(|e| SgError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataBase, DataRecord};

    #[test]
    fn test_json_round_trip() {
        let record = RoundRecord {
            version: ROUND_RECORD_VERSION,
            game_version: 2,
            stake: 100,
            draws: vec![0, 3, 1],
            data: vec![DataRecord::new("spin", DataBase::default()).with_field("trigger_count", 1)],
            results: Vec::new(),
            final_scene: Some(Scene::new(3, 3)),
        };

        let json = record.to_json().unwrap();
        let back = RoundRecord::from_json(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_replay_source_covers_tape() {
        let record = RoundRecord {
            version: ROUND_RECORD_VERSION,
            game_version: 0,
            stake: 1,
            draws: vec![2, 2, 0],
            data: Vec::new(),
            results: Vec::new(),
            final_scene: None,
        };
        assert_eq!(record.replay_source().remaining(), 3);
    }
}
