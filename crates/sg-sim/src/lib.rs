//! # sg-sim — Batch simulation over the round engine
//!
//! Two modes over a loaded game:
//!
//! - **Monte-Carlo batches**: N independent rounds, serial or parallel
//!   across threads, aggregated into `SimStats`. Each round owns its
//!   context; only the scene/position pools are shared.
//! - **Exhaustive enumeration**: every weighted branch of a designated
//!   component visited exactly once with an `IterateSource`, producing a
//!   per-branch probability/payout table for RTP audits.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use sg_core::{SgError, SgResult};
use sg_engine::{ExecutionGraph, IterateSource, LiveSource, PositionPool, RngSource, ScenePool};

/// Batch parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Rounds to run
    pub rounds: u64,
    /// Base seed; round i runs on `seed + i`
    pub seed: u64,
    /// Stake per round, in stake units
    pub stake: i64,
    /// Fan rounds out across threads
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds: 10_000,
            seed: 1,
            stake: 100,
            parallel: false,
        }
    }
}

/// Aggregate batch statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub rounds: u64,
    pub total_stake: i64,
    pub total_win: i64,
    /// Rounds with any win
    pub wins: u64,
    /// Component steps that observably changed a round
    pub triggers: u64,
    /// Component steps executed
    pub steps: u64,
    /// Largest single-round win
    pub max_win: i64,
}

impl SimStats {
    /// Return-to-player, percent
    pub fn rtp(&self) -> f64 {
        if self.total_stake > 0 {
            self.total_win as f64 / self.total_stake as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Winning-round rate, percent
    pub fn hit_rate(&self) -> f64 {
        if self.rounds > 0 {
            self.wins as f64 / self.rounds as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Fold another batch into this one
    pub fn merge(&mut self, other: &SimStats) {
        self.rounds += other.rounds;
        self.total_stake += other.total_stake;
        self.total_win += other.total_win;
        self.wins += other.wins;
        self.triggers += other.triggers;
        self.steps += other.steps;
        self.max_win = self.max_win.max(other.max_win);
    }
}

/// One branch row of an enumeration sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutcome {
    /// Branch entry index, in declared order
    pub index: usize,
    /// Branch value
    pub value: i32,
    /// Declared weight
    pub weight: u32,
    /// Round win under this branch
    pub win: i64,
    /// Steps the round took
    pub steps: u32,
}

/// Result of an exhaustive branch sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationReport {
    /// Swept component
    pub component: String,
    /// Sum of declared weights
    pub total_weight: u32,
    pub rows: Vec<BranchOutcome>,
}

impl EnumerationReport {
    /// Probability of one branch
    pub fn probability(&self, row: &BranchOutcome) -> f64 {
        if self.total_weight > 0 {
            row.weight as f64 / self.total_weight as f64
        } else {
            0.0
        }
    }

    /// Probability-weighted win across branches
    pub fn expected_win(&self) -> f64 {
        self.rows
            .iter()
            .map(|row| self.probability(row) * row.win as f64)
            .sum()
    }

    /// Expected RTP for a stake, percent
    pub fn rtp(&self, stake: i64) -> f64 {
        if stake > 0 {
            self.expected_win() / stake as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Drives batches of rounds against one graph
pub struct SimDriver {
    scenes: ScenePool,
    positions: PositionPool,
}

impl SimDriver {
    /// Driver with fresh pools
    pub fn new() -> Self {
        Self {
            scenes: ScenePool::new(),
            positions: PositionPool::new(),
        }
    }

    /// Run a Monte-Carlo batch
    pub fn run(&self, graph: &ExecutionGraph, config: &SimConfig) -> SgResult<SimStats> {
        log::info!(
            "simulating {} rounds (seed {}, stake {}, parallel={})",
            config.rounds,
            config.seed,
            config.stake,
            config.parallel
        );
        if config.parallel {
            (0..config.rounds)
                .into_par_iter()
                .map(|i| self.run_one(graph, config.seed.wrapping_add(i), config.stake))
                .try_reduce(SimStats::default, |mut acc, batch| {
                    acc.merge(&batch);
                    Ok(acc)
                })
        } else {
            let mut stats = SimStats::default();
            for i in 0..config.rounds {
                let round = self.run_one(graph, config.seed.wrapping_add(i), config.stake)?;
                stats.merge(&round);
            }
            Ok(stats)
        }
    }

    /// One independent round
    fn run_one(&self, graph: &ExecutionGraph, seed: u64, stake: i64) -> SgResult<SimStats> {
        let mut ctx = graph.new_round(stake, &self.scenes);
        let mut rng = LiveSource::seeded(seed);
        let report = graph.run_round(&mut ctx, &mut rng, &self.scenes, &self.positions)?;

        let win = ctx.total_win();
        let stats = SimStats {
            rounds: 1,
            total_stake: stake,
            total_win: win,
            wins: u64::from(win > 0),
            triggers: u64::from(report.triggers),
            steps: u64::from(report.steps),
            max_win: win,
        };
        ctx.release(&self.scenes);
        Ok(stats)
    }

    /// Sweep every weighted branch of `component` exactly once
    pub fn enumerate(
        &self,
        graph: &ExecutionGraph,
        component: &str,
        seed: u64,
        stake: i64,
    ) -> SgResult<EnumerationReport> {
        let table = graph
            .component(component)
            .ok_or_else(|| SgError::UnknownComponent(component.to_string()))?
            .branch_weights()
            .ok_or_else(|| SgError::config(component, "component exposes no branch weights"))?
            .clone();

        let mut source = IterateSource::seeded(component, seed);
        let mut rows = Vec::with_capacity(table.len());
        while !source.is_iterate_ending() {
            let before = source.visited();
            let mut ctx = graph.new_round(stake, &self.scenes);
            let report = graph.run_round(&mut ctx, &mut source, &self.scenes, &self.positions)?;
            if source.visited() == before {
                return Err(SgError::config(
                    component,
                    "iterate component was not reached by the round",
                ));
            }

            let index = before;
            rows.push(BranchOutcome {
                index,
                value: table.value_at(index).unwrap_or_default(),
                weight: table.weight_at(index).unwrap_or(0),
                win: ctx.total_win(),
                steps: report.steps,
            });
            ctx.release(&self.scenes);
        }

        Ok(EnumerationReport {
            component: component.to_string(),
            total_weight: table.max_weight(),
            rows,
        })
    }
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_engine::GameLoader;

    const GAME_YAML: &str = r#"
game:
  name: Sim Game
  id: sim
grid:
  width: 5
  height: 3
symbols:
  - { code: 1, name: HP1, pays: [20, 100, 500] }
  - { code: 2, name: LP1, pays: [5, 10, 50] }
  - { code: 3, name: LP2, pays: [2, 5, 20] }
weight_tables:
  reel:
    values: [HP1, LP1, LP2]
    weights: [20, 40, 40]
  features:
    values: [1, 2]
    weights: [75, 25]
components:
  - name: spin
    type: reel_spin
    reels: [reel]
    next: win_check
  - name: win_check
    type: win_check
    next: pick
  - name: pick
    type: feature_pick
    table: features
    branches:
      1: end_a
      2: end_b
  - name: end_a
    type: win_check
  - name: end_b
    type: win_check
entry: spin
"#;

    #[test]
    fn test_batch_is_deterministic() {
        let loaded = GameLoader::default().load_yaml(GAME_YAML).unwrap();
        let driver = SimDriver::new();
        let config = SimConfig {
            rounds: 200,
            seed: 5,
            stake: 100,
            parallel: false,
        };

        let a = driver.run(&loaded.graph, &config).unwrap();
        let b = driver.run(&loaded.graph, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.rounds, 200);
        assert_eq!(a.total_stake, 200 * 100);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let loaded = GameLoader::default().load_yaml(GAME_YAML).unwrap();
        let driver = SimDriver::new();
        let mut config = SimConfig {
            rounds: 200,
            seed: 5,
            stake: 100,
            parallel: false,
        };

        let serial = driver.run(&loaded.graph, &config).unwrap();
        config.parallel = true;
        let parallel = driver.run(&loaded.graph, &config).unwrap();
        // Per-round seeds are independent of scheduling
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_stats_ratios() {
        let mut stats = SimStats::default();
        stats.merge(&SimStats {
            rounds: 1,
            total_stake: 100,
            total_win: 50,
            wins: 1,
            triggers: 2,
            steps: 3,
            max_win: 50,
        });
        stats.merge(&SimStats {
            rounds: 1,
            total_stake: 100,
            total_win: 0,
            wins: 0,
            triggers: 1,
            steps: 3,
            max_win: 0,
        });

        assert!((stats.rtp() - 25.0).abs() < 1e-9);
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
        assert_eq!(stats.max_win, 50);
    }

    #[test]
    fn test_enumeration_covers_all_branches() {
        let loaded = GameLoader::default().load_yaml(GAME_YAML).unwrap();
        let driver = SimDriver::new();

        let report = driver.enumerate(&loaded.graph, "pick", 3, 100).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total_weight, 100);
        assert_eq!(report.rows[0].index, 0);
        assert_eq!(report.rows[1].index, 1);
        let p0 = report.probability(&report.rows[0]);
        assert!((p0 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_enumeration_rejects_unweighted_component() {
        let loaded = GameLoader::default().load_yaml(GAME_YAML).unwrap();
        let driver = SimDriver::new();
        assert!(driver.enumerate(&loaded.graph, "spin", 0, 100).is_err());
        assert!(driver.enumerate(&loaded.graph, "ghost", 0, 100).is_err());
    }
}
