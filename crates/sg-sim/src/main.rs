//! sg-sim CLI — RTP reports from the command line

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sg_engine::GameLoader;
use sg_sim::{SimConfig, SimDriver};

/// Batch simulator for SpinGraph game configs
#[derive(Debug, Parser)]
#[command(name = "sg-sim", version, about)]
struct Args {
    /// Game document (.yaml/.yml/.json)
    #[arg(long)]
    config: PathBuf,

    /// Rounds to simulate
    #[arg(long, default_value_t = 100_000)]
    rounds: u64,

    /// Base RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Stake per round, in stake units
    #[arg(long, default_value_t = 100)]
    stake: i64,

    /// Fan rounds out across threads
    #[arg(long)]
    parallel: bool,

    /// Exhaustively enumerate this component's branches instead of
    /// running a Monte-Carlo batch
    #[arg(long)]
    enumerate: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let loaded = GameLoader::default()
        .load_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let driver = SimDriver::new();

    match &args.enumerate {
        Some(component) => {
            let report = driver
                .enumerate(&loaded.graph, component, args.seed, args.stake)
                .context("branch enumeration failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("game:      {} ({})", loaded.meta.name, loaded.meta.id);
            println!("component: {}", report.component);
            println!("branches:  {}", report.rows.len());
            println!();
            println!("{:>5} {:>8} {:>8} {:>12} {:>10}", "idx", "value", "weight", "p", "win");
            for row in &report.rows {
                println!(
                    "{:>5} {:>8} {:>8} {:>12.6} {:>10}",
                    row.index,
                    row.value,
                    row.weight,
                    report.probability(row),
                    row.win
                );
            }
            println!();
            println!("expected win: {:.4}", report.expected_win());
            println!("expected rtp: {:.4}%", report.rtp(args.stake));
        }
        None => {
            let config = SimConfig {
                rounds: args.rounds,
                seed: args.seed,
                stake: args.stake,
                parallel: args.parallel,
            };
            let stats = driver
                .run(&loaded.graph, &config)
                .context("simulation failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("game:     {} ({})", loaded.meta.name, loaded.meta.id);
            println!("rounds:   {}", stats.rounds);
            println!("stake:    {}", stats.total_stake);
            println!("win:      {}", stats.total_win);
            println!("rtp:      {:.4}%", stats.rtp());
            println!("hit rate: {:.4}%", stats.hit_rate());
            println!("max win:  {}", stats.max_win);
            println!("steps:    {} ({} triggers)", stats.steps, stats.triggers);
        }
    }

    Ok(())
}
