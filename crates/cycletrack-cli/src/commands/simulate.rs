use chrono::NaiveDate;
use clap::Args;

use cycletrack_core::{simulate_history, Database, SimulationConfig};

use super::{parse_day, print_json};

#[derive(Args)]
pub struct SimulateArgs {
    /// First day of the first period
    #[arg(long, value_parser = parse_day, default_value = "2025-01-01")]
    start: NaiveDate,
    /// Number of cycles
    #[arg(long, default_value_t = 6)]
    cycles: u32,
    /// Mean cycle length in days
    #[arg(long, default_value_t = 28)]
    cycle_length: u32,
    /// Per-cycle jitter in days
    #[arg(long, default_value_t = 2)]
    jitter: u32,
    /// Bleeding days per period
    #[arg(long, default_value_t = 5)]
    bleed: u32,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Store the history instead of printing it
    #[arg(long)]
    import: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = SimulationConfig {
        start: args.start,
        cycles: args.cycles,
        base_cycle_length: args.cycle_length,
        cycle_jitter_days: args.jitter,
        bleed_duration: args.bleed,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    let observations = simulate_history(&config)?;

    if args.import {
        let db = Database::open()?;
        let count = db.upsert_observations(&observations)?;
        println!("imported {count} observations");
    } else {
        print_json(&observations)?;
    }
    Ok(())
}
