//! Headless Foundry scenario runner.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in scenario for its default length
//! cargo run -p foundry_headless
//!
//! # Run a scenario file for 3000 ticks with a fixed seed
//! cargo run -p foundry_headless -- --scenario river.ron --ticks 3000 --seed 7
//!
//! # Machine-readable summary
//! cargo run -p foundry_headless -- --json
//! ```
//!
//! Logs (stderr) follow `RUST_LOG`; `--verbose` raises the default to debug.

use std::path::PathBuf;

use clap::Parser;
use foundry_core::data::ContentRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foundry_headless::{verify_determinism, HeadlessConfig, HeadlessRunner, RunSummary, Scenario};

#[derive(Parser)]
#[command(name = "foundry_headless")]
#[command(about = "Headless scenario runner for CI verification and tuning")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Number of ticks to simulate (defaults to the scenario's own length)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Scenario file (RON). Uses the built-in meltdown scenario if absent
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Extra content definitions (RON) merged over the standard set
    #[arg(short, long)]
    content: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Run the scenario this many times and compare final state hashes
    #[arg(long, value_name = "RUNS")]
    verify: Option<u32>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for the summary)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let scenario = match &cli.scenario {
        Some(path) => match Scenario::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to load scenario: {e}");
                std::process::exit(1);
            }
        },
        None => Scenario::reactor_meltdown(),
    };

    let content = match load_content(cli.content.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load content: {e}");
            std::process::exit(1);
        }
    };

    let config = HeadlessConfig {
        ticks: cli.ticks,
        seed: cli.seed,
    };

    if let Some(runs) = cli.verify {
        cmd_verify(&scenario, &content, &config, runs);
        return;
    }

    tracing::info!(scenario = %scenario.name, "Starting run");
    let runner = match HeadlessRunner::new(&scenario, content, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    };
    let summary = runner.run();

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to encode summary: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print_summary(&summary);
    }
}

fn load_content(path: Option<&PathBuf>) -> Result<ContentRegistry, Box<dyn std::error::Error>> {
    let mut content = ContentRegistry::standard();
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)?;
        content.merge_ron_str(&path.display().to_string(), &text)?;
    }
    Ok(content)
}

fn cmd_verify(scenario: &Scenario, content: &ContentRegistry, config: &HeadlessConfig, runs: u32) {
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    match verify_determinism(scenario, content, config, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("Scenario:  {}", summary.scenario);
    println!("Seed:      {}", summary.seed);
    println!("Ticks:     {}", summary.ticks);
    println!("Hash:      {:016x}", summary.final_hash);
    println!("Units:     {} alive, {} died", summary.units_alive, summary.unit_deaths);
    println!(
        "Blocks:    {} destroyed, {} explosions",
        summary.structures_destroyed, summary.explosions
    );
    println!(
        "Effects:   {} immediate, {} delayed, {} dropped, {} shakes",
        summary.effects_requested,
        summary.deferred_effects,
        summary.dropped_effects,
        summary.shakes
    );
    println!("Power:     {:.2}", summary.power_produced);
}
