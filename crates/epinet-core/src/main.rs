//! Epistemic network simulation runner
//!
//! Runs a configuration a number of times with consecutive seeds and prints
//! one JSON result per line. Aggregation across runs is left to downstream
//! tooling.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use epinet_core::{default_config_toml, SimConfig, Simulation, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "epinet")]
#[command(about = "Epistemic network simulations: consensus, polarization and abandonment")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a configuration and print one JSON result per run
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Number of independent runs
        #[arg(short, long, default_value_t = 1)]
        runs: u32,

        /// Seed of the first run; run i uses seed + i
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Print each run's founding network to stderr
        #[arg(long)]
        snapshot: bool,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Print a default configuration file
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            runs,
            seed,
            snapshot,
        } => run(&config, runs, seed, snapshot),
        Commands::Check { config } => check(&config),
        Commands::DefaultConfig => {
            print!("{}", default_config_toml());
            Ok(())
        }
    }
}

fn load(path: &Path) -> anyhow::Result<SimConfig> {
    SimConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn run(path: &Path, runs: u32, seed: u64, snapshot: bool) -> anyhow::Result<()> {
    let config = load(path)?;
    config.validate().with_context(|| format!("invalid configuration in {}", path.display()))?;

    for i in 0..runs {
        let run_seed = seed.wrapping_add(u64::from(i));
        let simulation = Simulation::new(config.clone(), SmallRng::seed_from_u64(run_seed))?;
        if snapshot {
            eprintln!("{}", simulation.network().snapshot().to_json()?);
        }
        let result = simulation.run().with_context(|| format!("run {} (seed {}) failed", i, run_seed))?;
        println!("{}", result.to_json()?);
    }

    Ok(())
}

fn check(path: &Path) -> anyhow::Result<()> {
    let config = load(path)?;
    config.validate().with_context(|| format!("invalid configuration in {}", path.display()))?;

    let mode = if config.is_lifecycle_mode() { "lifecycle" } else { "stable outcome" };
    println!(
        "{}: OK ({} agents, {} topology, {} mode, {} rounds)",
        path.display(),
        config.network.population,
        config.network.topology,
        mode,
        config.simulation.max_rounds
    );
    Ok(())
}
