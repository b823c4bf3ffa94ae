//! Misinformation Spread Simulation
//!
//! Runs one simulated day or week and writes the metrics log.

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use misinfo_core::config::{Config, PopulationConfig, SimDuration};
use misinfo_core::output::{MetricsLog, TransitionLog, METRICS_LOG_FILE, TRANSITION_LOG_FILE};
use misinfo_core::Simulation;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "misinfo_sim")]
#[command(about = "Agent-based simulation of misinformation spread")]
struct Args {
    /// TOML configuration file (defaults to misinfo.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulated run length
    #[arg(long, value_enum)]
    duration: Option<SimDuration>,

    /// Initial population, e.g. "susceptible=45,believer=5"
    #[arg(long, value_parser = parse_population)]
    population: Option<PopulationConfig>,

    /// Global emotional valence, 0 to 10
    #[arg(long)]
    emotional_valence: Option<f32>,

    /// Directory for output logs
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Also write every transition to transitions.jsonl
    #[arg(long)]
    log_transitions: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn parse_population(s: &str) -> Result<PopulationConfig, String> {
    s.parse().map_err(|e: misinfo_core::ConfigError| e.to_string())
}

fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    if let Some(duration) = args.duration {
        config.simulation.duration = duration;
    }
    if let Some(population) = &args.population {
        config.population = population.clone();
    }
    if let Some(valence) = args.emotional_valence {
        config.simulation.emotional_valence = valence;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;

    if let Some(path) = &args.write_default_config {
        fs::write(path, config.to_toml()?)?;
        info!(path = %path.display(), "wrote configuration");
        return Ok(());
    }

    info!(
        seed = args.seed,
        duration = ?config.simulation.duration,
        population = config.population.total(),
        "starting simulation"
    );

    let mut sim = Simulation::new(&config, args.seed)?;

    fs::create_dir_all(&args.output)?;
    let metrics_path = args.output.join(METRICS_LOG_FILE);
    sim.attach_metrics_log(MetricsLog::new(&metrics_path)?);
    if args.log_transitions {
        sim.attach_transition_log(TransitionLog::new(args.output.join(TRANSITION_LOG_FILE))?);
    }

    let summary = sim.run();
    sim.flush()?;

    println!("Simulation complete");
    println!("===================");
    println!("Ticks: {}", summary.ticks);
    println!("Final time: {}", summary.final_time);
    println!("Final counts: {}", summary.counts);
    println!("Total misinformed: {}", summary.counts.total_misinformed());
    println!("Transitions: {}", summary.transitions);
    println!("Snapshots: {} -> {}", summary.snapshots, metrics_path.display());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
