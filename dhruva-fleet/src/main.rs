//! DhruvaFleet - fleet coordination simulator
//!
//! Loads a navigation graph, spawns the robots listed in the scenario,
//! dispatches their tasks and ticks the fleet at a fixed period until every
//! robot is at rest, the tick limit is reached or Ctrl-C is pressed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::info;

use dhruva_fleet::{FleetConfig, FleetError, FleetRunner, Result};

const DEFAULT_CONFIG: &str = "dhruva_fleet.toml";

#[derive(Parser, Debug)]
#[command(name = "dhruva-fleet")]
#[command(about = "Simulate a robot fleet on a navigation graph")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    config: Option<PathBuf>,

    /// Navigation graph JSON, overrides [graph].path
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Level to load, overrides [graph].level
    #[arg(long)]
    level: Option<String>,

    /// Stop after this many ticks, overrides [simulation].max_ticks
    #[arg(long)]
    ticks: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dhruva_fleet=info,fleet_events=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    if let Some(graph) = args.graph {
        config.graph.path = graph;
    }
    if let Some(level) = args.level {
        config.graph.level = level;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.max_ticks = ticks;
    }

    info!("DhruvaFleet v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Graph {:?}, level '{}', {} robots, {} tasks",
        config.graph.path,
        config.graph.level,
        config.scenario.spawn.len(),
        config.scenario.task.len()
    );
    if config.traffic.strict_reservations {
        info!("Strict route reservations enabled");
    }

    let mut runner = FleetRunner::from_config(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| FleetError::Config(format!("Failed to set Ctrl-C handler: {}", e)))?;

    let ticks = runner.run(&running)?;
    info!("DhruvaFleet finished after {} ticks", ticks);
    Ok(())
}

/// Load the given config, else `dhruva_fleet.toml` if present, else defaults.
fn load_config(path: Option<&Path>) -> Result<FleetConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            FleetConfig::load(path)
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG);
            FleetConfig::load(Path::new(DEFAULT_CONFIG))
        }
        None => {
            info!("Using default configuration");
            Ok(FleetConfig::default())
        }
    }
}
