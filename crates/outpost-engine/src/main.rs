//! Headless engine for the Outpost colony simulation.
//!
//! Runs a colony for a fixed number of turns with no player attached and
//! logs what happens.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$OUTPOST_CONFIG` or `outpost-config.yaml`
//! 2. Initialize structured logging (tracing) from the `logging` section
//! 3. Found the colony and land the seed lander near the map center
//! 4. Put a mine facility on the nearest deposit
//! 5. Run `colony.max_turns` turns, issuing the scripted opening
//! 6. Log the final snapshot

mod error;
mod plan;

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use outpost_core::config::LoggingConfig;
use outpost_core::{Colony, LogFormat, PlacementOutcome, SimulationConfig};

use crate::error::EngineError;

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "OUTPOST_CONFIG";

/// Default config file, relative to the working directory.
const CONFIG_FILE: &str = "outpost-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the colony reports an
/// inconsistency.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = load_config()?;
    init_logging(&config.logging);

    info!(
        source = %source.display(),
        colony = config.colony.name,
        seed = config.colony.seed,
        max_turns = config.colony.max_turns,
        "Configuration loaded"
    );

    run(&config)?;
    Ok(())
}

fn run(config: &SimulationConfig) -> Result<(), EngineError> {
    let mut colony = Colony::new(config)?;

    let center = plan::landing_site(&colony);
    match colony.deploy_seed_lander(center)? {
        PlacementOutcome::Placed(id) => info!(command_center = %id, %center, "Lander down"),
        PlacementOutcome::Rejected(reason) => warn!(?reason, %center, "Lander could not land"),
    }

    if let Some(deposit) = plan::nearest_deposit(&colony, center) {
        match colony.place_mine_facility(deposit)? {
            PlacementOutcome::Placed(id) => info!(structure = %id, %deposit, "Mine facility ordered"),
            PlacementOutcome::Rejected(reason) => warn!(?reason, %deposit, "Mine facility refused"),
        }
    } else {
        warn!("No deposits on the map");
    }

    for _ in 0..config.colony.max_turns {
        let report = colony.advance_turn()?;
        for event in &report.events {
            info!(turn = report.turn, ?event, "Event");
        }
        if report.unhoused > 0 {
            info!(turn = report.turn, unhoused = report.unhoused, "Housing shortfall");
        }
        for step in plan::due(report.turn) {
            plan::apply(&mut colony, center, step.order)?;
        }
    }

    let snapshot = colony.snapshot();
    info!(
        turn = snapshot.turn,
        structures = snapshot.structures.len(),
        energy_available = snapshot.energy.available,
        stockpile = snapshot.stockpile.total_materials(),
        "Run complete"
    );
    info!(snapshot = %snapshot.to_json()?, "Final colony state");
    Ok(())
}

/// Load the simulation configuration.
///
/// `$OUTPOST_CONFIG` wins over `outpost-config.yaml`; when neither file
/// exists the defaults are used. Returns the config and where it came from.
fn load_config() -> Result<(SimulationConfig, PathBuf), EngineError> {
    let path = std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path))
    } else {
        Ok((SimulationConfig::default(), PathBuf::from("<defaults>")))
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
