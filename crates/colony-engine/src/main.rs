//! Simulation binary for the colony decision engine.
//!
//! This is the main entry point that wires together configuration, the
//! decision engine, the population spawner, and the pulse loop. It runs
//! the simulation until a bound is reached or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `colony-config.yaml` (or `COLONY_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the decision engine from the `decision` section
//! 4. Spawn colonists and robots into every settlement
//! 5. Assemble the simulation state (clock, worker pool)
//! 6. Run the simulation loop
//! 7. Log the result

mod error;
mod spawner;

use std::path::{Path, PathBuf};

use colony_core::config::{LoggingConfig, SimulationConfig};
use colony_core::pulse::SimulationState;
use colony_core::runner::{self, RunLimits, SummaryLogger};
use colony_decision::DecisionEngine;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::spawner::SpawnerConfig;

/// Environment variable naming an alternative config file.
const CONFIG_ENV_VAR: &str = "COLONY_CONFIG";

/// Config file used when `COLONY_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "colony-config.yaml";

/// Application entry point for the colony engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path(std::env::var(CONFIG_ENV_VAR).ok());
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("colony-engine starting");
    info!(
        path = %config_path.display(),
        world_name = config.world.name,
        seed = config.world.seed,
        settlements = config.settlements.len(),
        pulse_millisols = config.world.pulse_millisols,
        pulse_interval_ms = config.world.pulse_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the decision engine.
    let engine = DecisionEngine::new(config.decision.clone()).map_err(EngineError::from)?;

    // 4. Spawn the population.
    let spawner_config = load_spawner_config(&config_path)?;
    let settlements = spawner::spawn_settlements(&config, &spawner_config, &engine)?;

    // 5. Assemble simulation state.
    let mut state = SimulationState::new(&config, settlements).map_err(EngineError::from)?;
    info!(
        agents = state.agent_count(),
        worker_threads = state.worker_threads(),
        "Simulation state assembled, entering pulse loop"
    );

    // 6. Run the simulation, stopping cleanly on Ctrl-C.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping after the current pulse");
                if stop_tx.send(true).is_err() {
                    warn!("simulation already finished");
                }
            }
            Err(err) => warn!(error = %err, "cannot listen for Ctrl-C"),
        }
    });

    let mut callback = SummaryLogger::new(config.logging.summary_interval_pulses);
    let result = runner::run_simulation(
        &mut state,
        RunLimits::from_config(&config),
        stop_rx,
        &mut callback,
    )
    .await
    .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_pulses = result.total_pulses,
        "colony-engine shutdown complete"
    );

    Ok(())
}

/// Resolve the config file path, preferring `COLONY_CONFIG` when set.
fn config_path(from_env: Option<String>) -> PathBuf {
    from_env
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the main simulation configuration.
///
/// A missing file means defaults; a broken one is an error.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load spawner configuration from the `spawner` section of the config
/// file. If the file does not exist or lacks the section, defaults are
/// used.
fn load_spawner_config(path: &Path) -> Result<SpawnerConfig, EngineError> {
    if !path.exists() {
        return Ok(SpawnerConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_spawner_config(&contents)
}

fn parse_spawner_config(contents: &str) -> Result<SpawnerConfig, EngineError> {
    let raw: serde_yml::Value = serde_yml::from_str(contents).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    raw.get("spawner").map_or_else(
        || Ok(SpawnerConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Spawner {
                message: format!("failed to parse spawner config: {e}"),
            })
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_path_prefers_env() {
        assert_eq!(config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(config_path(Some(String::new())), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(
            config_path(Some("/etc/colony.yaml".to_owned())),
            PathBuf::from("/etc/colony.yaml")
        );
    }

    #[test]
    fn spawner_section_is_optional() {
        let defaults = parse_spawner_config("world:\n  seed: 7\n").unwrap();
        assert_eq!(defaults, SpawnerConfig::default());

        let custom = parse_spawner_config(
            "spawner:\n  personality_mode: balanced\n  assign_leadership: false\n",
        )
        .unwrap();
        assert_eq!(custom.personality_mode, "balanced");
        assert!(!custom.assign_leadership);
        assert_eq!(custom.max_starting_need, 30);
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let config = load_config(Path::new("/nonexistent/colony-config.yaml")).unwrap();
        assert_eq!(config.world.name, "Colony");
    }

    #[test]
    fn project_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../colony-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path).unwrap();
            assert!(!config.settlements.is_empty());
            load_spawner_config(&path).unwrap();
        }
    }
}
