//! Configuration loading and typed config structures for the colony simulation.
//!
//! The canonical configuration lives in `colony-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file. The
//! `decision` section is the decision engine's own [`DecisionConfig`].

use std::path::Path;

use colony_decision::DecisionConfig;
use serde::Deserialize;
use tracing::warn;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "COLONY_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A harness setting is out of range.
    #[error("invalid config `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The `decision` section was rejected by the decision engine.
    #[error("{source}")]
    Decision {
        /// The underlying decision config error.
        #[from]
        source: colony_decision::ConfigError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `colony-config.yaml`. All fields have
/// defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, pulse timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Settlements to create at startup.
    #[serde(default = "default_settlements")]
    pub settlements: Vec<SettlementConfig>,

    /// Per-pulse physiology and chore rates.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Expedition lifecycle timing.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Decision engine constants.
    #[serde(default)]
    pub decision: DecisionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            settlements: default_settlements(),
            vitals: VitalsConfig::default(),
            lifecycle: LifecycleConfig::default(),
            logging: LoggingConfig::default(),
            simulation: SimulationBoundsConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `COLONY_SEED` environment variable overrides `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or a
    /// validation error.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        let value = std::env::var(SEED_ENV_VAR).ok();
        self.apply_seed_override(value.as_deref());
    }

    /// Override the seed from a raw environment value.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_seed_override(&mut self, value: Option<&str>) {
        let Some(raw) = value else {
            return;
        };
        match raw.trim().parse::<u64>() {
            Ok(seed) => self.world.seed = seed,
            Err(err) => warn!(value = raw, error = %err, "ignoring invalid {SEED_ENV_VAR}"),
        }
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world.pulse_millisols.is_finite() || self.world.pulse_millisols <= 0.0 {
            return Err(invalid("world.pulse_millisols", "must be positive"));
        }
        if !(0.0..1000.0).contains(&self.world.start_millisol) {
            return Err(invalid("world.start_millisol", "must be in [0, 1000)"));
        }
        if self.settlements.is_empty() {
            return Err(invalid("settlements", "at least one settlement is required"));
        }
        for (index, settlement) in self.settlements.iter().enumerate() {
            settlement.validate(index)?;
        }
        self.vitals.validate()?;
        if self.lifecycle.duration_pulses == 0 {
            return Err(invalid("lifecycle.duration_pulses", "must be at least 1"));
        }
        self.decision.validate()?;
        Ok(())
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated millisols covered by one pulse.
    #[serde(default = "default_pulse_millisols")]
    pub pulse_millisols: f64,

    /// Millisol of sol 0 at which the simulation starts.
    #[serde(default = "default_start_millisol")]
    pub start_millisol: f64,

    /// Real-time milliseconds between pulses.
    #[serde(default = "default_pulse_interval_ms")]
    pub pulse_interval_ms: u64,

    /// Worker threads for per-agent updates (0 or 1 = sequential).
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            pulse_millisols: default_pulse_millisols(),
            start_millisol: default_start_millisol(),
            pulse_interval_ms: default_pulse_interval_ms(),
            worker_threads: default_worker_threads(),
        }
    }
}

/// One settlement to create at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettlementConfig {
    /// Settlement name.
    pub name: String,

    /// Living space, in colonists.
    #[serde(default = "default_indoor_capacity")]
    pub indoor_capacity: u32,

    /// Colonists to spawn.
    #[serde(default = "default_colonists")]
    pub colonists: u32,

    /// Robots to spawn.
    #[serde(default = "default_robots")]
    pub robots: u32,

    /// Research output multiplier.
    #[serde(default = "default_factor")]
    pub research_factor: f64,

    /// Leisure and tourism multiplier.
    #[serde(default = "default_factor")]
    pub tourism_factor: f64,

    /// Tradeable goods multiplier.
    #[serde(default = "default_factor")]
    pub goods_factor: f64,
}

impl SettlementConfig {
    /// A settlement with default population and nominal factors.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indoor_capacity: default_indoor_capacity(),
            colonists: default_colonists(),
            robots: default_robots(),
            research_factor: default_factor(),
            tourism_factor: default_factor(),
            goods_factor: default_factor(),
        }
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let field = |name: &str| format!("settlements[{index}].{name}");
        if self.name.trim().is_empty() {
            return Err(invalid(field("name"), "must not be empty"));
        }
        if self.indoor_capacity == 0 {
            return Err(invalid(field("indoor_capacity"), "must be at least 1"));
        }
        for (name, value) in [
            ("research_factor", self.research_factor),
            ("tourism_factor", self.tourism_factor),
            ("goods_factor", self.goods_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    field(name),
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Per-pulse physiology and chore rates.
///
/// Energy is spent by the scheduler in activity units (one per millisol
/// at full efficiency, doubled for effort). `energy_per_unit` converts
/// that into points on the 0 to 100 energy scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VitalsConfig {
    /// Energy points lost per activity unit.
    #[serde(default = "default_energy_per_unit")]
    pub energy_per_unit: f64,

    /// Hunger gained per pulse by colonists.
    #[serde(default = "default_hunger_per_pulse")]
    pub hunger_per_pulse: f64,

    /// Fatigue gained per pulse by colonists.
    #[serde(default = "default_fatigue_per_pulse")]
    pub fatigue_per_pulse: f64,

    /// Stress gained per pulse by colonists in an overcrowded settlement.
    #[serde(default = "default_stress_per_pulse")]
    pub stress_per_pulse: f64,

    /// Energy restored by finishing a meal.
    #[serde(default = "default_meal_energy")]
    pub meal_energy: f64,

    /// Energy restored by a full sleep.
    #[serde(default = "default_sleep_energy")]
    pub sleep_energy: f64,

    /// Stress removed by relaxing or conversing.
    #[serde(default = "default_stress_relief")]
    pub stress_relief: f64,

    /// Growth per pulse of each settlement chore (0 to 1 scale).
    #[serde(default = "default_chore_growth_per_pulse")]
    pub chore_growth_per_pulse: f64,

    /// Chore reduction when a chore activity completes.
    #[serde(default = "default_chore_relief")]
    pub chore_relief: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            energy_per_unit: default_energy_per_unit(),
            hunger_per_pulse: default_hunger_per_pulse(),
            fatigue_per_pulse: default_fatigue_per_pulse(),
            stress_per_pulse: default_stress_per_pulse(),
            meal_energy: default_meal_energy(),
            sleep_energy: default_sleep_energy(),
            stress_relief: default_stress_relief(),
            chore_growth_per_pulse: default_chore_growth_per_pulse(),
            chore_relief: default_chore_relief(),
        }
    }
}

impl VitalsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("energy_per_unit", self.energy_per_unit),
            ("hunger_per_pulse", self.hunger_per_pulse),
            ("fatigue_per_pulse", self.fatigue_per_pulse),
            ("stress_per_pulse", self.stress_per_pulse),
            ("meal_energy", self.meal_energy),
            ("sleep_energy", self.sleep_energy),
            ("stress_relief", self.stress_relief),
            ("chore_growth_per_pulse", self.chore_growth_per_pulse),
            ("chore_relief", self.chore_relief),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    format!("vitals.{name}"),
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Expedition lifecycle timing, in pulses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LifecycleConfig {
    /// Pulses between claiming a slot and departure.
    #[serde(default = "default_embark_after_pulses")]
    pub embark_after_pulses: u64,

    /// Pulses an expedition spends away.
    #[serde(default = "default_duration_pulses")]
    pub duration_pulses: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            embark_after_pulses: default_embark_after_pulses(),
            duration_pulses: default_duration_pulses(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Log a pulse summary every N pulses (0 = never).
    #[serde(default = "default_summary_interval_pulses")]
    pub summary_interval_pulses: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            summary_interval_pulses: default_summary_interval_pulses(),
        }
    }
}

/// Simulation boundary configuration.
///
/// A value of 0 for either bound means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of pulses before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_pulses: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Colony".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_pulse_millisols() -> f64 {
    10.0
}

const fn default_start_millisol() -> f64 {
    300.0
}

const fn default_pulse_interval_ms() -> u64 {
    100
}

const fn default_worker_threads() -> usize {
    4
}

fn default_settlements() -> Vec<SettlementConfig> {
    vec![SettlementConfig::named("Schiaparelli Base")]
}

const fn default_indoor_capacity() -> u32 {
    24
}

const fn default_colonists() -> u32 {
    16
}

const fn default_robots() -> u32 {
    4
}

const fn default_factor() -> f64 {
    1.0
}

const fn default_energy_per_unit() -> f64 {
    0.05
}

const fn default_hunger_per_pulse() -> f64 {
    0.5
}

const fn default_fatigue_per_pulse() -> f64 {
    0.3
}

const fn default_stress_per_pulse() -> f64 {
    0.2
}

const fn default_meal_energy() -> f64 {
    40.0
}

const fn default_sleep_energy() -> f64 {
    30.0
}

const fn default_stress_relief() -> f64 {
    20.0
}

const fn default_chore_growth_per_pulse() -> f64 {
    0.005
}

const fn default_chore_relief() -> f64 {
    0.25
}

const fn default_embark_after_pulses() -> u64 {
    10
}

const fn default_duration_pulses() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_summary_interval_pulses() -> u64 {
    100
}
