//! Error types for the colony engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the colony engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: colony_core::config::ConfigError,
    },

    /// The decision engine rejected its configuration.
    #[error("decision engine error: {source}")]
    Decision {
        /// The underlying decision config error.
        #[from]
        source: colony_decision::ConfigError,
    },

    /// Simulation state could not be assembled.
    #[error("pulse error: {source}")]
    Pulse {
        /// The underlying pulse error.
        #[from]
        source: colony_core::pulse::PulseError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: colony_core::runner::RunnerError,
    },

    /// Population spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
