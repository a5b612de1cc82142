//! Per-agent decision engine for the colony simulation.
//!
//! Every pulse, each agent's [`AgentScheduler`] decides what the agent does
//! next: keep going, switch to something clearly better, or start a
//! settlement expedition.
//!
//! # Modules
//!
//! - [`score`] -- composite, clamped desirability scores and the ZERO
//!   sentinel.
//! - [`activity`] -- the activity catalogue and running activities.
//! - [`candidate`] -- scoreable options and the read-only decision context.
//! - [`candidate_set`] -- cached candidate sets and weighted-random draws.
//! - [`provider`] -- the provider interface and per-kind provider tables.
//! - [`providers`] -- the built-in providers.
//! - [`expedition`] -- expedition counters, fitness scoring and candidates.
//! - [`scheduler`] -- the per-agent state machine.
//! - [`engine`] -- startup entry point.
//! - [`config`] -- scoring and scheduling constants.
//! - [`error`] -- runtime error types.

pub mod activity;
pub mod candidate;
pub mod candidate_set;
pub mod config;
pub mod engine;
pub mod error;
pub mod expedition;
pub mod provider;
pub mod providers;
pub mod scheduler;
pub mod score;

pub use activity::{ActivityCategory, ActivityKind, Progress, RunningActivity};
pub use candidate::{ActivityCandidate, Candidate, CandidateId, DecisionContext};
pub use candidate_set::{CacheScope, CandidateEntry, CandidateSet};
pub use config::{CategoryConfig, ConfigError, DecisionConfig, ExpeditionConfig};
pub use engine::DecisionEngine;
pub use error::{InstantiationError, RegistryError};
pub use expedition::{
    ExpeditionCandidate, ExpeditionCounts, ExpeditionPlanner, ExpeditionProvider,
    ExpeditionRegistry, ExpeditionStage,
};
pub use provider::{
    CandidateProvider, Proposal, ProviderRegistry, ProviderRegistryBuilder, ProviderTable,
};
pub use scheduler::{
    AgentBody, AgentScheduler, PulseReport, SchedulerSettings, Selection, SelectionSource,
};
pub use score::Score;
