//! Settlement-wide expeditions.
//!
//! - [`registry`] -- per-settlement counters of embarking and active
//!   expeditions, plus the settlement generation counter.
//! - [`planner`] -- an agent's fitness score for proposing an expedition,
//!   throttled by population and by what is already in flight.
//! - [`provider`] -- adapts the planner to the [`CandidateProvider`]
//!   interface so expedition opportunities join the normal candidate draw.
//!
//! [`CandidateProvider`]: crate::provider::CandidateProvider

pub mod planner;
pub mod provider;
pub mod registry;

pub use planner::{
    ExpeditionPlanner, expedition_limit, leadership_modifier, personality_modifier,
    population_modifier,
};
pub use provider::{ExpeditionCandidate, ExpeditionProvider};
pub use registry::{ExpeditionCounts, ExpeditionRegistry, ExpeditionStage};
