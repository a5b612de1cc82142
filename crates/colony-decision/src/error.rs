//! Error types for the colony-decision crate.
//!
//! "Not applicable" is never an error here: providers signal it with
//! [`Score::ZERO`](crate::score::Score::ZERO). The types below cover the
//! remaining failure modes. Configuration errors live in
//! [`config`](crate::config) because they are fatal at startup only.

use colony_types::ExpeditionCategory;

use crate::candidate::CandidateId;

/// A scored candidate could not be turned into a running activity.
///
/// Scoring and instantiation happen at different moments, so state can
/// change in between. These failures are transient: the scheduler logs
/// them and retries selection on the next pulse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstantiationError {
    /// The agent no longer satisfies the candidate's preconditions.
    #[error("candidate {candidate} no longer applies: {reason}")]
    NoLongerApplicable {
        /// The candidate that was drawn.
        candidate: CandidateId,
        /// What changed.
        reason: String,
    },

    /// Another agent filled the last expedition slot first.
    #[error("no free {category} expedition slot ({in_flight} of {limit} in flight)")]
    ExpeditionQuotaReached {
        /// The expedition category.
        category: ExpeditionCategory,
        /// Active plus embarking expeditions at the time of the attempt.
        in_flight: u32,
        /// The population-scaled limit.
        limit: u32,
    },
}

/// An expedition lifecycle transition did not match the registry counters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Tried to move an expedition out of a stage that has none.
    #[error("no {stage} {category} expedition to transition")]
    EmptyStage {
        /// The expedition category.
        category: ExpeditionCategory,
        /// The stage that was expected to be non-empty.
        stage: &'static str,
    },
}
