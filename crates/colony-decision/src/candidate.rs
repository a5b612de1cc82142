//! Candidates: scoreable options an agent could choose to do next.
//!
//! A [`Candidate`] is an opaque descriptor plus a factory. Providers create
//! candidates and score them; the scheduler later draws one and asks it to
//! [`instantiate`](Candidate::instantiate) a [`RunningActivity`]. Because
//! the two steps are separated in time, instantiation re-checks whatever
//! preconditions scoring relied on.

use core::fmt;

use colony_types::{AgentProfile, Pulse, SettlementProfile};
use serde::Serialize;

use crate::activity::{ActivityKind, RunningActivity};
use crate::error::InstantiationError;
use crate::expedition::ExpeditionRegistry;

/// Stable key identifying a candidate within a [`CandidateSet`].
///
/// [`CandidateSet`]: crate::candidate_set::CandidateSet
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CandidateId(String);

impl CandidateId {
    /// Wrap a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything scoring and instantiation may read for one agent and pulse.
///
/// All references are shared: providers and candidates read state but
/// never mutate it. The expedition registry is the one exception, and only
/// through its own check-then-act transition during instantiation.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// The deciding agent.
    pub agent: &'a AgentProfile,
    /// The agent's settlement.
    pub settlement: &'a SettlementProfile,
    /// The settlement's expedition counters.
    pub expeditions: &'a ExpeditionRegistry,
    /// The pulse being processed.
    pub pulse: Pulse,
}

/// A scoreable option that can become a running activity.
pub trait Candidate: fmt::Debug + Send + Sync {
    /// Key of this candidate.
    fn id(&self) -> CandidateId;

    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Create the running activity.
    ///
    /// # Errors
    ///
    /// Returns [`InstantiationError`] if state changed since scoring and
    /// the candidate no longer applies.
    fn instantiate(
        &self,
        ctx: &DecisionContext<'_>,
        score: f64,
    ) -> Result<RunningActivity, InstantiationError>;
}

/// Candidate for an ordinary activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityCandidate {
    kind: ActivityKind,
}

impl ActivityCandidate {
    /// Candidate for `kind`.
    pub const fn new(kind: ActivityKind) -> Self {
        Self { kind }
    }

    /// The activity kind.
    pub const fn kind(self) -> ActivityKind {
        self.kind
    }
}

impl Candidate for ActivityCandidate {
    fn id(&self) -> CandidateId {
        self.kind.candidate_id()
    }

    fn describe(&self) -> String {
        self.kind.to_string()
    }

    fn instantiate(
        &self,
        ctx: &DecisionContext<'_>,
        score: f64,
    ) -> Result<RunningActivity, InstantiationError> {
        if let Some(place) = self.kind.required_whereabouts()
            && ctx.agent.whereabouts != place
        {
            return Err(InstantiationError::NoLongerApplicable {
                candidate: self.id(),
                reason: format!("{} needs the agent {place:?}", self.kind),
            });
        }
        Ok(RunningActivity::new(
            self.id(),
            self.kind,
            format!("{} for {}", self.kind, ctx.agent.name),
            score,
            ctx.pulse.now,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use colony_types::{Role, SimDuration, SimTime, Specialty, Whereabouts};

    use super::*;

    #[test]
    fn activity_candidate_instantiates_when_preconditions_hold() {
        let settlement = SettlementProfile::new("Alpha", 10);
        let agent = AgentProfile::person("Di", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let ctx = DecisionContext {
            agent: &agent,
            settlement: &settlement,
            expeditions: &registry,
            pulse: Pulse::new(3, SimTime::from_millisols(30.0), SimDuration::from_millisols(10.0)),
        };
        let activity = ActivityCandidate::new(ActivityKind::Cook).instantiate(&ctx, 42.0).unwrap();
        assert_eq!(activity.kind(), ActivityKind::Cook);
        assert_eq!(activity.score(), 42.0);
        assert_eq!(activity.started_at().millisols(), 30.0);
        assert_eq!(activity.description(), "cook for Di");
    }

    #[test]
    fn activity_candidate_rejects_changed_whereabouts() {
        let settlement = SettlementProfile::new("Alpha", 10);
        let mut agent = AgentProfile::person("Di", settlement.id, Specialty::Chef, Role::Resident);
        agent.whereabouts = Whereabouts::InVehicle;
        let registry = ExpeditionRegistry::new();
        let ctx = DecisionContext {
            agent: &agent,
            settlement: &settlement,
            expeditions: &registry,
            pulse: Pulse::new(1, SimTime::ZERO, SimDuration::from_millisols(10.0)),
        };
        let err = ActivityCandidate::new(ActivityKind::Study).instantiate(&ctx, 1.0);
        assert!(matches!(
            err,
            Err(InstantiationError::NoLongerApplicable { .. })
        ));
    }
}
