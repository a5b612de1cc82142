//! Expedition opportunities as ordinary candidates.

use colony_types::{AgentKind, ExpeditionCategory};
use tracing::debug;

use crate::activity::{ActivityKind, RunningActivity};
use crate::candidate::{Candidate, CandidateId, DecisionContext};
use crate::error::InstantiationError;
use crate::expedition::planner::{ExpeditionPlanner, expedition_limit};
use crate::provider::{CandidateProvider, Proposal};

/// Offers one candidate per expedition category the agent may propose.
#[derive(Debug, Clone)]
pub struct ExpeditionProvider {
    planner: ExpeditionPlanner,
}

impl ExpeditionProvider {
    /// Provider backed by `planner`.
    pub const fn new(planner: ExpeditionPlanner) -> Self {
        Self { planner }
    }
}

impl CandidateProvider for ExpeditionProvider {
    fn name(&self) -> &'static str {
        "expedition"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        self.planner
            .propose_all(ctx)
            .into_iter()
            .filter_map(|(category, score)| {
                let capacity = self
                    .planner
                    .config()
                    .category(category)?
                    .capacity_per_expedition;
                let candidate: Box<dyn Candidate> =
                    Box::new(ExpeditionCandidate::new(category, capacity));
                Some((candidate, score))
            })
            .collect()
    }
}

/// Starts preparing an expedition, claiming a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpeditionCandidate {
    category: ExpeditionCategory,
    capacity_per_expedition: u32,
}

impl ExpeditionCandidate {
    /// Candidate for `category`, throttled at one expedition per
    /// `capacity_per_expedition` colonists.
    pub const fn new(category: ExpeditionCategory, capacity_per_expedition: u32) -> Self {
        Self {
            category,
            capacity_per_expedition,
        }
    }

    /// The expedition category.
    pub const fn category(self) -> ExpeditionCategory {
        self.category
    }
}

impl Candidate for ExpeditionCandidate {
    fn id(&self) -> CandidateId {
        ActivityKind::PrepareExpedition(self.category).candidate_id()
    }

    fn describe(&self) -> String {
        ActivityKind::PrepareExpedition(self.category).to_string()
    }

    fn instantiate(
        &self,
        ctx: &DecisionContext<'_>,
        score: f64,
    ) -> Result<RunningActivity, InstantiationError> {
        if !ctx.agent.is_indoors() {
            return Err(InstantiationError::NoLongerApplicable {
                candidate: self.id(),
                reason: format!("{} left the settlement", ctx.agent.name),
            });
        }
        // Re-read the population: it may have changed since scoring.
        let limit = expedition_limit(ctx.settlement.population, self.capacity_per_expedition);
        let counts = ctx.expeditions.try_start(self.category, limit)?;
        debug!(
            agent = %ctx.agent.id,
            category = %self.category,
            embarking = counts.embarking,
            limit,
            "expedition slot claimed"
        );
        let kind = ActivityKind::PrepareExpedition(self.category);
        Ok(RunningActivity::new(
            self.id(),
            kind,
            format!("{kind} led by {}", ctx.agent.name),
            score,
            ctx.pulse.now,
        ))
    }
}
