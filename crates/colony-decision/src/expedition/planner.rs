//! Expedition fitness scoring.
//!
//! The planner only reads: registry counts feed the population modifier,
//! and nothing here starts an expedition. Committing a slot is the job of
//! [`ExpeditionCandidate::instantiate`](super::ExpeditionCandidate).
//!
//! ```text
//! score = (base - crowding)
//!       * population * leadership * personality
//!       clamped to [0, upper_limit]
//! ```

use colony_types::{AgentKind, ExpeditionCategory, Role};

use crate::candidate::DecisionContext;
use crate::config::{CategoryConfig, ExpeditionConfig};
use crate::expedition::registry::ExpeditionCounts;
use crate::score::Score;

/// Neutral point of the 0 to 100 personality scales.
const NEUTRAL_TRAIT: f64 = 50.0;

/// How many expeditions of one category may be in flight at once.
///
/// One per `capacity` colonists, never less than one.
pub const fn expedition_limit(population: u32, capacity: u32) -> u32 {
    let capacity = if capacity == 0 { 1 } else { capacity };
    match population.checked_div(capacity) {
        Some(0) | None => 1,
        Some(limit) => limit,
    }
}

/// Settlement-population modifier.
///
/// `max(1, population / capacity) / (embarking + 1) / (active + 1)`
pub fn population_modifier(population: u32, capacity: u32, counts: ExpeditionCounts) -> f64 {
    let ratio = (f64::from(population) / f64::from(capacity.max(1))).max(1.0);
    ratio
        / f64::from(counts.embarking.saturating_add(1))
        / f64::from(counts.active.saturating_add(1))
}

/// Leadership-suitability modifier.
///
/// `0.5 + leadership / 100`, then multiplied by `role_bonus` if the role is
/// preferred or `role_penalty` if it is not. Categories with no preferred
/// roles skip the role adjustment.
pub fn leadership_modifier(
    leadership: u32,
    role: Option<Role>,
    category: &CategoryConfig,
    config: &ExpeditionConfig,
) -> f64 {
    let suitability = 0.5 + f64::from(leadership.min(100)) / 100.0;
    if category.preferred_roles.is_empty() {
        return suitability;
    }
    if role.is_some_and(|r| category.preferred_roles.contains(&r)) {
        suitability * config.role_bonus
    } else {
        suitability * config.role_penalty
    }
}

/// Personality modifier, linear and symmetric around extroversion 50.
///
/// Ranges over `[1 - span, 1 + span]`.
pub fn personality_modifier(extroversion: u32, span: f64) -> f64 {
    let offset = (f64::from(extroversion.min(100)) - NEUTRAL_TRAIT) / NEUTRAL_TRAIT;
    offset.mul_add(span, 1.0)
}

/// Scores an agent's fitness to propose an expedition.
#[derive(Debug, Clone)]
pub struct ExpeditionPlanner {
    config: ExpeditionConfig,
}

impl ExpeditionPlanner {
    /// Planner with the given constants.
    pub const fn new(config: ExpeditionConfig) -> Self {
        Self { config }
    }

    /// The planner's constants.
    pub const fn config(&self) -> &ExpeditionConfig {
        &self.config
    }

    /// The in-flight limit for `category` at the context's settlement.
    ///
    /// `None` if the category is not configured.
    pub fn limit(&self, ctx: &DecisionContext<'_>, category: ExpeditionCategory) -> Option<u32> {
        self.config.category(category).map(|cfg| {
            expedition_limit(ctx.settlement.population, cfg.capacity_per_expedition)
        })
    }

    /// Fitness of the context's agent to propose `category`.
    ///
    /// [`Score::ZERO`] if the agent or category is ineligible or the
    /// category is already at its in-flight limit.
    pub fn propose(&self, ctx: &DecisionContext<'_>, category: ExpeditionCategory) -> Score {
        let agent = ctx.agent;
        if agent.kind != AgentKind::Person || !agent.is_indoors() {
            return Score::ZERO;
        }
        let Some(cfg) = self.config.category(category) else {
            return Score::ZERO;
        };
        if !cfg.enabled || !cfg.qualifies(agent.specialty) {
            return Score::ZERO;
        }

        let settlement = ctx.settlement;
        let counts = ctx.expeditions.counts(category);
        let limit = expedition_limit(settlement.population, cfg.capacity_per_expedition);
        if counts.in_flight() >= limit {
            return Score::ZERO;
        }

        let mut score = Score::new("base", cfg.base_score);
        let over = settlement.overcrowding();
        if over > 0 {
            score.add_base(
                "crowding",
                -f64::from(over) * self.config.crowding_penalty_per_agent,
            );
        }
        score
            .add_modifier(
                "population",
                population_modifier(settlement.population, cfg.capacity_per_expedition, counts),
            )
            .add_modifier(
                "leadership",
                leadership_modifier(agent.personality.leadership, agent.role, cfg, &self.config),
            )
            .add_modifier(
                "personality",
                personality_modifier(agent.personality.extroversion, self.config.extroversion_span),
            )
            .apply_range(0.0, self.config.upper_limit);

        // Crowding can eat the whole base pool.
        if score.is_positive() { score } else { Score::ZERO }
    }

    /// Fitness for every configured category, skipping ineligible ones.
    pub fn propose_all(&self, ctx: &DecisionContext<'_>) -> Vec<(ExpeditionCategory, Score)> {
        ExpeditionCategory::ALL
            .iter()
            .map(|&category| (category, self.propose(ctx, category)))
            .filter(|(_, score)| !score.is_zero())
            .collect()
    }
}
