//! Conversation.

use colony_types::{AgentKind, DayPhase};

use super::single;
use crate::activity::ActivityKind;
use crate::candidate::DecisionContext;
use crate::provider::{CandidateProvider, Proposal};
use crate::score::Score;

/// Chatting with whoever else is indoors. Extroverts seek it out.
#[derive(Debug, Clone, Copy)]
pub struct ConverseProvider {
    upper_limit: f64,
}

impl ConverseProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for ConverseProvider {
    fn name(&self) -> &'static str {
        "converse"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        if !agent.is_indoors() || ctx.settlement.indoor_occupancy <= 1 {
            return Vec::new();
        }
        let extroversion = f64::from(agent.personality.extroversion.min(100));
        let mut score = Score::new("sociability", extroversion.mul_add(0.3, 5.0));
        score.add_modifier("stress", 1.0 + agent.stress.clamp(0.0, 100.0) / 200.0);
        if ctx.pulse.day_phase() == DayPhase::Night {
            score.add_modifier("night", 0.3);
        }
        single(ActivityKind::Converse, score, self.upper_limit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use colony_types::{AgentProfile, Role, Specialty};

    use super::*;
    use crate::providers::testing::{MIDDAY, make_settlement, score_of};

    #[test]
    fn extroverts_talk_more() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Pilot, Role::Resident);
        let provider = ConverseProvider::new(1000.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 20.0);
        agent.personality.extroversion = 100;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 35.0);
    }

    #[test]
    fn nobody_to_talk_to() {
        let mut settlement = make_settlement();
        settlement.indoor_occupancy = 1;
        let agent = AgentProfile::person("Ada", settlement.id, Specialty::Pilot, Role::Resident);
        assert_eq!(score_of(&ConverseProvider::new(1000.0), &agent, &settlement, MIDDAY), 0.0);
    }
}
