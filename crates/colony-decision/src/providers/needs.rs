//! Physiological needs: sleep, meals, leisure, exercise, recharging.

use colony_types::{AgentKind, DayPhase};

use super::single;
use crate::activity::ActivityKind;
use crate::candidate::DecisionContext;
use crate::provider::{CandidateProvider, Proposal};
use crate::score::Score;

/// Fatigue below which colonists only sleep at night.
const RESTED_FATIGUE: f64 = 10.0;

/// Sleep, driven by fatigue and strongly preferred at night.
#[derive(Debug, Clone, Copy)]
pub struct SleepProvider {
    upper_limit: f64,
}

impl SleepProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for SleepProvider {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        let phase = ctx.pulse.day_phase();
        if !agent.is_indoors() || (agent.fatigue < RESTED_FATIGUE && phase != DayPhase::Night) {
            return Vec::new();
        }
        let mut score = Score::new("fatigue", agent.fatigue.max(1.0) * 2.0);
        match phase {
            DayPhase::Night => {
                score.add_modifier("night", 3.0);
            }
            DayPhase::Dusk => {
                score.add_modifier("dusk", 1.5);
            }
            DayPhase::Dawn | DayPhase::Day => {}
        }
        if agent.stress > 60.0 {
            score.add_modifier("restless", 0.8);
        }
        single(ActivityKind::Sleep, score, self.upper_limit)
    }
}

/// Meals. Also the colonists' survival provider.
#[derive(Debug, Clone, Copy)]
pub struct EatMealProvider {
    upper_limit: f64,
}

impl EatMealProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for EatMealProvider {
    fn name(&self) -> &'static str {
        "eat_meal"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        if !agent.is_indoors() {
            return Vec::new();
        }
        let deficit = (100.0 - agent.energy).max(0.0) * 0.5;
        let need = agent.hunger.max(0.0) + deficit;
        if need < 10.0 {
            return Vec::new();
        }
        let mut score = Score::new("appetite", need);
        if ctx.settlement.food_shortage > 0.8 {
            score.add_modifier("rationing", 0.5);
        }
        single(ActivityKind::EatMeal, score, self.upper_limit)
    }
}

/// Leisure, scaled by stress and the settlement's tourism factor.
#[derive(Debug, Clone, Copy)]
pub struct RelaxProvider {
    upper_limit: f64,
}

impl RelaxProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for RelaxProvider {
    fn name(&self) -> &'static str {
        "relax"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        if !agent.is_indoors() {
            return Vec::new();
        }
        let mut score = Score::new("leisure", 10.0);
        score
            .add_base("stress", agent.stress.max(0.0) * 0.5)
            .add_modifier("tourism", ctx.settlement.tourism_factor);
        single(ActivityKind::Relax, score, self.upper_limit)
    }
}

/// Exercise. Effort-driven, so tired or drained colonists skip it.
#[derive(Debug, Clone, Copy)]
pub struct WorkoutProvider {
    upper_limit: f64,
}

impl WorkoutProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for WorkoutProvider {
    fn name(&self) -> &'static str {
        "workout"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        if !agent.is_indoors() || agent.fatigue > 70.0 || agent.energy < 40.0 {
            return Vec::new();
        }
        let mut score = Score::new("fitness", 12.0);
        score
            .add_base("stress relief", agent.stress.max(0.0) * 0.2)
            .add_modifier("fatigue", 1.0 - agent.fatigue.clamp(0.0, 100.0) / 100.0);
        if ctx.pulse.day_phase() == DayPhase::Night {
            score.add_modifier("night", 0.3);
        }
        single(ActivityKind::Workout, score, self.upper_limit)
    }
}

/// Battery recharging. The robots' survival provider and fallback.
#[derive(Debug, Clone, Copy)]
pub struct RechargeProvider {
    upper_limit: f64,
}

impl RechargeProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for RechargeProvider {
    fn name(&self) -> &'static str {
        "recharge"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Robot
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let energy = ctx.agent.energy;
        if energy >= 95.0 {
            return Vec::new();
        }
        let mut score = Score::new("battery deficit", (100.0 - energy) * 2.0);
        if energy < 30.0 {
            score.add_modifier("low battery", 3.0);
        }
        single(ActivityKind::Recharge, score, self.upper_limit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use colony_types::{AgentProfile, RobotType, Role, Specialty, Whereabouts};

    use super::*;
    use crate::providers::testing::{MIDDAY, MIDNIGHT, make_settlement, score_of};

    fn make_person() -> AgentProfile {
        AgentProfile::person("Ada", make_settlement().id, Specialty::Engineer, Role::Resident)
    }

    #[test]
    fn sleep_prefers_night() {
        let settlement = make_settlement();
        let mut agent = make_person();
        agent.fatigue = 40.0;
        let provider = SleepProvider::new(1000.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 80.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDNIGHT), 240.0);

        agent.fatigue = 0.0;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 0.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDNIGHT), 6.0);
    }

    #[test]
    fn eat_meal_tracks_hunger_and_energy() {
        let settlement = make_settlement();
        let mut agent = make_person();
        let provider = EatMealProvider::new(1000.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 0.0);

        agent.hunger = 30.0;
        agent.energy = 60.0;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 50.0);

        agent.whereabouts = Whereabouts::Outside;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 0.0);
    }

    #[test]
    fn relax_scales_with_tourism() {
        let mut settlement = make_settlement();
        let mut agent = make_person();
        agent.stress = 40.0;
        settlement.tourism_factor = 1.5;
        assert_eq!(score_of(&RelaxProvider::new(1000.0), &agent, &settlement, MIDDAY), 45.0);
    }

    #[test]
    fn workout_skipped_when_tired() {
        let settlement = make_settlement();
        let mut agent = make_person();
        let provider = WorkoutProvider::new(1000.0);
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 12.0);
        agent.fatigue = 80.0;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 0.0);
        agent.fatigue = 0.0;
        agent.energy = 30.0;
        assert_eq!(score_of(&provider, &agent, &settlement, MIDDAY), 0.0);
    }

    #[test]
    fn recharge_for_robots_only() {
        let settlement = make_settlement();
        let provider = RechargeProvider::new(1000.0);
        let mut robot = AgentProfile::robot("R1", settlement.id, RobotType::ChefBot);
        assert_eq!(score_of(&provider, &robot, &settlement, MIDDAY), 0.0);
        robot.energy = 50.0;
        assert_eq!(score_of(&provider, &robot, &settlement, MIDDAY), 100.0);
        robot.energy = 10.0;
        assert_eq!(score_of(&provider, &robot, &settlement, MIDDAY), 540.0);
        assert!(!provider.applicable_to(AgentKind::Person));
    }

    #[test]
    fn upper_limit_caps_scores() {
        let settlement = make_settlement();
        let mut robot = AgentProfile::robot("R1", settlement.id, RobotType::ChefBot);
        robot.energy = 0.0;
        assert_eq!(score_of(&RechargeProvider::new(100.0), &robot, &settlement, MIDDAY), 100.0);
    }
}
