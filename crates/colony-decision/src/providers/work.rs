//! Settlement chores and research.
//!
//! Chore scores grow with how much work is outstanding in the settlement
//! and with the agent's affinity for it: the matching specialty for
//! colonists, the matching build for robots.

use colony_types::{AgentKind, AgentProfile, DayPhase, RobotType, Specialty};

use super::single;
use crate::activity::ActivityKind;
use crate::candidate::DecisionContext;
use crate::provider::{CandidateProvider, Proposal};
use crate::score::Score;

/// Affinity multiplier for a colonist with the matching specialty.
const SPECIALIST_AFFINITY: f64 = 1.5;
/// Affinity multiplier for a robot built for the chore.
const ROBOT_AFFINITY: f64 = 2.0;

/// Skill as a multiplier in `[0.5, 1.5]`.
fn skill_modifier(agent: &AgentProfile) -> f64 {
    0.5 + f64::from(agent.skill.min(100)) / 100.0
}

/// Apply the affinity modifier, if the agent has one for this chore.
fn apply_affinity(
    score: &mut Score,
    agent: &AgentProfile,
    specialty: Specialty,
    robot: RobotType,
) {
    if agent.specialty == Some(specialty) {
        score.add_modifier("specialist", SPECIALIST_AFFINITY);
    } else if agent.robot_type == Some(robot) {
        score.add_modifier("purpose-built", ROBOT_AFFINITY);
    }
}

/// Equipment maintenance, driven by the settlement backlog.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceProvider {
    upper_limit: f64,
}

impl MaintenanceProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for MaintenanceProvider {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    fn applicable_to(&self, _kind: AgentKind) -> bool {
        true
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        let backlog = ctx.settlement.maintenance_backlog;
        if !agent.is_indoors() || backlog <= 0.0 {
            return Vec::new();
        }
        let mut score = Score::new("backlog", backlog * 100.0);
        apply_affinity(&mut score, agent, Specialty::Engineer, RobotType::RepairBot);
        if agent.robot_type == Some(RobotType::MakerBot) {
            score.add_modifier("tooling", 1.2);
        }
        score.add_modifier("skill", skill_modifier(agent));
        single(ActivityKind::Maintenance, score, self.upper_limit)
    }
}

/// Greenhouse tending.
#[derive(Debug, Clone, Copy)]
pub struct GreenhouseProvider {
    upper_limit: f64,
}

impl GreenhouseProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for GreenhouseProvider {
    fn name(&self) -> &'static str {
        "tend_greenhouse"
    }

    fn applicable_to(&self, _kind: AgentKind) -> bool {
        true
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        let need = ctx.settlement.greenhouse_need;
        if !agent.is_indoors() || need <= 0.0 {
            return Vec::new();
        }
        let mut score = Score::new("crop care", need * 80.0);
        apply_affinity(&mut score, agent, Specialty::Botanist, RobotType::GardenBot);
        single(ActivityKind::TendGreenhouse, score, self.upper_limit)
    }
}

/// Meal preparation, driven by the food shortage.
#[derive(Debug, Clone, Copy)]
pub struct CookProvider {
    upper_limit: f64,
}

impl CookProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for CookProvider {
    fn name(&self) -> &'static str {
        "cook"
    }

    fn applicable_to(&self, _kind: AgentKind) -> bool {
        true
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        let shortage = ctx.settlement.food_shortage;
        if !agent.is_indoors() || shortage <= 0.0 {
            return Vec::new();
        }
        let mut score = Score::new("shortage", shortage * 60.0);
        apply_affinity(&mut score, agent, Specialty::Chef, RobotType::ChefBot);
        if agent.kind == AgentKind::Person && ctx.pulse.day_phase() == DayPhase::Night {
            score.add_modifier("night", 0.5);
        }
        single(ActivityKind::Cook, score, self.upper_limit)
    }
}

/// Laboratory research for colonists with a research specialty.
///
/// The base pool has two parts: the agent's own study, scaled by the
/// settlement research factor, and collaborative credit for every other
/// researcher indoors. Shared modifiers then scale the whole pool.
#[derive(Debug, Clone, Copy)]
pub struct StudyProvider {
    upper_limit: f64,
}

impl StudyProvider {
    /// Provider clamping to `upper_limit`.
    pub const fn new(upper_limit: f64) -> Self {
        Self { upper_limit }
    }
}

impl CandidateProvider for StudyProvider {
    fn name(&self) -> &'static str {
        "study"
    }

    fn applicable_to(&self, kind: AgentKind) -> bool {
        kind == AgentKind::Person
    }

    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal> {
        let agent = ctx.agent;
        let settlement = ctx.settlement;
        if !agent.is_indoors() || !agent.specialty.is_some_and(Specialty::is_researcher) {
            return Vec::new();
        }

        let primary = f64::from(agent.skill).max(1.0) * 0.5 * settlement.research_factor;
        let mut score = Score::new("primary study", primary);
        let peers = settlement.researchers_indoors.saturating_sub(1);
        if peers > 0 {
            score
                .add_base("collaborative study", f64::from(peers) * 3.0)
                .add_modifier(
                    "extrovert",
                    0.75 + f64::from(agent.personality.extroversion.min(100)) / 200.0,
                );
        }
        if settlement.overcrowding() > 0 {
            score.add_modifier(
                "crowding",
                f64::from(settlement.indoor_capacity) / f64::from(settlement.indoor_occupancy),
            );
        }
        score.add_modifier("fatigue", 1.0 - agent.fatigue.clamp(0.0, 100.0) / 150.0);
        single(ActivityKind::Study, score, self.upper_limit)
    }
}
