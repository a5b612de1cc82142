//! Read-only state snapshots consumed by the decision engine.
//!
//! The physiology, location and settlement subsystems own the real state.
//! Each pulse they expose it through these plain structs; scoring code reads
//! them and never writes them back.

use serde::{Deserialize, Serialize};

use crate::enums::{AgentKind, RobotType, Role, Specialty, Whereabouts};
use crate::ids::{AgentId, SettlementId};

/// Neutral value for every 0 to 100 personality trait.
const NEUTRAL_TRAIT: u32 = 50;

/// Personality traits that bias decisions, each on a 0 to 100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    /// Aptitude for leading others (50 is average).
    pub leadership: u32,
    /// Introversion (0) to extroversion (100), 50 is neutral.
    pub extroversion: u32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            leadership: NEUTRAL_TRAIT,
            extroversion: NEUTRAL_TRAIT,
        }
    }
}

/// Snapshot of one agent as the decision engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// The agent's identifier.
    pub id: AgentId,
    /// Display name used in logs.
    pub name: String,
    /// Colonist or robot.
    pub kind: AgentKind,
    /// Home settlement.
    pub settlement: SettlementId,
    /// Trained specialty (colonists only).
    pub specialty: Option<Specialty>,
    /// Robot build (robots only).
    pub robot_type: Option<RobotType>,
    /// Position in the chain of command (colonists only).
    pub role: Option<Role>,
    /// Current physical whereabouts.
    pub whereabouts: Whereabouts,
    /// Energy (or battery charge for robots), 0 to 100.
    pub energy: f64,
    /// Hunger, 0 (sated) to 100 (starving).
    pub hunger: f64,
    /// Fatigue, 0 (rested) to 100 (exhausted).
    pub fatigue: f64,
    /// Stress, 0 to 100.
    pub stress: f64,
    /// Performance rating from the medical model, 0 to 1.
    pub performance: f64,
    /// Proficiency in the agent's own line of work, 0 to 100.
    pub skill: u32,
    /// Personality traits.
    pub personality: Personality,
}

impl AgentProfile {
    /// A healthy, rested colonist indoors.
    pub fn person(
        name: impl Into<String>,
        settlement: SettlementId,
        specialty: Specialty,
        role: Role,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            kind: AgentKind::Person,
            settlement,
            specialty: Some(specialty),
            robot_type: None,
            role: Some(role),
            whereabouts: Whereabouts::Indoors,
            energy: 100.0,
            hunger: 0.0,
            fatigue: 0.0,
            stress: 0.0,
            performance: 1.0,
            skill: NEUTRAL_TRAIT,
            personality: Personality::default(),
        }
    }

    /// A fully charged robot indoors.
    pub fn robot(name: impl Into<String>, settlement: SettlementId, robot_type: RobotType) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            kind: AgentKind::Robot,
            settlement,
            specialty: None,
            robot_type: Some(robot_type),
            role: None,
            whereabouts: Whereabouts::Indoors,
            energy: 100.0,
            hunger: 0.0,
            fatigue: 0.0,
            stress: 0.0,
            performance: 1.0,
            skill: NEUTRAL_TRAIT,
            personality: Personality::default(),
        }
    }

    /// Work efficiency in `[0, 1]`.
    ///
    /// The performance rating scaled down by fatigue: a fully exhausted
    /// agent works at half its rated performance.
    pub fn efficiency(&self) -> f64 {
        let performance = self.performance.clamp(0.0, 1.0);
        let fatigue = self.fatigue.clamp(0.0, 100.0);
        performance * (1.0 - fatigue / 200.0)
    }

    /// Whether the agent is inside a settlement building.
    pub fn is_indoors(&self) -> bool {
        self.whereabouts == Whereabouts::Indoors
    }
}

/// Snapshot of a settlement as the decision engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementProfile {
    /// The settlement's identifier.
    pub id: SettlementId,
    /// Display name used in logs.
    pub name: String,
    /// Number of colonists that call this settlement home.
    pub population: u32,
    /// Living space, in colonists.
    pub indoor_capacity: u32,
    /// Colonists currently indoors.
    pub indoor_occupancy: u32,
    /// Colonists with a research specialty currently indoors.
    pub researchers_indoors: u32,
    /// Research output multiplier (1.0 is nominal).
    pub research_factor: f64,
    /// Leisure and tourism multiplier (1.0 is nominal).
    pub tourism_factor: f64,
    /// Value of tradeable goods in stock (1.0 is nominal).
    pub goods_factor: f64,
    /// Outstanding maintenance work, 0 (none) to 1 (critical).
    pub maintenance_backlog: f64,
    /// Greenhouse tending needed, 0 to 1.
    pub greenhouse_need: f64,
    /// Shortage of prepared meals, 0 to 1.
    pub food_shortage: f64,
}

impl SettlementProfile {
    /// An empty settlement with nominal factors and no outstanding work.
    pub fn new(name: impl Into<String>, indoor_capacity: u32) -> Self {
        Self {
            id: SettlementId::new(),
            name: name.into(),
            population: 0,
            indoor_capacity,
            indoor_occupancy: 0,
            researchers_indoors: 0,
            research_factor: 1.0,
            tourism_factor: 1.0,
            goods_factor: 1.0,
            maintenance_backlog: 0.0,
            greenhouse_need: 0.0,
            food_shortage: 0.0,
        }
    }

    /// Colonists indoors beyond the living capacity (0 if not crowded).
    pub const fn overcrowding(&self) -> u32 {
        self.indoor_occupancy.saturating_sub(self.indoor_capacity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_combines_performance_and_fatigue() {
        let mut p =
            AgentProfile::person("Ada", SettlementId::new(), Specialty::Engineer, Role::Resident);
        assert_eq!(p.efficiency(), 1.0);
        p.fatigue = 100.0;
        assert_eq!(p.efficiency(), 0.5);
        p.performance = 0.5;
        assert_eq!(p.efficiency(), 0.25);
    }

    #[test]
    fn efficiency_clamps_out_of_range_inputs() {
        let mut p = AgentProfile::robot("R1", SettlementId::new(), RobotType::RepairBot);
        p.performance = 3.0;
        p.fatigue = -10.0;
        assert_eq!(p.efficiency(), 1.0);
    }

    #[test]
    fn overcrowding_counts_only_excess() {
        let mut s = SettlementProfile::new("Alpha", 10);
        s.indoor_occupancy = 8;
        assert_eq!(s.overcrowding(), 0);
        s.indoor_occupancy = 13;
        assert_eq!(s.overcrowding(), 3);
    }

    #[test]
    fn profile_round_trips_through_json() {
        let p = AgentProfile::person("Bo", SettlementId::new(), Specialty::Pilot, Role::Commander);
        let json = serde_json::to_string(&p).unwrap();
        let back: AgentProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
