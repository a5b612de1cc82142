//! Enumeration types for the colony decision simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// The broad kind of an agent.
///
/// Kinds have disjoint provider tables: a robot is never offered a meal and
/// a colonist is never offered a battery recharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// An organic colonist.
    Person,
    /// A mechanical worker.
    Robot,
}

impl AgentKind {
    /// Every agent kind, in declaration order.
    pub const ALL: [Self; 2] = [Self::Person, Self::Robot];
}

/// The build of a robot, which decides the work it is good at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotType {
    /// Kitchen robot.
    ChefBot,
    /// Greenhouse robot.
    GardenBot,
    /// Maintenance and repair robot.
    RepairBot,
    /// General-purpose fabrication robot.
    MakerBot,
}

/// A colonist's trained specialty (job).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    /// Keeps habitat systems running.
    Engineer,
    /// Grows food in the greenhouses.
    Botanist,
    /// Prepares meals.
    Chef,
    /// Conducts general research.
    Scientist,
    /// Studies rock and regolith.
    Geologist,
    /// Studies life and soil chemistry.
    Biologist,
    /// Flies and drives vehicles.
    Pilot,
    /// Negotiates with other settlements.
    Trader,
    /// Looks after colonists' health.
    Doctor,
}

impl Specialty {
    /// Whether this specialty counts as research work.
    pub const fn is_researcher(self) -> bool {
        matches!(
            self,
            Self::Scientist | Self::Geologist | Self::Biologist | Self::Doctor
        )
    }
}

/// A colonist's position in the settlement's chain of command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Settlement commander.
    Commander,
    /// Second in command.
    SubCommander,
    /// Head of engineering.
    ChiefOfEngineering,
    /// Head of science.
    ChiefOfScience,
    /// Head of logistics and vehicles.
    ChiefOfLogistics,
    /// Head of supply and trade.
    ChiefOfSupply,
    /// Field specialist attached to expeditions.
    MissionSpecialist,
    /// Colonist without a leadership role.
    Resident,
}

/// Where an agent physically is, as far as decisions care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Whereabouts {
    /// Inside a settlement building.
    Indoors,
    /// Outside on the surface, near the settlement.
    Outside,
    /// Aboard a vehicle parked at the settlement.
    InVehicle,
    /// Away from the settlement on an expedition.
    Away,
}

// ---------------------------------------------------------------------------
// Expeditions
// ---------------------------------------------------------------------------

/// A category of settlement-wide expedition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionCategory {
    /// Survey unexplored sites for minerals.
    Exploration,
    /// Collect ore from a known deposit.
    Mining,
    /// Carry goods to another settlement for sale.
    Trade,
    /// Geology or biology field research.
    FieldStudy,
    /// Deliver supplies to another settlement.
    Delivery,
}

impl ExpeditionCategory {
    /// Every expedition category, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Exploration,
        Self::Mining,
        Self::Trade,
        Self::FieldStudy,
        Self::Delivery,
    ];

    /// Short lowercase name used in candidate keys and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Mining => "mining",
            Self::Trade => "trade",
            Self::FieldStudy => "field_study",
            Self::Delivery => "delivery",
        }
    }
}

impl core::fmt::Display for ExpeditionCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Coarse phase of the Martian day, derived from the millisol of the sol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    /// Millisols 200 to 299.
    Dawn,
    /// Millisols 300 to 699.
    Day,
    /// Millisols 700 to 799.
    Dusk,
    /// Millisols 800 to 999 and 0 to 199.
    Night,
}

impl DayPhase {
    /// Map a millisol of the sol (0 to 1000) to its phase.
    pub fn from_millisol(millisol: f64) -> Self {
        if millisol < 200.0 {
            Self::Night
        } else if millisol < 300.0 {
            Self::Dawn
        } else if millisol < 700.0 {
            Self::Day
        } else if millisol < 800.0 {
            Self::Dusk
        } else {
            Self::Night
        }
    }
}
