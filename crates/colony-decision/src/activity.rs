//! Activity kinds and running activities.
//!
//! [`ActivityKind`] is the closed catalogue of things an agent can do. A
//! [`RunningActivity`] is one of those kinds in progress: it knows how long
//! it has left, whether it is effort-driven, and which preconditions must
//! keep holding for it to continue.

use colony_types::{AgentProfile, ExpeditionCategory, SimDuration, SimTime, Whereabouts};
use serde::Serialize;

use crate::candidate::CandidateId;

/// How an activity relates to the scheduler's override rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    /// Ordinary work or leisure.
    General,
    /// The reserved survival category used by the urgent override.
    Survival,
    /// Preparing a settlement expedition.
    Expedition,
}

/// Every kind of activity the decision engine can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Sleep in quarters.
    Sleep,
    /// Eat a meal.
    EatMeal,
    /// Unwind in a common area.
    Relax,
    /// Exercise in the gym.
    Workout,
    /// Research in a lab.
    Study,
    /// Chat with other colonists.
    Converse,
    /// Inspect and repair equipment.
    Maintenance,
    /// Tend greenhouse crops.
    TendGreenhouse,
    /// Prepare meals in the kitchen.
    Cook,
    /// Recharge a robot's battery.
    Recharge,
    /// Do nothing in particular.
    Idle,
    /// Organise an expedition of the given category.
    PrepareExpedition(ExpeditionCategory),
}

impl ActivityKind {
    /// Short name used in logs and summaries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::EatMeal => "eat_meal",
            Self::Relax => "relax",
            Self::Workout => "workout",
            Self::Study => "study",
            Self::Converse => "converse",
            Self::Maintenance => "maintenance",
            Self::TendGreenhouse => "tend_greenhouse",
            Self::Cook => "cook",
            Self::Recharge => "recharge",
            Self::Idle => "idle",
            Self::PrepareExpedition(_) => "prepare_expedition",
        }
    }

    /// Nominal length of the activity.
    pub const fn duration(self) -> SimDuration {
        let millisols = match self {
            Self::Sleep => 250.0,
            Self::Study | Self::Recharge | Self::PrepareExpedition(_) => 100.0,
            Self::Maintenance | Self::TendGreenhouse => 80.0,
            Self::Workout | Self::Cook => 60.0,
            Self::Relax => 50.0,
            Self::EatMeal => 40.0,
            Self::Converse => 30.0,
            Self::Idle => 20.0,
        };
        SimDuration::from_millisols(millisols)
    }

    /// Whether the activity is physical exertion, which doubles its
    /// energy cost.
    pub const fn is_effort_driven(self) -> bool {
        matches!(
            self,
            Self::Workout
                | Self::Maintenance
                | Self::TendGreenhouse
                | Self::Cook
                | Self::PrepareExpedition(_)
        )
    }

    /// Override category of the activity.
    pub const fn category(self) -> ActivityCategory {
        match self {
            Self::EatMeal | Self::Recharge => ActivityCategory::Survival,
            Self::PrepareExpedition(_) => ActivityCategory::Expedition,
            _ => ActivityCategory::General,
        }
    }

    /// Where the agent must be for the activity to run, if anywhere.
    pub const fn required_whereabouts(self) -> Option<Whereabouts> {
        match self {
            Self::Idle | Self::Recharge => None,
            _ => Some(Whereabouts::Indoors),
        }
    }

    /// Stable candidate key for this kind.
    pub fn candidate_id(self) -> CandidateId {
        match self {
            Self::PrepareExpedition(category) => {
                CandidateId::new(format!("expedition:{}", category.as_str()))
            }
            other => CandidateId::new(other.label()),
        }
    }
}

impl core::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PrepareExpedition(category) => write!(f, "prepare {category} expedition"),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of executing an activity for part of a pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Simulated time actually spent on the activity.
    pub time_spent: SimDuration,
    /// Whether the activity finished.
    pub finished: bool,
}

/// An activity in progress for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningActivity {
    candidate: CandidateId,
    kind: ActivityKind,
    description: String,
    score: f64,
    started_at: SimTime,
    remaining: SimDuration,
}

impl RunningActivity {
    /// Start an activity of `kind` at `started_at`, selected with `score`.
    pub fn new(
        candidate: CandidateId,
        kind: ActivityKind,
        description: impl Into<String>,
        score: f64,
        started_at: SimTime,
    ) -> Self {
        Self {
            candidate,
            kind,
            description: description.into(),
            score,
            started_at,
            remaining: kind.duration(),
        }
    }

    /// Override the nominal duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: SimDuration) -> Self {
        self.remaining = duration;
        self
    }

    /// Key of the candidate this activity came from.
    pub const fn candidate(&self) -> &CandidateId {
        &self.candidate
    }

    /// The activity kind.
    pub const fn kind(&self) -> ActivityKind {
        self.kind
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Score the activity had when it was selected.
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// When the activity started.
    pub const fn started_at(&self) -> SimTime {
        self.started_at
    }

    /// Time left until the activity completes.
    pub const fn remaining(&self) -> SimDuration {
        self.remaining
    }

    /// Whether the activity is in the reserved survival category.
    pub fn is_survival(&self) -> bool {
        self.kind.category() == ActivityCategory::Survival
    }

    /// Whether the activity's preconditions still hold for the agent.
    pub fn is_valid_for(&self, agent: &AgentProfile) -> bool {
        self.kind
            .required_whereabouts()
            .is_none_or(|place| agent.whereabouts == place)
    }

    /// Work on the activity for up to `elapsed`.
    pub fn perform(&mut self, elapsed: SimDuration) -> Progress {
        let time_spent = elapsed.min(self.remaining);
        self.remaining = self.remaining.saturating_sub(time_spent);
        Progress {
            time_spent,
            finished: self.remaining.is_elapsed(),
        }
    }

    /// Energy cost of `time_spent` on this activity at `efficiency`.
    ///
    /// Cost is one unit per millisol, scaled by efficiency, and doubled for
    /// effort-driven activities.
    pub fn energy_cost(&self, time_spent: SimDuration, efficiency: f64) -> f64 {
        let effort = if self.kind.is_effort_driven() { 2.0 } else { 1.0 };
        effort * time_spent.millisols() * efficiency
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use colony_types::{Role, SettlementId, Specialty};

    use super::*;

    fn make_activity(kind: ActivityKind) -> RunningActivity {
        RunningActivity::new(kind.candidate_id(), kind, kind.to_string(), 10.0, SimTime::ZERO)
    }

    #[test]
    fn perform_counts_down_and_finishes() {
        let mut a = make_activity(ActivityKind::EatMeal);
        let first = a.perform(SimDuration::from_millisols(25.0));
        assert_eq!(first.time_spent.millisols(), 25.0);
        assert!(!first.finished);
        let second = a.perform(SimDuration::from_millisols(25.0));
        assert_eq!(second.time_spent.millisols(), 15.0);
        assert!(second.finished);
    }

    #[test]
    fn effort_driven_activities_cost_double() {
        let workout = make_activity(ActivityKind::Workout);
        let relax = make_activity(ActivityKind::Relax);
        let t = SimDuration::from_millisols(4.0);
        assert_eq!(workout.energy_cost(t, 0.5), 4.0);
        assert_eq!(relax.energy_cost(t, 0.5), 2.0);
    }

    #[test]
    fn indoor_activity_is_invalid_outside() {
        let mut agent =
            AgentProfile::person("Cy", SettlementId::new(), Specialty::Chef, Role::Resident);
        let cook = make_activity(ActivityKind::Cook);
        assert!(cook.is_valid_for(&agent));
        agent.whereabouts = Whereabouts::Outside;
        assert!(!cook.is_valid_for(&agent));
        assert!(make_activity(ActivityKind::Idle).is_valid_for(&agent));
    }

    #[test]
    fn expedition_candidate_keys_include_category() {
        let kind = ActivityKind::PrepareExpedition(ExpeditionCategory::Mining);
        assert_eq!(kind.candidate_id().as_str(), "expedition:mining");
        assert_eq!(kind.category(), ActivityCategory::Expedition);
        assert_eq!(ActivityKind::Recharge.category(), ActivityCategory::Survival);
    }
}
