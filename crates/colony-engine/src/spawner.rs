//! Population spawner for seeding settlements with colonists and robots.
//!
//! At simulation start the spawner fills every configured settlement with
//! its colonists and robots. Specialties rotate so every settlement gets a
//! mix of trades, the first colonists take the leadership roles, and
//! personalities and starting vitals are drawn from a generator seeded by
//! `world.seed`. Each agent also gets its own seed for its scheduler's
//! random draws, so a run is reproducible end to end.

use colony_core::config::{SettlementConfig, SimulationConfig};
use colony_core::settlement::{AgentSlot, Settlement};
use colony_decision::DecisionEngine;
use colony_types::{AgentProfile, Personality, RobotType, Role, Specialty};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the population spawner, loaded from the `spawner`
/// section of `colony-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpawnerConfig {
    /// Personality generation mode: `random` or `balanced`.
    #[serde(default = "default_personality_mode")]
    pub personality_mode: String,

    /// Hand the leadership roles to the first colonists of each settlement.
    #[serde(default = "default_assign_leadership")]
    pub assign_leadership: bool,

    /// Upper bound of the random starting hunger and fatigue.
    #[serde(default = "default_max_starting_need")]
    pub max_starting_need: u32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            personality_mode: default_personality_mode(),
            assign_leadership: default_assign_leadership(),
            max_starting_need: default_max_starting_need(),
        }
    }
}

fn default_personality_mode() -> String {
    String::from("random")
}

const fn default_assign_leadership() -> bool {
    true
}

const fn default_max_starting_need() -> u32 {
    30
}

/// How personality traits are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersonalityMode {
    /// Uniform over 0 to 100.
    Random,
    /// Every trait neutral.
    Balanced,
}

impl PersonalityMode {
    fn parse(mode: &str) -> Result<Self, EngineError> {
        match mode {
            "random" => Ok(Self::Random),
            "balanced" => Ok(Self::Balanced),
            other => Err(EngineError::Spawner {
                message: format!(
                    "unknown personality mode `{other}` (expected random or balanced)"
                ),
            }),
        }
    }
}

// -----------------------------------------------------------------------
// Pools
// -----------------------------------------------------------------------

/// Built-in pool of colonist names, drawn without replacement.
const NAME_POOL: &[&str] = &[
    "Ada", "Bruno", "Chandra", "Dara", "Elio", "Farah", "Gustav", "Hana",
    "Ivo", "Jun", "Kira", "Lev", "Mira", "Nils", "Omar", "Pia", "Quinn",
    "Rhea", "Soren", "Tala", "Uma", "Vik", "Wren", "Xia", "Yuri", "Zane",
];

/// Specialties handed out in turn.
const SPECIALTY_ROTATION: [Specialty; 9] = [
    Specialty::Engineer,
    Specialty::Botanist,
    Specialty::Chef,
    Specialty::Scientist,
    Specialty::Geologist,
    Specialty::Pilot,
    Specialty::Trader,
    Specialty::Doctor,
    Specialty::Biologist,
];

/// Roles given to the first colonists, in order.
const LEADERSHIP: [Role; 6] = [
    Role::Commander,
    Role::SubCommander,
    Role::ChiefOfEngineering,
    Role::ChiefOfScience,
    Role::ChiefOfLogistics,
    Role::ChiefOfSupply,
];

const ROBOT_ROTATION: [RobotType; 4] = [
    RobotType::RepairBot,
    RobotType::GardenBot,
    RobotType::ChefBot,
    RobotType::MakerBot,
];

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Build every configured settlement and fill it with agents.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the personality mode is unknown.
pub fn spawn_settlements(
    config: &SimulationConfig,
    spawner: &SpawnerConfig,
    engine: &DecisionEngine,
) -> Result<Vec<Settlement>, EngineError> {
    let mode = PersonalityMode::parse(&spawner.personality_mode)?;
    let mut rng = SmallRng::seed_from_u64(config.world.seed);

    let total_colonists: u32 = config.settlements.iter().map(|s| s.colonists).sum();
    let mut names = pick_unique_names(&mut rng, total_colonists).into_iter();

    let mut settlements = Vec::with_capacity(config.settlements.len());
    for settlement_config in &config.settlements {
        let settlement =
            spawn_settlement(settlement_config, spawner, mode, engine, &mut names, &mut rng);
        info!(
            settlement = %settlement.profile.name,
            colonists = settlement.profile.population,
            robots = settlement_config.robots,
            indoor_capacity = settlement.profile.indoor_capacity,
            "Settlement populated"
        );
        settlements.push(settlement);
    }
    Ok(settlements)
}

fn spawn_settlement(
    config: &SettlementConfig,
    spawner: &SpawnerConfig,
    mode: PersonalityMode,
    engine: &DecisionEngine,
    names: &mut impl Iterator<Item = String>,
    rng: &mut SmallRng,
) -> Settlement {
    let mut settlement = Settlement::from_config(config);
    let settlement_id = settlement.profile.id;
    let max_need = f64::from(spawner.max_starting_need.min(100));

    let specialties = SPECIALTY_ROTATION.iter().copied().cycle();
    for (i, specialty) in (0..config.colonists).zip(specialties) {
        let name = names.next().unwrap_or_else(|| format!("Colonist {i}"));
        let role = colonist_role(i, specialty, spawner.assign_leadership);
        let mut profile = AgentProfile::person(name, settlement_id, specialty, role);
        profile.personality = personality(mode, rng);
        profile.hunger = rng.random_range(0.0..=max_need);
        profile.fatigue = rng.random_range(0.0..=max_need);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, rng.random()));
    }

    let robot_types = ROBOT_ROTATION.iter().copied().cycle();
    for (i, robot_type) in (1..=config.robots).zip(robot_types) {
        let name = format!("{}-{i:02}", robot_label(robot_type));
        let mut profile = AgentProfile::robot(name, settlement_id, robot_type);
        profile.energy = rng.random_range(60.0..=100.0);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, rng.random()));
    }
    settlement
}

fn colonist_role(index: u32, specialty: Specialty, assign_leadership: bool) -> Role {
    let leader = usize::try_from(index)
        .ok()
        .filter(|_| assign_leadership)
        .and_then(|i| LEADERSHIP.get(i).copied());
    match (leader, specialty) {
        (Some(role), _) => role,
        (None, Specialty::Pilot | Specialty::Geologist) => Role::MissionSpecialist,
        (None, _) => Role::Resident,
    }
}

fn personality(mode: PersonalityMode, rng: &mut impl Rng) -> Personality {
    match mode {
        PersonalityMode::Random => Personality {
            leadership: rng.random_range(0..=100),
            extroversion: rng.random_range(0..=100),
        },
        PersonalityMode::Balanced => Personality::default(),
    }
}

const fn robot_label(robot_type: RobotType) -> &'static str {
    match robot_type {
        RobotType::ChefBot => "ChefBot",
        RobotType::GardenBot => "GardenBot",
        RobotType::RepairBot => "RepairBot",
        RobotType::MakerBot => "MakerBot",
    }
}

/// Pick `count` names, unique while the pool lasts. Past that, names repeat
/// with a generation suffix ("Ada II").
fn pick_unique_names(rng: &mut impl Rng, count: u32) -> Vec<String> {
    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    pool.shuffle(rng);
    let pool_len = pool.len();

    (0..usize::try_from(count).unwrap_or(usize::MAX))
        .map_while(|i| {
            let base = pool.get(i.checked_rem(pool_len)?)?;
            let generation = i.checked_div(pool_len)?;
            Some(if generation == 0 {
                (*base).to_owned()
            } else {
                format!("{base} {}", roman(generation.saturating_add(1)))
            })
        })
        .collect()
}

fn roman(n: usize) -> String {
    const NUMERALS: [(usize, &str); 6] =
        [(50, "L"), (40, "XL"), (10, "X"), (9, "IX"), (5, "V"), (4, "IV")];
    let mut rest = n;
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while rest >= value {
            out.push_str(numeral);
            rest = rest.saturating_sub(value);
        }
    }
    out.push_str(&"I".repeat(rest));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use colony_types::AgentKind;

    use super::*;

    fn make_config(colonists: u32, robots: u32) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        let mut settlement = SettlementConfig::named("Alpha");
        settlement.colonists = colonists;
        settlement.robots = robots;
        config.settlements = vec![settlement];
        config
    }

    fn spawn(config: &SimulationConfig, spawner: &SpawnerConfig) -> Vec<Settlement> {
        let engine = DecisionEngine::new(config.decision.clone()).unwrap();
        spawn_settlements(config, spawner, &engine).unwrap()
    }

    #[test]
    fn spawns_configured_headcount() {
        let settlements = spawn(&make_config(10, 3), &SpawnerConfig::default());
        let alpha = &settlements[0];
        assert_eq!(alpha.profile.population, 10);
        assert_eq!(alpha.agents.len(), 13);
        let robots = alpha
            .agents
            .iter()
            .filter(|s| s.profile.kind == AgentKind::Robot)
            .count();
        assert_eq!(robots, 3);
        assert_eq!(alpha.agents[10].profile.name, "RepairBot-01");
    }

    #[test]
    fn first_colonists_lead() {
        let settlements = spawn(&make_config(8, 0), &SpawnerConfig::default());
        let roles: Vec<Role> = settlements[0]
            .agents
            .iter()
            .filter_map(|s| s.profile.role)
            .collect();
        assert_eq!(&roles[..6], &LEADERSHIP);
        // Seventh colonist is the rotation's trader, eighth its doctor.
        assert_eq!(roles[6], Role::Resident);
    }

    #[test]
    fn without_leadership_pilots_become_mission_specialists() {
        assert_eq!(colonist_role(0, Specialty::Pilot, false), Role::MissionSpecialist);
        assert_eq!(colonist_role(0, Specialty::Chef, false), Role::Resident);
        assert_eq!(colonist_role(0, Specialty::Chef, true), Role::Commander);
        assert_eq!(colonist_role(6, Specialty::Geologist, true), Role::MissionSpecialist);
    }

    #[test]
    fn same_seed_same_population() {
        let config = make_config(12, 2);
        let names = |settlements: Vec<Settlement>| -> Vec<(String, Personality)> {
            settlements[0]
                .agents
                .iter()
                .map(|s| (s.profile.name.clone(), s.profile.personality))
                .collect()
        };
        let first = names(spawn(&config, &SpawnerConfig::default()));
        let second = names(spawn(&config, &SpawnerConfig::default()));
        assert_eq!(first, second);
    }

    #[test]
    fn balanced_mode_is_neutral() {
        let spawner = SpawnerConfig {
            personality_mode: "balanced".to_owned(),
            ..SpawnerConfig::default()
        };
        let settlements = spawn(&make_config(5, 0), &spawner);
        assert!(
            settlements[0]
                .agents
                .iter()
                .all(|s| s.profile.personality == Personality::default())
        );
    }

    #[test]
    fn unknown_personality_mode_is_rejected() {
        let config = make_config(1, 0);
        let engine = DecisionEngine::new(config.decision.clone()).unwrap();
        let spawner = SpawnerConfig {
            personality_mode: "chaotic".to_owned(),
            ..SpawnerConfig::default()
        };
        let err = spawn_settlements(&config, &spawner, &engine).unwrap_err();
        assert!(matches!(err, EngineError::Spawner { .. }));
    }

    #[test]
    fn names_stay_unique_past_the_pool() {
        let mut rng = SmallRng::seed_from_u64(1);
        let count = u32::try_from(NAME_POOL.len() * 2 + 3).unwrap();
        let names = pick_unique_names(&mut rng, count);
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
        assert!(names.iter().any(|n| n.ends_with(" III")));
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman(2), "II");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(14), "XIV");
        assert_eq!(roman(49), "XLIX");
    }
}
