//! Multi-pulse runs of a whole settlement.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::arithmetic_side_effects
)]

use colony_core::config::{SettlementConfig, SimulationConfig};
use colony_core::pulse::{SimulationState, run_pulse};
use colony_core::runner::{EndReason, NoOpCallback, RunLimits, run_simulation};
use colony_core::settlement::{AgentSlot, Settlement};
use colony_decision::DecisionEngine;
use colony_types::{
    AgentKind, AgentProfile, ExpeditionCategory, RobotType, Role, Specialty, Whereabouts,
};
use tokio::sync::watch;

const SPECIALTIES: [Specialty; 8] = [
    Specialty::Engineer,
    Specialty::Botanist,
    Specialty::Chef,
    Specialty::Scientist,
    Specialty::Geologist,
    Specialty::Pilot,
    Specialty::Trader,
    Specialty::Doctor,
];

fn make_state(config: &SimulationConfig, colonists: usize) -> SimulationState {
    let engine = DecisionEngine::new(config.decision.clone()).unwrap();
    let mut settlement = Settlement::from_config(&SettlementConfig::named("Alpha"));
    let settlement_id = settlement.profile.id;
    for i in 0..colonists {
        let specialty = SPECIALTIES[i % SPECIALTIES.len()];
        let role = if i == 0 { Role::Commander } else { Role::Resident };
        let profile = AgentProfile::person(format!("C{i}"), settlement_id, specialty, role);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, i as u64));
    }
    for (i, robot_type) in [RobotType::RepairBot, RobotType::ChefBot].into_iter().enumerate() {
        let profile = AgentProfile::robot(format!("R{i}"), settlement_id, robot_type);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, 1000 + i as u64));
    }
    SimulationState::new(config, vec![settlement]).unwrap()
}

#[test]
fn a_sol_of_pulses_keeps_everyone_busy() {
    let mut config = SimulationConfig::default();
    config.world.worker_threads = 4;
    let mut state = make_state(&config, 16);

    // 100 pulses of 10 millisols each is one full sol.
    let mut completed = 0;
    for _ in 0..100 {
        let scheduled = state.settlements[0]
            .agents
            .iter()
            .filter(|slot| slot.profile.whereabouts != Whereabouts::Away)
            .count();
        let summary = run_pulse(&mut state).unwrap();
        assert!(usize::try_from(summary.agents).unwrap() <= scheduled);
        completed += summary.completed;
    }
    assert!(completed > 0);
    assert_eq!(state.clock.sol(), 1);

    for slot in &state.settlements[0].agents {
        assert!((0.0..=100.0).contains(&slot.profile.energy));
        assert!((0.0..=100.0).contains(&slot.profile.hunger));
    }
}

#[test]
fn expedition_counts_never_exceed_the_limit() {
    let mut config = SimulationConfig::default();
    config.world.worker_threads = 4;
    config.lifecycle.embark_after_pulses = 3;
    config.lifecycle.duration_pulses = 10;
    let mut state = make_state(&config, 16);
    let planner_config = config.decision.expeditions.clone();

    for _ in 0..300 {
        run_pulse(&mut state).unwrap();
        let settlement = &state.settlements[0];
        for category in ExpeditionCategory::ALL {
            let Some(cat) = planner_config.category(category) else {
                continue;
            };
            let limit = colony_decision::expedition::expedition_limit(
                settlement.profile.population,
                cat.capacity_per_expedition,
            );
            assert!(settlement.expeditions.counts(category).in_flight() <= limit);
        }
        let recorded = u32::try_from(settlement.records().count()).unwrap();
        let counted: u32 = settlement
            .expeditions
            .snapshot()
            .values()
            .map(|c| c.in_flight())
            .sum();
        assert_eq!(recorded, counted);
    }
}

#[test]
fn long_pulses_record_every_expedition_claim() {
    let mut config = SimulationConfig::default();
    // Longer than preparing an expedition, so claims can finish within a pulse.
    config.world.pulse_millisols = 150.0;
    config.world.worker_threads = 1;
    config.lifecycle.embark_after_pulses = 2;
    config.lifecycle.duration_pulses = 4;
    let mut state = make_state(&config, 16);

    let mut started = 0;
    for _ in 0..60 {
        started += run_pulse(&mut state).unwrap().lifecycle.started;
        let settlement = &state.settlements[0];
        let recorded = u32::try_from(settlement.records().count()).unwrap();
        let counted: u32 = settlement
            .expeditions
            .snapshot()
            .values()
            .map(|c| c.in_flight())
            .sum();
        assert_eq!(recorded, counted);
    }
    assert!(started > 0);
}

#[test]
fn starving_colonists_eat_once_then_move_on() {
    let mut config = SimulationConfig::default();
    config.world.worker_threads = 1;
    let mut state = make_state(&config, 6);
    for slot in &mut state.settlements[0].agents {
        if slot.profile.kind == AgentKind::Person {
            slot.profile.energy = 5.0;
            slot.profile.hunger = 90.0;
        }
    }

    // A meal is 4 pulses; its energy lifts everyone clear of the override.
    let overrides: u32 = (0..10).map(|_| run_pulse(&mut state).unwrap().overrides).sum();
    assert_eq!(overrides, 6);
    for slot in &state.settlements[0].agents {
        if slot.profile.kind == AgentKind::Person {
            assert!(slot.profile.energy > config.decision.critical_energy);
            assert!(slot.profile.hunger < 10.0);
        }
    }
}

#[test]
fn robots_never_eat_and_colonists_never_recharge() {
    let config = SimulationConfig::default();
    let mut state = make_state(&config, 4);
    for _ in 0..200 {
        run_pulse(&mut state).unwrap();
        for slot in &state.settlements[0].agents {
            let Some(current) = slot.scheduler.current() else {
                continue;
            };
            let kind = current.kind().label();
            match slot.profile.kind {
                AgentKind::Robot => assert!(!matches!(
                    kind,
                    "eat_meal" | "sleep" | "relax" | "workout" | "converse"
                )),
                AgentKind::Person => assert_ne!(kind, "recharge"),
            }
        }
    }
}

#[test]
fn same_seed_same_story() {
    let mut config = SimulationConfig::default();
    config.world.worker_threads = 1;
    let run = || {
        let mut state = make_state(&config, 6);
        (0..50)
            .map(|_| run_pulse(&mut state).unwrap().selections)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[tokio::test]
async fn bounded_run_through_the_runner() {
    let config = SimulationConfig::default();
    let mut state = make_state(&config, 8);
    let (_tx, rx) = watch::channel(false);
    let result = run_simulation(&mut state, RunLimits::pulses(25), rx, &mut NoOpCallback)
        .await
        .unwrap();
    assert_eq!(result.end_reason, EndReason::MaxPulses);
    assert_eq!(result.total_pulses, 25);
    assert_eq!(state.clock.pulse(), 25);
}
