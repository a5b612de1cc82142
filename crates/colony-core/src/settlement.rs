//! Settlement world state and the collaborators around the decision engine.
//!
//! A [`Settlement`] owns its agents, the read-only [`SettlementProfile`]
//! snapshot the decision engine scores against, and the settlement's
//! [`ExpeditionRegistry`]. Around each pulse of agent decisions it plays
//! the subsystems the engine depends on:
//!
//! - **Vitals** -- hunger, fatigue and stress drift every pulse. Energy is
//!   charged through the scheduler's [`AgentBody`] callback, which also
//!   applies a finished activity's effects on the agent before its
//!   successor is chosen. Effects on the settlement (chores shrinking the
//!   backlog) are applied from the pulse reports.
//! - **Expedition execution** -- an instantiated expedition candidate has
//!   already claimed an embarking slot. The settlement records it, sends
//!   the leader away after `embark_after_pulses`, and brings them back
//!   after `duration_pulses`. A leader who collapses before departure
//!   aborts the expedition.

use std::collections::BTreeMap;

use colony_decision::{
    ActivityKind, AgentBody, AgentScheduler, ExpeditionRegistry, ExpeditionStage, PulseReport,
};
use colony_types::{
    AgentId, AgentKind, AgentProfile, ExpeditionCategory, ExpeditionId, Pulse, SettlementProfile,
    Whereabouts,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{LifecycleConfig, SettlementConfig, VitalsConfig};

/// Upper bound of the 0 to 100 vital scales.
const VITAL_MAX: f64 = 100.0;

/// One agent: its state, its scheduler, and its own random source.
#[derive(Debug)]
pub struct AgentSlot {
    /// The agent's current state.
    pub profile: AgentProfile,
    /// The agent's decision state.
    pub scheduler: AgentScheduler,
    /// Per-agent random source, so results do not depend on thread
    /// scheduling.
    rng: SmallRng,
}

impl AgentSlot {
    /// Pair an agent with its scheduler and seed its random source.
    pub fn new(profile: AgentProfile, scheduler: AgentScheduler, seed: u64) -> Self {
        Self {
            profile,
            scheduler,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Run the agent's scheduler for one pulse. Agents away on an
    /// expedition are skipped.
    fn step(
        &mut self,
        settlement: &SettlementProfile,
        expeditions: &ExpeditionRegistry,
        pulse: &Pulse,
        vitals: &VitalsConfig,
    ) -> Option<PulseReport> {
        if self.profile.whereabouts == Whereabouts::Away {
            return None;
        }
        let mut body = Body {
            profile: &mut self.profile,
            vitals,
        };
        Some(
            self.scheduler
                .on_pulse(&mut body, settlement, expeditions, pulse, &mut self.rng),
        )
    }
}

/// Converts activity energy units into points on the energy scale and
/// applies finished activities to the agent.
struct Body<'a> {
    profile: &'a mut AgentProfile,
    vitals: &'a VitalsConfig,
}

impl AgentBody for Body<'_> {
    fn profile(&self) -> &AgentProfile {
        self.profile
    }

    fn consume_energy(&mut self, amount: f64) {
        let points = amount * self.vitals.energy_per_unit;
        self.profile.energy = (self.profile.energy - points).max(0.0);
    }

    fn complete(&mut self, kind: ActivityKind) {
        apply_agent_effects(self.profile, kind, self.vitals);
    }
}

/// An expedition claimed by one of the settlement's colonists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpeditionRecord {
    /// Expedition identifier.
    pub id: ExpeditionId,
    /// Expedition category.
    pub category: ExpeditionCategory,
    /// The colonist who proposed it.
    pub leader: AgentId,
    /// Current stage.
    pub stage: ExpeditionStage,
    /// Pulse at which the slot was claimed.
    pub claimed_at: u64,
    /// Pulse at which it departed, once active.
    pub embarked_at: Option<u64>,
}

/// Expedition lifecycle transitions during one pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleTally {
    /// Slots claimed.
    pub started: u32,
    /// Departures.
    pub embarked: u32,
    /// Returns.
    pub completed: u32,
    /// Abandoned before departure.
    pub aborted: u32,
}

impl LifecycleTally {
    /// Add another tally into this one.
    pub const fn merge(&mut self, other: Self) {
        self.started = self.started.saturating_add(other.started);
        self.embarked = self.embarked.saturating_add(other.embarked);
        self.completed = self.completed.saturating_add(other.completed);
        self.aborted = self.aborted.saturating_add(other.aborted);
    }
}

/// A settlement and everything living in it.
#[derive(Debug)]
pub struct Settlement {
    /// Snapshot the decision engine reads.
    pub profile: SettlementProfile,
    /// Colonists and robots.
    pub agents: Vec<AgentSlot>,
    /// Expedition counters and generation.
    pub expeditions: ExpeditionRegistry,
    records: BTreeMap<ExpeditionId, ExpeditionRecord>,
}

impl Settlement {
    /// An empty settlement.
    pub fn new(profile: SettlementProfile) -> Self {
        Self {
            profile,
            agents: Vec::new(),
            expeditions: ExpeditionRegistry::new(),
            records: BTreeMap::new(),
        }
    }

    /// An empty settlement built from its configuration.
    pub fn from_config(config: &SettlementConfig) -> Self {
        let mut profile = SettlementProfile::new(config.name.clone(), config.indoor_capacity);
        profile.research_factor = config.research_factor;
        profile.tourism_factor = config.tourism_factor;
        profile.goods_factor = config.goods_factor;
        Self::new(profile)
    }

    /// Add an agent and refresh the population counts.
    pub fn add_agent(&mut self, slot: AgentSlot) {
        self.agents.push(slot);
        self.refresh_profile();
    }

    /// Expeditions in progress.
    pub fn records(&self) -> impl Iterator<Item = &ExpeditionRecord> {
        self.records.values()
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&AgentSlot> {
        self.agents.iter().find(|slot| slot.profile.id == id)
    }

    /// Recompute population, occupancy and researchers indoors.
    pub fn refresh_profile(&mut self) {
        let mut population: u32 = 0;
        let mut indoors: u32 = 0;
        let mut researchers: u32 = 0;
        for slot in self.agents.iter().filter(|s| s.profile.kind == AgentKind::Person) {
            population = population.saturating_add(1);
            if slot.profile.is_indoors() {
                indoors = indoors.saturating_add(1);
                if slot.profile.specialty.is_some_and(|s| s.is_researcher()) {
                    researchers = researchers.saturating_add(1);
                }
            }
        }
        self.profile.population = population;
        self.profile.indoor_occupancy = indoors;
        self.profile.researchers_indoors = researchers;
    }

    /// Drift colonist vitals and settlement chores by one pulse.
    pub fn apply_vitals(&mut self, vitals: &VitalsConfig) {
        let crowded = self.profile.overcrowding() > 0;
        for slot in &mut self.agents {
            let p = &mut slot.profile;
            if p.kind != AgentKind::Person {
                continue;
            }
            p.hunger = (p.hunger + vitals.hunger_per_pulse).min(VITAL_MAX);
            p.fatigue = (p.fatigue + vitals.fatigue_per_pulse).min(VITAL_MAX);
            if crowded {
                p.stress = (p.stress + vitals.stress_per_pulse).min(VITAL_MAX);
            }
        }
        let growth = vitals.chore_growth_per_pulse;
        let s = &mut self.profile;
        s.maintenance_backlog = (s.maintenance_backlog + growth).min(1.0);
        s.greenhouse_need = (s.greenhouse_need + growth).min(1.0);
        s.food_shortage = (s.food_shortage + growth).min(1.0);
    }

    /// Run every agent's scheduler for one pulse.
    ///
    /// With a pool, agents are updated in parallel. Each agent only reads
    /// the settlement snapshot; the registry is the one shared writer.
    pub fn step_agents(
        &mut self,
        pulse: &Pulse,
        vitals: &VitalsConfig,
        pool: Option<&ThreadPool>,
    ) -> Vec<PulseReport> {
        let Self {
            profile,
            agents,
            expeditions,
            ..
        } = self;
        let profile = &*profile;
        let expeditions = &*expeditions;
        let step = |slot: &mut AgentSlot| slot.step(profile, expeditions, pulse, vitals);

        match pool {
            Some(pool) if agents.len() > 1 => {
                pool.install(|| agents.par_iter_mut().filter_map(step).collect())
            }
            _ => agents.iter_mut().filter_map(step).collect(),
        }
    }

    /// Apply the settlement side of this pulse's reports: chores finished
    /// and every expedition slot claimed, including claims whose activity
    /// already finished within the pulse.
    pub fn apply_reports(
        &mut self,
        reports: &[PulseReport],
        pulse: u64,
        vitals: &VitalsConfig,
    ) -> LifecycleTally {
        let mut tally = LifecycleTally::default();
        for report in reports {
            let Some(slot) = find_agent(&mut self.agents, report.agent) else {
                continue;
            };
            if let Some(kind) = report.completed {
                apply_settlement_effects(&mut self.profile, kind, vitals);
            }
            for selection in &report.selections {
                let ActivityKind::PrepareExpedition(category) = selection.kind else {
                    continue;
                };
                let record = ExpeditionRecord {
                    id: ExpeditionId::new(),
                    category,
                    leader: report.agent,
                    stage: ExpeditionStage::Embarking,
                    claimed_at: pulse,
                    embarked_at: None,
                };
                info!(
                    settlement = %self.profile.name,
                    expedition = %record.id,
                    category = %category,
                    leader = %slot.profile.name,
                    "expedition proposed"
                );
                self.records.insert(record.id, record);
                tally.started = tally.started.saturating_add(1);
            }
        }
        tally
    }

    /// Move expeditions through their lifecycle.
    pub fn advance_expeditions(
        &mut self,
        pulse: u64,
        lifecycle: &LifecycleConfig,
    ) -> LifecycleTally {
        let mut tally = LifecycleTally::default();
        let ids: Vec<ExpeditionId> = self.records.keys().copied().collect();

        for id in ids {
            let Some(record) = self.records.get_mut(&id) else {
                continue;
            };
            let category = record.category;
            match record.stage {
                ExpeditionStage::Embarking
                    if pulse >= record.claimed_at.saturating_add(lifecycle.embark_after_pulses) =>
                {
                    let leader = find_agent(&mut self.agents, record.leader);
                    let Some(leader) = leader.filter(|slot| slot.profile.energy > 0.0) else {
                        if let Err(err) =
                            self.expeditions.abort(category, ExpeditionStage::Embarking)
                        {
                            warn!(
                                expedition = %id,
                                error = %err,
                                "expedition registry out of sync"
                            );
                        }
                        info!(
                            settlement = %self.profile.name,
                            expedition = %id,
                            %category,
                            "expedition aborted"
                        );
                        self.records.remove(&id);
                        tally.aborted = tally.aborted.saturating_add(1);
                        continue;
                    };
                    match self.expeditions.embark(category) {
                        Ok(counts) => {
                            leader.scheduler.abandon();
                            leader.profile.whereabouts = Whereabouts::Away;
                            record.stage = ExpeditionStage::Active;
                            record.embarked_at = Some(pulse);
                            info!(
                                settlement = %self.profile.name,
                                expedition = %id,
                                %category,
                                leader = %leader.profile.name,
                                active = counts.active,
                                "expedition departed"
                            );
                            tally.embarked = tally.embarked.saturating_add(1);
                        }
                        Err(err) => {
                            warn!(
                                expedition = %id,
                                error = %err,
                                "expedition registry out of sync"
                            );
                            self.records.remove(&id);
                        }
                    }
                }
                ExpeditionStage::Active
                    if record.embarked_at.is_some_and(|at| {
                        pulse >= at.saturating_add(lifecycle.duration_pulses)
                    }) =>
                {
                    if let Err(err) = self.expeditions.complete(category) {
                        warn!(expedition = %id, error = %err, "expedition registry out of sync");
                    }
                    if let Some(leader) = find_agent(&mut self.agents, record.leader) {
                        leader.profile.whereabouts = Whereabouts::Indoors;
                        leader.scheduler.invalidate();
                    }
                    info!(
                        settlement = %self.profile.name,
                        expedition = %id,
                        %category,
                        "expedition returned"
                    );
                    self.records.remove(&id);
                    tally.completed = tally.completed.saturating_add(1);
                }
                ExpeditionStage::Embarking | ExpeditionStage::Active => {}
            }
        }
        if tally.embarked > 0 || tally.completed > 0 || tally.aborted > 0 {
            self.refresh_profile();
        }
        tally
    }
}

fn find_agent(agents: &mut [AgentSlot], id: AgentId) -> Option<&mut AgentSlot> {
    agents.iter_mut().find(|slot| slot.profile.id == id)
}

/// Effects of finishing an activity on the agent who did it.
fn apply_agent_effects(agent: &mut AgentProfile, kind: ActivityKind, vitals: &VitalsConfig) {
    match kind {
        ActivityKind::EatMeal => {
            agent.hunger = 0.0;
            agent.energy = (agent.energy + vitals.meal_energy).min(VITAL_MAX);
        }
        ActivityKind::Sleep => {
            agent.fatigue = 0.0;
            agent.energy = (agent.energy + vitals.sleep_energy).min(VITAL_MAX);
        }
        ActivityKind::Recharge => agent.energy = VITAL_MAX,
        ActivityKind::Relax | ActivityKind::Converse => {
            agent.stress = (agent.stress - vitals.stress_relief).max(0.0);
        }
        ActivityKind::Workout => {
            agent.stress = (agent.stress - vitals.stress_relief / 2.0).max(0.0);
        }
        ActivityKind::Study => agent.skill = agent.skill.saturating_add(1).min(100),
        ActivityKind::Maintenance
        | ActivityKind::TendGreenhouse
        | ActivityKind::Cook
        | ActivityKind::Idle
        | ActivityKind::PrepareExpedition(_) => {}
    }
}

/// Effects of finishing an activity on the settlement.
fn apply_settlement_effects(
    settlement: &mut SettlementProfile,
    kind: ActivityKind,
    vitals: &VitalsConfig,
) {
    let relief = vitals.chore_relief;
    match kind {
        ActivityKind::Maintenance => {
            settlement.maintenance_backlog = (settlement.maintenance_backlog - relief).max(0.0);
        }
        ActivityKind::TendGreenhouse => {
            settlement.greenhouse_need = (settlement.greenhouse_need - relief).max(0.0);
        }
        ActivityKind::Cook => {
            settlement.food_shortage = (settlement.food_shortage - relief).max(0.0);
        }
        ActivityKind::EatMeal
        | ActivityKind::Sleep
        | ActivityKind::Recharge
        | ActivityKind::Relax
        | ActivityKind::Converse
        | ActivityKind::Workout
        | ActivityKind::Study
        | ActivityKind::Idle
        | ActivityKind::PrepareExpedition(_) => {}
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::sync::Arc;

    use colony_decision::providers::{EatMealProvider, RechargeProvider};
    use colony_decision::{
        DecisionConfig, DecisionEngine, ExpeditionCounts, ExpeditionPlanner, ExpeditionProvider,
        ProviderRegistry, PulseReport, Selection, SelectionSource,
    };
    use colony_types::{RobotType, Role, SimDuration, SimTime, Specialty};

    use super::*;

    fn make_settlement(engine: &DecisionEngine) -> Settlement {
        make_settlement_of(engine, [Specialty::Geologist, Specialty::Chef, Specialty::Scientist])
    }

    fn make_settlement_of(engine: &DecisionEngine, specialties: [Specialty; 3]) -> Settlement {
        let mut settlement = Settlement::from_config(&SettlementConfig::named("Alpha"));
        for (i, specialty) in specialties.into_iter().enumerate() {
            let profile = AgentProfile::person(
                format!("P{i}"),
                settlement.profile.id,
                specialty,
                Role::Resident,
            );
            let scheduler = engine.scheduler_for(&profile);
            settlement.add_agent(AgentSlot::new(profile, scheduler, i as u64));
        }
        let robot = AgentProfile::robot("R0", settlement.profile.id, RobotType::RepairBot);
        let scheduler = engine.scheduler_for(&robot);
        settlement.add_agent(AgentSlot::new(robot, scheduler, 99));
        settlement
    }

    fn make_lone_colonist(engine: &DecisionEngine, specialty: Specialty, role: Role) -> Settlement {
        let mut settlement = Settlement::from_config(&SettlementConfig::named("Alpha"));
        let profile = AgentProfile::person("Lone", settlement.profile.id, specialty, role);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, 11));
        settlement
    }

    fn make_pulse(number: u64) -> Pulse {
        Pulse::new(number, SimTime::from_millisols(500.0), SimDuration::from_millisols(10.0))
    }

    fn prepare_report(agent: AgentId, category: ExpeditionCategory, pulse: u64) -> PulseReport {
        let kind = ActivityKind::PrepareExpedition(category);
        PulseReport {
            agent,
            pulse,
            rebuilt: None,
            selections: vec![Selection {
                candidate: kind.candidate_id(),
                kind,
                score: 10.0,
                source: SelectionSource::Drawn,
            }],
            interrupted: None,
            completed: None,
            deferred: None,
            energy_spent: 0.0,
        }
    }

    #[test]
    fn profile_counts_colonists_only() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let settlement = make_settlement(&engine);
        assert_eq!(settlement.profile.population, 3);
        assert_eq!(settlement.profile.indoor_occupancy, 3);
        assert_eq!(settlement.profile.researchers_indoors, 2);
    }

    #[test]
    fn vitals_drift_for_colonists() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let mut settlement = make_settlement(&engine);
        let vitals = VitalsConfig::default();
        settlement.apply_vitals(&vitals);
        assert_eq!(settlement.agents[0].profile.hunger, vitals.hunger_per_pulse);
        assert_eq!(settlement.agents[3].profile.hunger, 0.0);
        assert_eq!(settlement.profile.maintenance_backlog, vitals.chore_growth_per_pulse);
    }

    #[test]
    fn step_charges_energy_through_the_body() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let mut settlement = make_settlement(&engine);
        let reports = settlement.step_agents(&make_pulse(1), &VitalsConfig::default(), None);
        assert_eq!(reports.len(), 4);
        for (slot, report) in settlement.agents.iter().zip(&reports) {
            let expected = report.energy_spent.mul_add(-0.05, 100.0);
            assert!((slot.profile.energy - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn parallel_and_sequential_steps_agree() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        // Chefs never qualify for expeditions, so draws cannot race on the registry.
        let chefs = [Specialty::Chef; 3];
        let mut sequential = make_settlement_of(&engine, chefs);
        let mut parallel = make_settlement_of(&engine, chefs);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let vitals = VitalsConfig::default();

        for n in 1..=20 {
            let a = sequential.step_agents(&make_pulse(n), &vitals, None);
            let b = parallel.step_agents(&make_pulse(n), &vitals, Some(&pool));
            let kinds = |r: &[PulseReport]| -> Vec<_> {
                r.iter().map(|x| x.selection().map(|s| s.kind)).collect()
            };
            assert_eq!(kinds(&a), kinds(&b));
        }
    }

    #[test]
    fn completion_effects_apply() {
        let vitals = VitalsConfig::default();
        let mut settlement = SettlementProfile::new("Alpha", 10);
        settlement.maintenance_backlog = 0.5;
        let mut agent = AgentProfile::person("A", settlement.id, Specialty::Chef, Role::Resident);
        agent.energy = 50.0;
        agent.hunger = 60.0;

        apply_agent_effects(&mut agent, ActivityKind::EatMeal, &vitals);
        assert_eq!(agent.hunger, 0.0);
        assert_eq!(agent.energy, 90.0);
        apply_settlement_effects(&mut settlement, ActivityKind::EatMeal, &vitals);
        assert_eq!(settlement.maintenance_backlog, 0.5);

        apply_settlement_effects(&mut settlement, ActivityKind::Maintenance, &vitals);
        assert_eq!(settlement.maintenance_backlog, 0.25);
        apply_agent_effects(&mut agent, ActivityKind::Maintenance, &vitals);
        assert_eq!(agent.energy, 90.0);
    }

    #[test]
    fn finished_meal_is_seen_by_the_next_choice() {
        let config = DecisionConfig::default();
        let critical = config.critical_energy;
        let engine = DecisionEngine::new(config).unwrap();
        let mut settlement = make_lone_colonist(&engine, Specialty::Chef, Role::Resident);
        settlement.agents[0].profile.energy = 10.0;
        settlement.agents[0].profile.hunger = 90.0;
        let vitals = VitalsConfig::default();

        let mut urgent_meals = 0;
        let mut finished_at = None;
        for n in 1..=5 {
            let reports = settlement.step_agents(&make_pulse(n), &vitals, None);
            let report = &reports[0];
            urgent_meals += report
                .selections
                .iter()
                .filter(|s| s.source == SelectionSource::Override)
                .filter(|s| s.kind == ActivityKind::EatMeal)
                .count();
            if report.completed == Some(ActivityKind::EatMeal) {
                // The meal landed before the successor was chosen.
                let profile = &settlement.agents[0].profile;
                assert_eq!(profile.hunger, 0.0);
                assert!(profile.energy > critical);
                assert_ne!(report.selection().unwrap().source, SelectionSource::Override);
                finished_at = Some(n);
            }
            settlement.apply_reports(&reports, n, &vitals);
        }
        assert_eq!(finished_at, Some(4));
        assert_eq!(urgent_meals, 1);
    }

    #[test]
    fn expedition_claimed_and_finished_in_one_pulse_is_recorded() {
        let config = DecisionConfig::default();
        let limit = config.activity_upper_limit;
        let providers = ProviderRegistry::builder()
            .register(ExpeditionProvider::new(ExpeditionPlanner::new(
                config.expeditions.clone(),
            )))
            .survival(AgentKind::Person, Arc::new(EatMealProvider::new(limit)))
            .survival(AgentKind::Robot, Arc::new(RechargeProvider::new(limit)))
            .fallback(AgentKind::Person, ActivityKind::Idle)
            .fallback(AgentKind::Robot, ActivityKind::Recharge)
            .build()
            .unwrap();
        let engine = DecisionEngine::with_providers(config, providers).unwrap();
        let mut settlement = make_lone_colonist(&engine, Specialty::Geologist, Role::Commander);
        let vitals = VitalsConfig::default();
        // Longer than preparing an expedition takes.
        let elapsed = SimDuration::from_millisols(150.0);
        let long = Pulse::new(1, SimTime::from_millisols(500.0), elapsed);

        let reports = settlement.step_agents(&long, &vitals, None);
        assert!(matches!(reports[0].completed, Some(ActivityKind::PrepareExpedition(_))));
        let tally = settlement.apply_reports(&reports, 1, &vitals);

        let in_flight: u32 = settlement
            .expeditions
            .snapshot()
            .values()
            .map(|counts| counts.in_flight())
            .sum();
        assert!(in_flight >= 1);
        assert_eq!(tally.started, in_flight);
        assert_eq!(settlement.records().count(), usize::try_from(in_flight).unwrap());
        let leader = settlement.agents[0].profile.id;
        assert!(settlement.records().all(|record| record.leader == leader));
    }

    #[test]
    fn expedition_lifecycle_runs_to_completion() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let mut settlement = make_settlement(&engine);
        let leader = settlement.agents[0].profile.id;
        let category = ExpeditionCategory::Exploration;
        let lifecycle = LifecycleConfig {
            embark_after_pulses: 2,
            duration_pulses: 3,
        };
        let vitals = VitalsConfig::default();

        // The candidate claimed the slot during instantiation.
        settlement.expeditions.try_start(category, 1).unwrap();
        let tally = settlement.apply_reports(&[prepare_report(leader, category, 1)], 1, &vitals);
        assert_eq!(tally.started, 1);

        assert_eq!(settlement.advance_expeditions(2, &lifecycle), LifecycleTally::default());
        let tally = settlement.advance_expeditions(3, &lifecycle);
        assert_eq!(tally.embarked, 1);
        assert_eq!(settlement.agent(leader).unwrap().profile.whereabouts, Whereabouts::Away);
        assert_eq!(settlement.profile.indoor_occupancy, 2);
        assert_eq!(
            settlement.expeditions.counts(category),
            ExpeditionCounts { active: 1, embarking: 0 }
        );

        // Away agents are not scheduled.
        let reports = settlement.step_agents(&make_pulse(4), &vitals, None);
        assert!(reports.iter().all(|r| r.agent != leader));

        let tally = settlement.advance_expeditions(6, &lifecycle);
        assert_eq!(tally.completed, 1);
        assert_eq!(settlement.agent(leader).unwrap().profile.whereabouts, Whereabouts::Indoors);
        assert_eq!(settlement.expeditions.counts(category).in_flight(), 0);
        assert_eq!(settlement.records().count(), 0);
    }

    #[test]
    fn exhausted_leader_aborts() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let mut settlement = make_settlement(&engine);
        let leader = settlement.agents[0].profile.id;
        let category = ExpeditionCategory::Mining;
        let lifecycle = LifecycleConfig {
            embark_after_pulses: 1,
            duration_pulses: 3,
        };

        settlement.expeditions.try_start(category, 1).unwrap();
        let reports = [prepare_report(leader, category, 1)];
        settlement.apply_reports(&reports, 1, &VitalsConfig::default());
        settlement.agents[0].profile.energy = 0.0;

        let tally = settlement.advance_expeditions(2, &lifecycle);
        assert_eq!(tally.aborted, 1);
        assert_eq!(settlement.expeditions.counts(category).in_flight(), 0);
        assert_eq!(settlement.agent(leader).unwrap().profile.whereabouts, Whereabouts::Indoors);
    }
}
