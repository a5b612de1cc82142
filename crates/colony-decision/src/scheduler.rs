//! Per-agent activity scheduling.
//!
//! Each agent owns one [`AgentScheduler`]. On every pulse it:
//!
//! 1. Checks the urgent override. Below the critical energy threshold any
//!    non-survival activity is interrupted and a survival-only candidate
//!    set is drawn from.
//! 2. Drops the current activity if its preconditions no longer hold.
//! 3. Selects a new activity if there is none, rebuilding the cached
//!    candidate set when it is stale, outdated or of the wrong scope.
//! 4. When the cache expires under a running activity, draws again and
//!    switches only if the challenger clearly outscores the incumbent.
//! 5. Executes the current activity for the pulse's elapsed time and
//!    charges its energy cost to the agent.
//! 6. On completion, lets the [`AgentBody`] apply the finished activity's
//!    effects, then selects the next activity straight away so the agent
//!    is never left without one.
//!
//! The scheduler never fails. Instantiation races are logged, the pulse is
//! deferred, and selection is retried next pulse against a fresh set.

use std::sync::Arc;

use colony_types::{
    AgentId, AgentKind, AgentProfile, Pulse, SettlementProfile, SimDuration, SimTime,
};
use rand::Rng;
use tracing::{debug, trace};

use crate::activity::{ActivityKind, RunningActivity};
use crate::candidate::{ActivityCandidate, Candidate, CandidateId, DecisionContext};
use crate::candidate_set::{CacheScope, CandidateSet};
use crate::config::DecisionConfig;
use crate::error::InstantiationError;
use crate::expedition::ExpeditionRegistry;
use crate::provider::ProviderRegistry;

/// Scheduling constants derived from [`DecisionConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerSettings {
    /// Candidate set time-to-live.
    pub cache_ttl: SimDuration,
    /// Energy below which the urgent override applies.
    pub critical_energy: f64,
    /// Factor a challenger must beat the incumbent's score by.
    pub switch_margin: f64,
}

impl From<&DecisionConfig> for SchedulerSettings {
    fn from(config: &DecisionConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            critical_energy: config.critical_energy,
            switch_margin: config.switch_margin,
        }
    }
}

/// The agent-state collaborator: what the scheduler reads and charges.
pub trait AgentBody {
    /// Current snapshot of the agent.
    fn profile(&self) -> &AgentProfile;

    /// Deduct `amount` of energy spent on an activity.
    fn consume_energy(&mut self, amount: f64);

    /// Apply the effects of a finished activity.
    ///
    /// Called before the next activity is chosen in the same pulse, so the
    /// choice sees the agent as the finished activity left it. Does nothing
    /// by default.
    fn complete(&mut self, _kind: ActivityKind) {}
}

impl AgentBody for AgentProfile {
    fn profile(&self) -> &AgentProfile {
        self
    }

    fn consume_energy(&mut self, amount: f64) {
        self.energy = (self.energy - amount).max(0.0);
    }
}

/// How a selection came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Weighted draw from the general candidate set.
    Drawn,
    /// No candidate had a positive score.
    Fallback,
    /// Drawn from the survival set by the urgent override.
    Override,
    /// Replaced a running activity after a cache refresh.
    Switched,
}

/// An activity chosen during a pulse.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Selection {
    /// Key of the chosen candidate.
    pub candidate: CandidateId,
    /// The activity kind started.
    pub kind: ActivityKind,
    /// Score at selection time (0 for the fallback).
    pub score: f64,
    /// How it was chosen.
    pub source: SelectionSource,
}

/// What one agent did during one pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseReport {
    /// The agent.
    pub agent: AgentId,
    /// Pulse number.
    pub pulse: u64,
    /// Scope of the candidate set rebuilt this pulse, if any.
    pub rebuilt: Option<CacheScope>,
    /// Activities started this pulse, in order. There are two when the
    /// first one finished within the pulse and a successor was chosen.
    pub selections: Vec<Selection>,
    /// Activity cut short this pulse, if any.
    pub interrupted: Option<ActivityKind>,
    /// Activity that ran to completion this pulse, if any.
    pub completed: Option<ActivityKind>,
    /// Selection failure that deferred the agent to the next pulse.
    pub deferred: Option<InstantiationError>,
    /// Energy charged to the agent.
    pub energy_spent: f64,
}

impl PulseReport {
    fn new(agent: AgentId, pulse: u64) -> Self {
        Self {
            agent,
            pulse,
            rebuilt: None,
            selections: Vec::new(),
            interrupted: None,
            completed: None,
            deferred: None,
            energy_spent: 0.0,
        }
    }

    /// The activity the agent ended the pulse on, if one was started.
    pub fn selection(&self) -> Option<&Selection> {
        self.selections.last()
    }
}

/// Decision state for one agent.
#[derive(Debug)]
pub struct AgentScheduler {
    agent: AgentId,
    kind: AgentKind,
    providers: Arc<ProviderRegistry>,
    settings: SchedulerSettings,
    current: Option<RunningActivity>,
    cache: Option<Arc<CandidateSet>>,
    last_rebuild: Option<SimTime>,
    force_rebuild: bool,
}

impl AgentScheduler {
    /// Idle scheduler for an agent of `kind`.
    pub const fn new(
        agent: AgentId,
        kind: AgentKind,
        providers: Arc<ProviderRegistry>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            agent,
            kind,
            providers,
            settings,
            current: None,
            cache: None,
            last_rebuild: None,
            force_rebuild: false,
        }
    }

    /// The agent this scheduler decides for.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// The activity in progress, if any.
    pub const fn current(&self) -> Option<&RunningActivity> {
        self.current.as_ref()
    }

    /// The cached candidate set, if any.
    pub fn cache(&self) -> Option<Arc<CandidateSet>> {
        self.cache.clone()
    }

    /// When the cache was last rebuilt.
    pub const fn last_rebuild(&self) -> Option<SimTime> {
        self.last_rebuild
    }

    /// Force a rebuild on the next pulse.
    pub const fn invalidate(&mut self) {
        self.force_rebuild = true;
    }

    /// Drop the current activity without a replacement.
    ///
    /// Returns the activity that was running.
    pub fn abandon(&mut self) -> Option<RunningActivity> {
        self.force_rebuild = true;
        self.current.take()
    }

    /// Advance the agent by one pulse.
    pub fn on_pulse<B, R>(
        &mut self,
        body: &mut B,
        settlement: &SettlementProfile,
        expeditions: &ExpeditionRegistry,
        pulse: &Pulse,
        rng: &mut R,
    ) -> PulseReport
    where
        B: AgentBody + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = PulseReport::new(self.agent, pulse.number);

        let ctx = DecisionContext {
            agent: body.profile(),
            settlement,
            expeditions,
            pulse: *pulse,
        };
        self.decide(&ctx, rng, &mut report);

        self.execute(body, pulse.elapsed, &mut report);

        if self.current.is_none() && report.completed.is_some() {
            let ctx = DecisionContext {
                agent: body.profile(),
                settlement,
                expeditions,
                pulse: *pulse,
            };
            let scope = self.scope_for(ctx.agent);
            self.select(&ctx, scope, rng, &mut report);
        }
        report
    }

    fn scope_for(&self, agent: &AgentProfile) -> CacheScope {
        if agent.energy < self.settings.critical_energy {
            CacheScope::Survival
        } else {
            CacheScope::General
        }
    }

    fn decide<R: Rng + ?Sized>(
        &mut self,
        ctx: &DecisionContext<'_>,
        rng: &mut R,
        report: &mut PulseReport,
    ) {
        if self.scope_for(ctx.agent) == CacheScope::Survival {
            if let Some(current) = &self.current
                && current.is_survival()
                && current.is_valid_for(ctx.agent)
            {
                return;
            }
            if let Some(dropped) = self.current.take() {
                debug!(
                    agent = %self.agent,
                    energy = ctx.agent.energy,
                    interrupted = %dropped.kind(),
                    "urgent override"
                );
                report.interrupted = Some(dropped.kind());
            }
            self.select(ctx, CacheScope::Survival, rng, report);
            return;
        }

        if let Some(current) = &self.current
            && !current.is_valid_for(ctx.agent)
        {
            trace!(agent = %self.agent, activity = %current.kind(), "activity no longer valid");
            report.interrupted = Some(current.kind());
            self.current = None;
            self.force_rebuild = true;
        }

        if self.current.is_none() {
            self.select(ctx, CacheScope::General, rng, report);
        } else if self.needs_rebuild(ctx, CacheScope::General) {
            self.reconsider(ctx, rng, report);
        }
    }

    fn needs_rebuild(&self, ctx: &DecisionContext<'_>, scope: CacheScope) -> bool {
        if self.force_rebuild {
            return true;
        }
        self.cache.as_ref().is_none_or(|set| {
            set.scope() != scope
                || set.is_stale(ctx.pulse.now, self.settings.cache_ttl)
                || set.is_outdated(ctx.expeditions.generation())
        })
    }

    fn rebuild(&mut self, ctx: &DecisionContext<'_>, scope: CacheScope) -> Arc<CandidateSet> {
        let mut set = CandidateSet::new(
            format!("{}/{scope:?}", ctx.agent.name),
            ctx.pulse.now,
        )
        .with_generation(ctx.expeditions.generation())
        .with_scope(scope);

        if let Some(table) = self.providers.table(self.kind) {
            match scope {
                CacheScope::General => {
                    for provider in table.general() {
                        set.add_batch(provider.propose(ctx));
                    }
                }
                CacheScope::Survival => set.add_batch(table.survival().propose(ctx)),
            }
        }
        trace!(
            agent = %self.agent,
            scope = ?scope,
            candidates = set.len(),
            total_weight = set.total_weight(),
            "candidate set rebuilt"
        );

        let set = Arc::new(set);
        self.cache = Some(Arc::clone(&set));
        self.last_rebuild = Some(ctx.pulse.now);
        self.force_rebuild = false;
        set
    }

    fn cached_or_rebuilt(
        &mut self,
        ctx: &DecisionContext<'_>,
        scope: CacheScope,
        report: &mut PulseReport,
    ) -> Arc<CandidateSet> {
        if !self.needs_rebuild(ctx, scope)
            && let Some(set) = &self.cache
        {
            return Arc::clone(set);
        }
        report.rebuilt = Some(scope);
        self.rebuild(ctx, scope)
    }

    fn fallback(&self) -> ActivityKind {
        self.providers
            .table(self.kind)
            .map_or(ActivityKind::Idle, |table| table.fallback())
    }

    fn select<R: Rng + ?Sized>(
        &mut self,
        ctx: &DecisionContext<'_>,
        scope: CacheScope,
        rng: &mut R,
        report: &mut PulseReport,
    ) {
        let set = self.cached_or_rebuilt(ctx, scope, report);
        let fallback = ActivityCandidate::new(self.fallback());

        let drawn_source = match scope {
            CacheScope::General => SelectionSource::Drawn,
            CacheScope::Survival => SelectionSource::Override,
        };
        let (candidate, score, source): (&dyn Candidate, f64, SelectionSource) =
            set.draw_entry(rng).map_or(
                (&fallback, 0.0, SelectionSource::Fallback),
                |entry| (entry.candidate(), entry.score().score(), drawn_source),
            );

        match candidate.instantiate(ctx, score) {
            Ok(activity) => {
                debug!(
                    agent = %self.agent,
                    activity = activity.description(),
                    score,
                    source = ?source,
                    "activity selected"
                );
                report.selections.push(Selection {
                    candidate: activity.candidate().clone(),
                    kind: activity.kind(),
                    score,
                    source,
                });
                self.current = Some(activity);
            }
            Err(err) => {
                debug!(
                    agent = %self.agent,
                    candidate = %candidate.id(),
                    error = %err,
                    "selection deferred"
                );
                self.force_rebuild = true;
                report.deferred = Some(err);
            }
        }
    }

    fn reconsider<R: Rng + ?Sized>(
        &mut self,
        ctx: &DecisionContext<'_>,
        rng: &mut R,
        report: &mut PulseReport,
    ) {
        report.rebuilt = Some(CacheScope::General);
        let set = self.rebuild(ctx, CacheScope::General);
        let Some(current) = &self.current else {
            return;
        };
        let Some(entry) = set.draw_entry(rng) else {
            return;
        };
        if &entry.id() == current.candidate() {
            return;
        }
        let challenger = entry.score().score();
        if challenger <= current.score() * self.settings.switch_margin {
            return;
        }
        match entry.candidate().instantiate(ctx, challenger) {
            Ok(next) => {
                debug!(
                    agent = %self.agent,
                    from = %current.kind(),
                    to = %next.kind(),
                    challenger,
                    incumbent = current.score(),
                    "switching activity"
                );
                report.interrupted = Some(current.kind());
                report.selections.push(Selection {
                    candidate: next.candidate().clone(),
                    kind: next.kind(),
                    score: challenger,
                    source: SelectionSource::Switched,
                });
                self.current = Some(next);
            }
            Err(err) => {
                debug!(agent = %self.agent, error = %err, "switch abandoned");
                report.deferred = Some(err);
            }
        }
    }

    fn execute<B: AgentBody + ?Sized>(
        &mut self,
        body: &mut B,
        elapsed: SimDuration,
        report: &mut PulseReport,
    ) {
        let efficiency = body.profile().efficiency();
        let Some(activity) = self.current.as_mut() else {
            return;
        };
        let progress = activity.perform(elapsed);
        let cost = activity.energy_cost(progress.time_spent, efficiency);
        if cost > 0.0 {
            body.consume_energy(cost);
        }
        report.energy_spent = cost;
        if progress.finished {
            let kind = activity.kind();
            trace!(agent = %self.agent, activity = %kind, "activity completed");
            report.completed = Some(kind);
            self.current = None;
            body.complete(kind);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use colony_types::{RobotType, Role, Specialty, Whereabouts};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::provider::{CandidateProvider, Proposal};
    use crate::score::Score;

    fn make_scheduler(agent: &AgentProfile) -> AgentScheduler {
        let config = DecisionConfig::default();
        let providers = Arc::new(ProviderRegistry::standard(&config).unwrap());
        AgentScheduler::new(agent.id, agent.kind, providers, SchedulerSettings::from(&config))
    }

    fn make_settlement() -> SettlementProfile {
        let mut s = SettlementProfile::new("Alpha", 20);
        s.population = 10;
        s.indoor_occupancy = 10;
        s
    }

    fn pulse(number: u64, at: f64) -> Pulse {
        Pulse::new(number, SimTime::from_millisols(at), SimDuration::from_millisols(10.0))
    }

    #[test]
    fn first_pulse_selects_and_executes() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(7);

        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(1, 500.0),
            &mut rng,
        );
        assert_eq!(report.rebuilt, Some(CacheScope::General));
        assert!(report.selection().is_some());
        assert!(scheduler.current().is_some());
        assert!(report.energy_spent > 0.0);
        assert!(agent.energy < 100.0);
    }

    #[test]
    fn cache_is_reused_within_ttl() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(7);

        scheduler.on_pulse(&mut agent, &settlement, &registry, &pulse(1, 500.0), &mut rng);
        let first = scheduler.cache().unwrap();
        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(2, 505.0),
            &mut rng,
        );
        assert_eq!(report.rebuilt, None);
        assert!(Arc::ptr_eq(&first, &scheduler.cache().unwrap()));
    }

    #[test]
    fn generation_bump_outdates_cache() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(7);

        scheduler.on_pulse(&mut agent, &settlement, &registry, &pulse(1, 500.0), &mut rng);
        registry.bump_generation();
        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(2, 505.0),
            &mut rng,
        );
        assert_eq!(report.rebuilt, Some(CacheScope::General));
    }

    #[test]
    fn urgent_override_interrupts_general_activity() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(7);

        scheduler.on_pulse(&mut agent, &settlement, &registry, &pulse(1, 500.0), &mut rng);
        let before = scheduler.current().unwrap().kind();
        assert_ne!(before, ActivityKind::EatMeal);

        agent.energy = 5.0;
        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(2, 505.0),
            &mut rng,
        );
        assert_eq!(report.interrupted, Some(before));
        assert_eq!(report.rebuilt, Some(CacheScope::Survival));
        let selection = report.selection().unwrap();
        assert_eq!(selection.kind, ActivityKind::EatMeal);
        assert_eq!(selection.source, SelectionSource::Override);
    }

    #[test]
    fn leaving_the_building_invalidates_indoor_activity() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(3);

        scheduler.on_pulse(&mut agent, &settlement, &registry, &pulse(1, 500.0), &mut rng);
        let before = scheduler.current().unwrap().kind();
        agent.whereabouts = Whereabouts::Outside;

        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(2, 505.0),
            &mut rng,
        );
        assert_eq!(report.interrupted, Some(before));
        let selection = report.selection().unwrap();
        assert_eq!(selection.kind, ActivityKind::Idle);
        assert_eq!(selection.source, SelectionSource::Fallback);
    }

    #[test]
    fn robot_falls_back_to_recharge() {
        let settlement = make_settlement();
        let mut robot = AgentProfile::robot("R1", settlement.id, RobotType::RepairBot);
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&robot);
        let mut rng = SmallRng::seed_from_u64(1);

        let report = scheduler.on_pulse(
            &mut robot,
            &settlement,
            &registry,
            &pulse(1, 500.0),
            &mut rng,
        );
        let selection = report.selection().unwrap();
        assert_eq!(selection.kind, ActivityKind::Recharge);
        assert_eq!(selection.source, SelectionSource::Fallback);
    }

    #[test]
    fn completion_selects_the_next_activity_immediately() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        agent.whereabouts = Whereabouts::Outside;
        let registry = ExpeditionRegistry::new();
        let mut scheduler = make_scheduler(&agent);
        let mut rng = SmallRng::seed_from_u64(1);

        // Outside, only idling applies, and idling is shorter than the pulse.
        let long = Pulse::new(1, SimTime::from_millisols(500.0), SimDuration::from_millisols(25.0));
        let report = scheduler.on_pulse(&mut agent, &settlement, &registry, &long, &mut rng);
        assert_eq!(report.completed, Some(ActivityKind::Idle));
        assert_eq!(report.selections.len(), 2);
        assert_eq!(report.energy_spent, 20.0);
        assert_eq!(scheduler.current().unwrap().kind(), ActivityKind::Idle);
        assert_eq!(scheduler.current().unwrap().remaining().millisols(), 20.0);
    }

    #[derive(Debug)]
    struct Refusing;

    impl Candidate for Refusing {
        fn id(&self) -> CandidateId {
            CandidateId::new("refusing")
        }

        fn describe(&self) -> String {
            "refusing".to_owned()
        }

        fn instantiate(
            &self,
            _ctx: &DecisionContext<'_>,
            _score: f64,
        ) -> Result<RunningActivity, InstantiationError> {
            Err(InstantiationError::NoLongerApplicable {
                candidate: self.id(),
                reason: "gone".to_owned(),
            })
        }
    }

    #[derive(Debug)]
    struct RefusingProvider;

    impl CandidateProvider for RefusingProvider {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn applicable_to(&self, _kind: AgentKind) -> bool {
            true
        }

        fn propose(&self, _ctx: &DecisionContext<'_>) -> Vec<Proposal> {
            vec![(Box::new(Refusing), Score::new("stub", 1.0))]
        }
    }

    #[test]
    fn failed_instantiation_defers_and_forces_rebuild() {
        let settlement = make_settlement();
        let mut agent =
            AgentProfile::person("Ada", settlement.id, Specialty::Chef, Role::Resident);
        let registry = ExpeditionRegistry::new();
        let providers = ProviderRegistry::builder()
            .register(RefusingProvider)
            .survival(AgentKind::Person, Arc::new(RefusingProvider))
            .survival(AgentKind::Robot, Arc::new(RefusingProvider))
            .fallback(AgentKind::Person, ActivityKind::Idle)
            .fallback(AgentKind::Robot, ActivityKind::Recharge)
            .build()
            .unwrap();
        let config = DecisionConfig::default();
        let mut scheduler = AgentScheduler::new(
            agent.id,
            agent.kind,
            Arc::new(providers),
            SchedulerSettings::from(&config),
        );
        let mut rng = SmallRng::seed_from_u64(1);

        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(1, 500.0),
            &mut rng,
        );
        assert!(matches!(
            report.deferred,
            Some(InstantiationError::NoLongerApplicable { .. })
        ));
        assert!(report.selections.is_empty());
        assert!(scheduler.current().is_none());
        assert_eq!(report.energy_spent, 0.0);
        assert_eq!(agent.energy, 100.0);

        // Still inside the TTL, but the failure forces a fresh set.
        let report = scheduler.on_pulse(
            &mut agent,
            &settlement,
            &registry,
            &pulse(2, 502.0),
            &mut rng,
        );
        assert_eq!(report.rebuilt, Some(CacheScope::General));
    }
}
