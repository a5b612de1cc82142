//! Pulse cycle: the loop that drives every agent's decisions once per pulse.
//!
//! Each pulse runs these phases for every settlement:
//!
//! 1. **Clock** -- advance simulated time by one pulse.
//! 2. **Vitals** -- drift colonist hunger, fatigue and stress and grow the
//!    settlement's chores, then refresh the settlement snapshot.
//! 3. **Decision** -- run each agent's [`AgentScheduler`] against the
//!    snapshot, in parallel when a worker pool is configured.
//! 4. **Effects** -- apply finished activities and record newly claimed
//!    expeditions.
//! 5. **Lifecycle** -- move expeditions from embarking to active to done.
//!
//! Given the same seed, the outcome does not depend on the worker count as
//! long as no two agents of a settlement race for the same expedition slot.
//!
//! [`AgentScheduler`]: colony_decision::AgentScheduler

use std::collections::BTreeMap;

use colony_decision::{ExpeditionCounts, PulseReport, SelectionSource};
use colony_types::{DayPhase, ExpeditionCategory, SimTime};
use rayon::ThreadPool;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, MarsClock};
use crate::config::{LifecycleConfig, SimulationConfig, VitalsConfig};
use crate::settlement::{LifecycleTally, Settlement};

/// Errors that can occur during pulse execution.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single pulse across all settlements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PulseSummary {
    /// Pulse number.
    pub pulse: u64,
    /// Simulated time at the end of the pulse.
    pub time: SimTime,
    /// Phase of the day.
    pub day_phase: Option<DayPhase>,
    /// Agents scheduled this pulse (agents away are not counted).
    pub agents: u32,
    /// Candidate sets rebuilt.
    pub rebuilds: u32,
    /// Activities started, by label.
    pub selections: BTreeMap<String, u32>,
    /// Selections that fell back to the kind's default activity.
    pub fallbacks: u32,
    /// Survival overrides of an urgent agent.
    pub overrides: u32,
    /// Switches to a clearly better activity.
    pub switches: u32,
    /// Agents deferred to the next pulse after a failed selection.
    pub deferred: u32,
    /// Activities that ran to completion.
    pub completed: u32,
    /// Expedition transitions.
    pub lifecycle: LifecycleTally,
    /// Energy charged across all agents, in activity units.
    pub energy_spent: f64,
    /// Expeditions in flight per category, summed over settlements.
    pub expeditions: BTreeMap<ExpeditionCategory, ExpeditionCounts>,
}

impl PulseSummary {
    fn record(&mut self, report: &PulseReport) {
        self.agents = self.agents.saturating_add(1);
        self.energy_spent += report.energy_spent;
        if report.rebuilt.is_some() {
            self.rebuilds = self.rebuilds.saturating_add(1);
        }
        if report.deferred.is_some() {
            self.deferred = self.deferred.saturating_add(1);
        }
        if report.completed.is_some() {
            self.completed = self.completed.saturating_add(1);
        }
        for selection in &report.selections {
            let count = self
                .selections
                .entry(selection.kind.label().to_owned())
                .or_default();
            *count = count.saturating_add(1);
            let counter = match selection.source {
                SelectionSource::Drawn => None,
                SelectionSource::Fallback => Some(&mut self.fallbacks),
                SelectionSource::Override => Some(&mut self.overrides),
                SelectionSource::Switched => Some(&mut self.switches),
            };
            if let Some(counter) = counter {
                *counter = counter.saturating_add(1);
            }
        }
    }

    fn record_expeditions(&mut self, settlement: &Settlement) {
        for (category, counts) in settlement.expeditions.snapshot() {
            if counts.in_flight() == 0 {
                continue;
            }
            let total = self.expeditions.entry(category).or_default();
            total.active = total.active.saturating_add(counts.active);
            total.embarking = total.embarking.saturating_add(counts.embarking);
        }
    }
}

/// The mutable simulation state passed through the pulse cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// The Mars clock.
    pub clock: MarsClock,
    /// Every settlement with its agents.
    pub settlements: Vec<Settlement>,
    /// Vitals rates.
    pub vitals: VitalsConfig,
    /// Expedition lifecycle timing.
    pub lifecycle: LifecycleConfig,
    /// Worker pool for the decision phase; `None` runs it sequentially.
    pool: Option<ThreadPool>,
}

impl SimulationState {
    /// Bundle populated settlements with a clock and pool built from
    /// `config`.
    ///
    /// If the worker pool cannot be built, the decision phase runs
    /// sequentially.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Clock`] if the world timing is invalid.
    pub fn new(
        config: &SimulationConfig,
        settlements: Vec<Settlement>,
    ) -> Result<Self, PulseError> {
        let world = &config.world;
        let clock = MarsClock::new(
            world.pulse_millisols,
            SimTime::from_millisols(world.start_millisol),
        )?;
        Ok(Self {
            clock,
            settlements,
            vitals: config.vitals.clone(),
            lifecycle: config.lifecycle.clone(),
            pool: build_pool(world.worker_threads),
        })
    }

    /// Worker threads used by the decision phase.
    pub fn worker_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }

    /// Agents across all settlements.
    pub fn agent_count(&self) -> usize {
        self.settlements.iter().map(|s| s.agents.len()).sum()
    }
}

fn build_pool(worker_threads: usize) -> Option<ThreadPool> {
    if worker_threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads)
        .thread_name(|i| format!("colony-worker-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!(worker_threads, error = %err, "worker pool unavailable, running sequentially");
            None
        }
    }
}

/// Execute one complete pulse of the simulation.
///
/// # Errors
///
/// Returns [`PulseError::Clock`] if the clock cannot advance.
pub fn run_pulse(state: &mut SimulationState) -> Result<PulseSummary, PulseError> {
    let pulse = state.clock.advance()?;
    let mut summary = PulseSummary {
        pulse: pulse.number,
        time: pulse.now,
        day_phase: Some(pulse.day_phase()),
        ..PulseSummary::default()
    };
    debug!(pulse = pulse.number, time = %pulse.now, "pulse started");

    let SimulationState {
        settlements,
        vitals,
        lifecycle,
        pool,
        ..
    } = state;

    for settlement in settlements.iter_mut() {
        settlement.apply_vitals(vitals);
        settlement.refresh_profile();

        let reports = settlement.step_agents(&pulse, vitals, pool.as_ref());
        for report in &reports {
            summary.record(report);
        }

        let mut tally = settlement.apply_reports(&reports, pulse.number, vitals);
        tally.merge(settlement.advance_expeditions(pulse.number, lifecycle));
        summary.lifecycle.merge(tally);
        settlement.refresh_profile();
        summary.record_expeditions(settlement);
    }

    if summary.lifecycle.started > 0 || summary.lifecycle.completed > 0 {
        info!(
            pulse = pulse.number,
            started = summary.lifecycle.started,
            embarked = summary.lifecycle.embarked,
            completed = summary.lifecycle.completed,
            aborted = summary.lifecycle.aborted,
            "expedition activity"
        );
    }
    Ok(summary)
}
