//! Simulation loop runner.
//!
//! [`run_simulation`] drives the pulse loop with support for:
//!
//! - **Bounded runs**: stop after `max_pulses` or `max_real_time_seconds`
//! - **Pulse pacing**: a real-time interval between pulses (0 = flat out)
//! - **Clean shutdown**: a stop signal ends the run between pulses
//!
//! The runner wraps the single-pulse [`run_pulse`] function and adds the
//! control plane around it.
//!
//! [`run_pulse`]: crate::pulse::run_pulse

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::pulse::{self, PulseError, PulseSummary, SimulationState};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A pulse execution failed.
    #[error("pulse error: {source}")]
    Pulse {
        /// The underlying pulse error.
        #[from]
        source: PulseError,
    },
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The pulse limit was reached.
    MaxPulses,
    /// The wall-clock limit was reached.
    MaxRealTime,
    /// A stop was requested.
    Stopped,
}

/// Bounds and pacing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Pulses to run (0 = unlimited).
    pub max_pulses: u64,
    /// Wall-clock budget, if any.
    pub max_real_time: Option<Duration>,
    /// Real-time pause between pulses.
    pub interval: Duration,
}

impl RunLimits {
    /// Limits taken from the `simulation` and `world` sections.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        let seconds = config.simulation.max_real_time_seconds;
        Self {
            max_pulses: config.simulation.max_pulses,
            max_real_time: if seconds == 0 {
                None
            } else {
                Some(Duration::from_secs(seconds))
            },
            interval: Duration::from_millis(config.world.pulse_interval_ms),
        }
    }

    /// Run exactly `pulses` pulses without pausing.
    pub const fn pulses(pulses: u64) -> Self {
        Self {
            max_pulses: pulses,
            max_real_time: None,
            interval: Duration::ZERO,
        }
    }

    const fn pulse_limit_reached(&self, pulse: u64) -> bool {
        self.max_pulses > 0 && pulse >= self.max_pulses
    }

    fn time_limit_reached(&self, started: Instant) -> bool {
        self.max_real_time
            .is_some_and(|limit| started.elapsed() >= limit)
    }
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last pulse summary, if any pulse completed.
    pub final_summary: Option<PulseSummary>,
    /// Total number of pulses executed.
    pub total_pulses: u64,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
}

/// Callback invoked after each pulse completes.
pub trait PulseCallback: Send {
    /// Called after a pulse completes successfully.
    fn on_pulse(&mut self, summary: &PulseSummary, state: &SimulationState);
}

/// A no-op pulse callback for testing.
pub struct NoOpCallback;

impl PulseCallback for NoOpCallback {
    fn on_pulse(&mut self, _summary: &PulseSummary, _state: &SimulationState) {}
}

/// Logs a digest of every Nth pulse.
#[derive(Debug, Clone, Copy)]
pub struct SummaryLogger {
    every: u64,
}

impl SummaryLogger {
    /// Log every `every` pulses (0 = never).
    pub const fn new(every: u64) -> Self {
        Self { every }
    }
}

impl PulseCallback for SummaryLogger {
    fn on_pulse(&mut self, summary: &PulseSummary, state: &SimulationState) {
        if self.every == 0 || !summary.pulse.is_multiple_of(self.every) {
            return;
        }
        let in_flight: u32 = summary
            .expeditions
            .values()
            .map(|c| c.in_flight())
            .sum();
        info!(
            pulse = summary.pulse,
            sol = state.clock.sol(),
            day_phase = ?summary.day_phase,
            agents = summary.agents,
            rebuilds = summary.rebuilds,
            overrides = summary.overrides,
            switches = summary.switches,
            fallbacks = summary.fallbacks,
            expeditions_in_flight = in_flight,
            "Pulse summary"
        );
    }
}

/// Run the simulation loop until a termination condition is met.
///
/// The stop signal is checked before every pulse and interrupts the pause
/// between pulses. Sending `true` ends the run after the current pulse.
///
/// # Errors
///
/// Returns [`RunnerError`] if a pulse fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    limits: RunLimits,
    mut stop: watch::Receiver<bool>,
    callback: &mut dyn PulseCallback,
) -> Result<SimulationResult, RunnerError> {
    let started_at = Utc::now();
    let started = Instant::now();
    let mut last_summary: Option<PulseSummary> = None;
    let mut total_pulses: u64 = 0;

    info!(
        max_pulses = limits.max_pulses,
        max_real_time_seconds = limits.max_real_time.map(|d| d.as_secs()),
        pulse_interval_ms = u64::try_from(limits.interval.as_millis()).unwrap_or(u64::MAX),
        agents = state.agent_count(),
        worker_threads = state.worker_threads(),
        "Simulation starting"
    );

    let end_reason = loop {
        if *stop.borrow() {
            info!("Stop requested");
            break EndReason::Stopped;
        }

        if limits.time_limit_reached(started) {
            info!(elapsed_ms = started.elapsed().as_millis(), "Real-time limit reached");
            break EndReason::MaxRealTime;
        }

        let summary = pulse::run_pulse(state)?;
        total_pulses = total_pulses.saturating_add(1);
        callback.on_pulse(&summary, state);

        let pulse = summary.pulse;
        last_summary = Some(summary);

        if limits.pulse_limit_reached(total_pulses) {
            info!(pulse, max_pulses = limits.max_pulses, "Pulse limit reached");
            break EndReason::MaxPulses;
        }

        pause(limits.interval, &mut stop).await;
    };

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_pulses,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Wait out the pulse interval, returning early if a stop arrives.
async fn pause(interval: Duration, stop: &mut watch::Receiver<bool>) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    let sender_gone = tokio::select! {
        () = &mut sleep => false,
        changed = stop.changed() => changed.is_err(),
    };
    // With no sender left, nobody can stop us; keep the pace.
    if sender_gone {
        sleep.await;
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    let wall_ms = result
        .finished_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        reason = ?result.end_reason,
        total_pulses = result.total_pulses,
        final_pulse = result.final_summary.as_ref().map(|s| s.pulse),
        wall_ms,
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            pulse = summary.pulse,
            time = %summary.time,
            agents = summary.agents,
            expeditions = ?summary.expeditions,
            "Final pulse summary"
        );
    } else {
        warn!("Simulation ended with no pulses executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use colony_decision::DecisionEngine;
    use colony_types::{AgentProfile, Role, Specialty};

    use super::*;
    use crate::config::SettlementConfig;
    use crate::settlement::{AgentSlot, Settlement};

    fn make_state() -> SimulationState {
        let mut config = SimulationConfig::default();
        config.world.worker_threads = 1;
        let engine = DecisionEngine::new(config.decision.clone()).unwrap();
        let mut settlement = Settlement::from_config(&SettlementConfig::named("Alpha"));
        let profile =
            AgentProfile::person("Ada", settlement.profile.id, Specialty::Chef, Role::Resident);
        let scheduler = engine.scheduler_for(&profile);
        settlement.add_agent(AgentSlot::new(profile, scheduler, 1));
        SimulationState::new(&config, vec![settlement]).unwrap()
    }

    struct Counting(u64);

    impl PulseCallback for Counting {
        fn on_pulse(&mut self, _summary: &PulseSummary, _state: &SimulationState) {
            self.0 += 1;
        }
    }

    #[test]
    fn limits_from_config_treat_zero_as_unlimited() {
        let mut config = SimulationConfig::default();
        config.simulation.max_real_time_seconds = 0;
        config.world.pulse_interval_ms = 250;
        let limits = RunLimits::from_config(&config);
        assert_eq!(limits.max_real_time, None);
        assert_eq!(limits.interval, Duration::from_millis(250));
        assert!(!limits.pulse_limit_reached(1_000_000));
    }

    #[tokio::test]
    async fn stops_at_pulse_limit() {
        let mut state = make_state();
        let (_tx, rx) = watch::channel(false);
        let mut callback = Counting(0);
        let result = run_simulation(&mut state, RunLimits::pulses(5), rx, &mut callback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::MaxPulses);
        assert_eq!(result.total_pulses, 5);
        assert_eq!(callback.0, 5);
        assert_eq!(result.final_summary.as_ref().unwrap().pulse, 5);
        assert!(result.finished_at >= result.started_at);
        log_simulation_end(&result);
    }

    #[tokio::test]
    async fn stop_signal_before_start_runs_nothing() {
        let mut state = make_state();
        let (_tx, rx) = watch::channel(true);
        let result = run_simulation(&mut state, RunLimits::pulses(0), rx, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.total_pulses, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn stop_signal_interrupts_the_pause() {
        let mut state = make_state();
        let (tx, rx) = watch::channel(false);
        let limits = RunLimits {
            max_pulses: 0,
            max_real_time: None,
            interval: Duration::from_secs(3600),
        };
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        });
        let result = run_simulation(&mut state, limits, rx, &mut NoOpCallback)
            .await
            .unwrap();
        stopper.await.unwrap();
        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.total_pulses, 1);
    }

    #[tokio::test]
    async fn real_time_limit_ends_unbounded_run() {
        let mut state = make_state();
        let (_tx, rx) = watch::channel(false);
        let limits = RunLimits {
            max_pulses: 0,
            max_real_time: Some(Duration::from_millis(30)),
            interval: Duration::from_millis(5),
        };
        let result = run_simulation(&mut state, limits, rx, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::MaxRealTime);
        assert!(result.total_pulses >= 1);
    }
}
