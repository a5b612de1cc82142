//! Simulated time.
//!
//! Time on the surface is counted in millisols (thousandths of a Martian
//! sol) since landing. Both instants and durations are `f64` millisols;
//! the clock only ever moves forward, so negative durations appear only
//! when a caller subtracts a later instant from an earlier one.

use serde::{Deserialize, Serialize};

use crate::enums::DayPhase;

/// Millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// An instant of simulated time, in millisols since landing.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    /// The landing instant.
    pub const ZERO: Self = Self(0.0);

    /// Create an instant from millisols since landing.
    pub const fn from_millisols(millisols: f64) -> Self {
        Self(millisols)
    }

    /// Millisols since landing.
    pub const fn millisols(self) -> f64 {
        self.0
    }

    /// The sol number (0-based) this instant falls in.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sol(self) -> u64 {
        // Floor of a non-negative value; the clock never goes below zero.
        (self.0.max(0.0) / MILLISOLS_PER_SOL).floor() as u64
    }

    /// Millisol within the current sol, in `[0, 1000)`.
    pub fn millisol_of_sol(self) -> f64 {
        self.0.rem_euclid(MILLISOLS_PER_SOL)
    }

    /// Phase of the day at this instant.
    pub fn day_phase(self) -> DayPhase {
        DayPhase::from_millisol(self.millisol_of_sol())
    }

    /// The instant `duration` after this one.
    #[must_use]
    pub const fn advanced_by(self, duration: SimDuration) -> Self {
        Self(self.0 + duration.0)
    }

    /// Time elapsed since `earlier`; negative if `earlier` is later.
    pub const fn since(self, earlier: Self) -> SimDuration {
        SimDuration(self.0 - earlier.0)
    }
}

impl core::fmt::Display for SimTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sol {} @ {:.1}", self.sol(), self.millisol_of_sol())
    }
}

/// A span of simulated time, in millisols.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimDuration(f64);

impl SimDuration {
    /// No time at all.
    pub const ZERO: Self = Self(0.0);

    /// Create a duration from millisols.
    pub const fn from_millisols(millisols: f64) -> Self {
        Self(millisols)
    }

    /// Length in millisols.
    pub const fn millisols(self) -> f64 {
        self.0
    }

    /// Whether no time remains.
    pub fn is_elapsed(self) -> bool {
        self.0 <= 0.0
    }

    /// The shorter of two durations.
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Subtract, stopping at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self((self.0 - other.0).max(0.0))
    }
}

/// One discrete advance of the simulation clock.
///
/// Every agent's scheduler receives the same pulse value. `now` is the
/// instant at the end of the advance and `elapsed` is how much simulated
/// time the advance covered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    /// Pulse counter, starting at 1 for the first advance.
    pub number: u64,
    /// Simulated instant after this pulse.
    pub now: SimTime,
    /// Simulated time covered by this pulse.
    pub elapsed: SimDuration,
}

impl Pulse {
    /// Build a pulse value.
    pub const fn new(number: u64, now: SimTime, elapsed: SimDuration) -> Self {
        Self {
            number,
            now,
            elapsed,
        }
    }

    /// Phase of the day at the end of this pulse.
    pub fn day_phase(&self) -> DayPhase {
        self.now.day_phase()
    }
}
