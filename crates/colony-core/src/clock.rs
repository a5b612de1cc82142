//! Mars clock emitting simulation pulses.
//!
//! The clock is the single source of truth for simulated time. Each call
//! to [`MarsClock::advance`] moves time forward by one fixed pulse length
//! and returns the [`Pulse`] every agent processes. Sol number and day
//! phase are derived from the current time, never stored.

use colony_types::{DayPhase, Pulse, SimDuration, SimTime};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Pulse counter would overflow.
    #[error("pulse counter overflow: cannot advance beyond u64::MAX")]
    PulseOverflow,

    /// Invalid clock configuration (e.g. a zero pulse length).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Simulation clock counting pulses and millisols.
#[derive(Debug, Clone, PartialEq)]
pub struct MarsClock {
    /// Number of the last pulse emitted (0 before the first).
    pulse: u64,

    /// Current simulated time.
    now: SimTime,

    /// Simulated time covered by one pulse.
    pulse_length: SimDuration,
}

impl MarsClock {
    /// Create a clock at pulse 0 and time `start`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `pulse_millisols` is not a
    /// positive finite number or `start` is negative.
    pub fn new(pulse_millisols: f64, start: SimTime) -> Result<Self, ClockError> {
        Self::from_parts(0, start, pulse_millisols)
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] on a bad pulse length or a
    /// negative time.
    pub fn from_parts(pulse: u64, now: SimTime, pulse_millisols: f64) -> Result<Self, ClockError> {
        if !pulse_millisols.is_finite() || pulse_millisols <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("pulse length must be positive, got {pulse_millisols}"),
            });
        }
        if !now.millisols().is_finite() || now.millisols() < 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("start time must not be negative, got {}", now.millisols()),
            });
        }
        Ok(Self {
            pulse,
            now,
            pulse_length: SimDuration::from_millisols(pulse_millisols),
        })
    }

    /// Advance by one pulse and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::PulseOverflow`] if the pulse counter would
    /// exceed `u64::MAX`.
    pub fn advance(&mut self) -> Result<Pulse, ClockError> {
        self.pulse = self.pulse.checked_add(1).ok_or(ClockError::PulseOverflow)?;
        self.now = self.now.advanced_by(self.pulse_length);
        Ok(Pulse::new(self.pulse, self.now, self.pulse_length))
    }

    /// Number of the last pulse emitted.
    pub const fn pulse(&self) -> u64 {
        self.pulse
    }

    /// Current simulated time.
    pub const fn now(&self) -> SimTime {
        self.now
    }

    /// Simulated time covered by one pulse.
    pub const fn pulse_length(&self) -> SimDuration {
        self.pulse_length
    }

    /// Current sol (0-indexed).
    pub fn sol(&self) -> u64 {
        self.now.sol()
    }

    /// Current phase of the day.
    pub fn day_phase(&self) -> DayPhase {
        self.now.day_phase()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn new_clock_starts_at_pulse_zero() {
        let clock = MarsClock::new(10.0, SimTime::from_millisols(300.0)).unwrap();
        assert_eq!(clock.pulse(), 0);
        assert_eq!(clock.now().millisols(), 300.0);
        assert_eq!(clock.day_phase(), DayPhase::Day);
    }

    #[test]
    fn advance_moves_time_by_pulse_length() {
        let mut clock = MarsClock::new(10.0, SimTime::ZERO).unwrap();
        let first = clock.advance().unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.now.millisols(), 10.0);
        assert_eq!(first.elapsed.millisols(), 10.0);
        let second = clock.advance().unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.now.millisols(), 20.0);
    }

    #[test]
    fn sol_rolls_over() {
        let mut clock = MarsClock::new(250.0, SimTime::ZERO).unwrap();
        for _ in 0..4 {
            clock.advance().unwrap();
        }
        assert_eq!(clock.sol(), 1);
        assert_eq!(clock.day_phase(), DayPhase::Night);
    }

    #[test]
    fn rejects_bad_pulse_length() {
        assert!(MarsClock::new(0.0, SimTime::ZERO).is_err());
        assert!(MarsClock::new(-5.0, SimTime::ZERO).is_err());
        assert!(MarsClock::new(f64::NAN, SimTime::ZERO).is_err());
        assert!(MarsClock::new(5.0, SimTime::from_millisols(-1.0)).is_err());
    }

    #[test]
    fn advance_detects_overflow() {
        let mut clock = MarsClock::from_parts(u64::MAX, SimTime::ZERO, 10.0).unwrap();
        assert!(matches!(clock.advance(), Err(ClockError::PulseOverflow)));
    }
}
