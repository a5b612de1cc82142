//! Mars clock, settlements, and the pulse cycle for the colony simulation.
//!
//! This crate owns the world around the decision engine: simulated time,
//! settlement state, colonist vitals, expedition execution, and the loop
//! that asks every agent's scheduler what to do once per pulse.
//!
//! # Modules
//!
//! - [`clock`] -- Mars clock emitting pulses, with sol and day phase
//!   derivation.
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`settlement`] -- Settlements, agent slots, vitals, activity effects
//!   and the expedition lifecycle.
//! - [`pulse`] -- The per-pulse phase loop and its summary.
//! - [`runner`] -- Bounded, paced, stoppable simulation runs.

pub mod clock;
pub mod config;
pub mod pulse;
pub mod runner;
pub mod settlement;
