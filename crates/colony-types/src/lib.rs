//! Shared type definitions for the colony decision simulation.
//!
//! This crate holds the data every other crate agrees on: identifiers,
//! enumerations, simulated time, and the read-only state snapshots that the
//! decision engine consumes from its collaborators.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, settlements, expeditions
//! - [`enums`] -- Agent kinds, specialties, roles, whereabouts, expedition categories
//! - [`time`] -- Simulated time in millisols and the [`Pulse`] emitted by the clock
//! - [`profile`] -- [`AgentProfile`] and [`SettlementProfile`] snapshots

pub mod enums;
pub mod ids;
pub mod profile;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, DayPhase, ExpeditionCategory, RobotType, Role, Specialty, Whereabouts};
pub use ids::{AgentId, ExpeditionId, SettlementId};
pub use profile::{AgentProfile, Personality, SettlementProfile};
pub use time::{MILLISOLS_PER_SOL, Pulse, SimDuration, SimTime};
