//! Built-in candidate providers.
//!
//! - [`needs`] -- sleep, meals, leisure, exercise and robot recharging.
//! - [`work`] -- settlement chores and research.
//! - [`social`] -- conversation.
//!
//! Each provider scores one activity kind. They share the same shape:
//! return [`Score::ZERO`] as soon as the agent cannot do the activity,
//! otherwise start from a named base, apply modifiers, and clamp to the
//! engine-wide upper limit.

pub mod needs;
pub mod social;
pub mod work;

pub use needs::{EatMealProvider, RechargeProvider, RelaxProvider, SleepProvider, WorkoutProvider};
pub use social::ConverseProvider;
pub use work::{CookProvider, GreenhouseProvider, MaintenanceProvider, StudyProvider};

use crate::activity::ActivityKind;
use crate::candidate::{ActivityCandidate, Candidate};
use crate::provider::Proposal;
use crate::score::Score;

/// Clamp a finished score and wrap it as a single proposal.
///
/// Collapsed scores produce no proposal at all.
fn single(kind: ActivityKind, mut score: Score, upper_limit: f64) -> Vec<Proposal> {
    if score.is_zero() {
        return Vec::new();
    }
    score.apply_range(0.0, upper_limit);
    let candidate: Box<dyn Candidate> = Box::new(ActivityCandidate::new(kind));
    vec![(candidate, score)]
}
