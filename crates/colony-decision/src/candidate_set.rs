//! Time-stamped collections of scored candidates.
//!
//! A [`CandidateSet`] is what one agent could do at one point in time. The
//! scheduler rebuilds it wholesale when it goes stale and swaps the new set
//! in as a whole; sets are never patched in place.
//!
//! # Staleness
//!
//! A set is stale once its age reaches the cache TTL, or when the
//! settlement generation it was built against has moved on. The second rule
//! lets settlement-wide events (an expedition slot opening up) reach every
//! agent promptly without rebuilding every set on every pulse.
//!
//! # Selection
//!
//! [`CandidateSet::draw`] is a roulette-wheel draw over entries with a
//! positive score. Equal weights are separated only by the random draw, so
//! low-scored candidates are picked in proportion over long runs.

use colony_types::{SimDuration, SimTime};
use rand::Rng;
use tracing::trace;

use crate::candidate::{Candidate, CandidateId};
use crate::score::Score;

/// Which provider fan-out produced a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// Every provider applicable to the agent's kind.
    General,
    /// Only the reserved survival provider (urgent override).
    Survival,
}

/// One scored candidate.
#[derive(Debug)]
pub struct CandidateEntry {
    candidate: Box<dyn Candidate>,
    score: Score,
}

impl CandidateEntry {
    /// The candidate.
    pub fn candidate(&self) -> &dyn Candidate {
        self.candidate.as_ref()
    }

    /// The candidate's key.
    pub fn id(&self) -> CandidateId {
        self.candidate.id()
    }

    /// The candidate's score.
    pub const fn score(&self) -> &Score {
        &self.score
    }

    /// Draw weight: the final score, or zero if it is not positive.
    fn weight(&self) -> f64 {
        self.score.score().max(0.0)
    }
}

/// Scored candidates for one agent, built at one instant.
#[derive(Debug)]
pub struct CandidateSet {
    label: String,
    created_at: SimTime,
    generation: u64,
    scope: CacheScope,
    entries: Vec<CandidateEntry>,
}

impl CandidateSet {
    /// An empty set labelled `label`, built at `as_of`.
    pub fn new(label: impl Into<String>, as_of: SimTime) -> Self {
        Self {
            label: label.into(),
            created_at: as_of,
            generation: 0,
            scope: CacheScope::General,
            entries: Vec::new(),
        }
    }

    /// Record the settlement generation this set was built against.
    #[must_use]
    pub const fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Record which provider fan-out built this set.
    #[must_use]
    pub const fn with_scope(mut self, scope: CacheScope) -> Self {
        self.scope = scope;
        self
    }

    /// Insert a scored candidate.
    ///
    /// [`Score::ZERO`] candidates are dropped silently. If a candidate with
    /// the same key is already present, the higher-scored one is kept.
    /// Returns whether the set changed.
    pub fn add(&mut self, candidate: Box<dyn Candidate>, score: Score) -> bool {
        if score.is_zero() {
            return false;
        }
        let id = candidate.id();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id() == id) {
            if score.score() > existing.score.score() {
                trace!(set = %self.label, candidate = %id, "replacing lower-scored duplicate");
                existing.candidate = candidate;
                existing.score = score;
                return true;
            }
            return false;
        }
        self.entries.push(CandidateEntry { candidate, score });
        true
    }

    /// Insert many scored candidates with the same rules as [`add`](Self::add).
    pub fn add_batch<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = (Box<dyn Candidate>, Score)>,
    {
        for (candidate, score) in batch {
            self.add(candidate, score);
        }
    }

    /// Whether the set has reached the end of its time-to-live.
    pub fn is_stale(&self, now: SimTime, ttl: SimDuration) -> bool {
        now.since(self.created_at) >= ttl
    }

    /// Whether the set was built against a different settlement generation.
    pub const fn is_outdated(&self, generation: u64) -> bool {
        self.generation != generation
    }

    /// Pick a candidate at random, weighted by score.
    ///
    /// Returns `None` if no entry has a positive score.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CandidateId> {
        self.draw_entry(rng).map(CandidateEntry::id)
    }

    /// Like [`draw`](Self::draw) but returns the whole entry.
    pub fn draw_entry<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&CandidateEntry> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        let mut roll = rng.random::<f64>() * total;
        let mut last_positive = None;
        for entry in &self.entries {
            let weight = entry.weight();
            if weight <= 0.0 {
                continue;
            }
            if roll < weight {
                return Some(entry);
            }
            roll -= weight;
            last_positive = Some(entry);
        }
        // Rounding can leave `roll` a hair above the final weight.
        last_positive
    }

    /// Look up an entry by key.
    pub fn get(&self, id: &CandidateId) -> Option<&CandidateEntry> {
        self.entries.iter().find(|e| &e.id() == id)
    }

    /// The highest-scored entry, for diagnostics.
    pub fn best(&self) -> Option<&CandidateEntry> {
        self.entries
            .iter()
            .filter(|e| e.weight() > 0.0)
            .max_by(|a, b| a.weight().total_cmp(&b.weight()))
    }

    /// Sum of all positive scores.
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(CandidateEntry::weight).sum()
    }

    /// Whether the set holds no entries at all.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, including ones with non-positive scores.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateEntry> {
        self.entries.iter()
    }

    /// The set's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// When the set was built.
    pub const fn created_at(&self) -> SimTime {
        self.created_at
    }

    /// The settlement generation the set was built against.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Which provider fan-out built the set.
    pub const fn scope(&self) -> CacheScope {
        self.scope
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::activity::ActivityKind;
    use crate::candidate::ActivityCandidate;

    fn make_candidate(kind: ActivityKind) -> Box<dyn Candidate> {
        Box::new(ActivityCandidate::new(kind))
    }

    fn scored(value: f64) -> Score {
        Score::new("base", value)
    }

    #[test]
    fn zero_scores_are_dropped() {
        let mut set = CandidateSet::new("test", SimTime::ZERO);
        assert!(!set.add(make_candidate(ActivityKind::Sleep), Score::ZERO));
        assert!(set.add(make_candidate(ActivityKind::Relax), scored(3.0)));
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn non_positive_entries_are_kept_but_never_drawn() {
        let mut set = CandidateSet::new("test", SimTime::ZERO);
        let mut negative = scored(2.0);
        negative.add_base("penalty", -5.0);
        set.add(make_candidate(ActivityKind::Converse), negative);
        set.add(make_candidate(ActivityKind::Study), scored(1.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_weight(), 1.0);

        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(set.draw(&mut rng).unwrap().as_str(), "study");
        }
    }

    #[test]
    fn draw_on_set_without_positive_weight_is_none() {
        let set = CandidateSet::new("empty", SimTime::ZERO);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(set.is_empty());
        assert!(set.draw(&mut rng).is_none());
    }

    #[test]
    fn duplicate_keys_keep_the_higher_score() {
        let mut set = CandidateSet::new("dups", SimTime::ZERO);
        set.add(make_candidate(ActivityKind::Cook), scored(5.0));
        assert!(!set.add(make_candidate(ActivityKind::Cook), scored(2.0)));
        assert!(set.add(make_candidate(ActivityKind::Cook), scored(9.0)));
        assert_eq!(set.len(), 1);
        let entry = set.get(&ActivityKind::Cook.candidate_id()).unwrap();
        assert_eq!(entry.score().score(), 9.0);
    }

    #[test]
    fn staleness_follows_ttl() {
        let set = CandidateSet::new("ttl", SimTime::ZERO);
        let ttl = SimDuration::from_millisols(1.0);
        assert!(!set.is_stale(SimTime::from_millisols(0.5), ttl));
        assert!(set.is_stale(SimTime::from_millisols(1.0), ttl));
        assert!(set.is_stale(SimTime::from_millisols(1.5), ttl));
    }

    #[test]
    fn generation_mismatch_marks_set_outdated() {
        let set = CandidateSet::new("gen", SimTime::ZERO).with_generation(4);
        assert!(!set.is_outdated(4));
        assert!(set.is_outdated(5));
    }

    #[test]
    fn add_batch_applies_drop_rule() {
        let mut set = CandidateSet::new("batch", SimTime::ZERO);
        set.add_batch(vec![
            (make_candidate(ActivityKind::Sleep), scored(1.0)),
            (make_candidate(ActivityKind::Relax), Score::ZERO),
            (make_candidate(ActivityKind::Workout), scored(2.0)),
        ]);
        let keys: Vec<String> = set.iter().map(|e| e.id().to_string()).collect();
        assert_eq!(keys, vec!["sleep", "workout"]);
        assert_eq!(set.best().unwrap().id().as_str(), "workout");
    }
}
