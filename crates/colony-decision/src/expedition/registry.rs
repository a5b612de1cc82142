//! Per-settlement expedition counters.
//!
//! The registry is the one piece of shared mutable state the decision
//! engine touches. Agents read it while scoring; lifecycle transitions
//! write it. Every write happens under one mutex, and [`try_start`]
//! re-checks the population limit inside that critical section so two
//! agents drawing the same expedition in one pulse cannot both commit past
//! the limit.
//!
//! Every transition also bumps the settlement generation, which marks all
//! agents' candidate sets as outdated.
//!
//! [`try_start`]: ExpeditionRegistry::try_start

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use colony_types::ExpeditionCategory;
use serde::Serialize;
use tracing::debug;

use crate::error::{InstantiationError, RegistryError};

/// Stage of an expedition that has been started but not finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionStage {
    /// Proposed and preparing to leave.
    Embarking,
    /// Away from the settlement.
    Active,
}

impl ExpeditionStage {
    /// Lowercase stage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embarking => "embarking",
            Self::Active => "active",
        }
    }
}

/// Counts for one expedition category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpeditionCounts {
    /// Expeditions away from the settlement.
    pub active: u32,
    /// Expeditions preparing to leave.
    pub embarking: u32,
}

impl ExpeditionCounts {
    /// Active plus embarking.
    pub const fn in_flight(self) -> u32 {
        self.active.saturating_add(self.embarking)
    }
}

/// Expedition counters and generation for one settlement.
#[derive(Debug, Default)]
pub struct ExpeditionRegistry {
    counts: Mutex<BTreeMap<ExpeditionCategory, ExpeditionCounts>>,
    generation: AtomicU64,
}

impl ExpeditionRegistry {
    /// A registry with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ExpeditionCategory, ExpeditionCounts>> {
        // Counters stay consistent even if a holder panicked: every update
        // is a single field write.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current counts for `category`.
    pub fn counts(&self, category: ExpeditionCategory) -> ExpeditionCounts {
        self.lock().get(&category).copied().unwrap_or_default()
    }

    /// Current counts for every category with something recorded.
    pub fn snapshot(&self) -> BTreeMap<ExpeditionCategory, ExpeditionCounts> {
        self.lock().clone()
    }

    /// Overwrite the counts for `category` (state restoration and tests).
    pub fn set_counts(&self, category: ExpeditionCategory, counts: ExpeditionCounts) {
        self.lock().insert(category, counts);
        self.bump_generation();
    }

    /// Start an expedition if fewer than `limit` are in flight.
    ///
    /// The check and the increment happen under one lock.
    ///
    /// # Errors
    ///
    /// Returns [`InstantiationError::ExpeditionQuotaReached`] if the limit
    /// is already met.
    pub fn try_start(
        &self,
        category: ExpeditionCategory,
        limit: u32,
    ) -> Result<ExpeditionCounts, InstantiationError> {
        let updated = {
            let mut counts = self.lock();
            let entry = counts.entry(category).or_default();
            let in_flight = entry.in_flight();
            if in_flight >= limit {
                return Err(InstantiationError::ExpeditionQuotaReached {
                    category,
                    in_flight,
                    limit,
                });
            }
            entry.embarking = entry.embarking.saturating_add(1);
            *entry
        };
        let generation = self.bump_generation();
        debug!(
            %category,
            embarking = updated.embarking,
            active = updated.active,
            generation,
            "expedition started"
        );
        Ok(updated)
    }

    /// Move one expedition from embarking to active.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyStage`] if none is embarking.
    pub fn embark(&self, category: ExpeditionCategory) -> Result<ExpeditionCounts, RegistryError> {
        self.transition(category, |entry| {
            if entry.embarking == 0 {
                return Err(ExpeditionStage::Embarking);
            }
            entry.embarking = entry.embarking.saturating_sub(1);
            entry.active = entry.active.saturating_add(1);
            Ok(())
        })
    }

    /// Finish one active expedition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyStage`] if none is active.
    pub fn complete(
        &self,
        category: ExpeditionCategory,
    ) -> Result<ExpeditionCounts, RegistryError> {
        self.transition(category, |entry| {
            if entry.active == 0 {
                return Err(ExpeditionStage::Active);
            }
            entry.active = entry.active.saturating_sub(1);
            Ok(())
        })
    }

    /// Abandon one expedition in `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyStage`] if that stage is empty.
    pub fn abort(
        &self,
        category: ExpeditionCategory,
        stage: ExpeditionStage,
    ) -> Result<ExpeditionCounts, RegistryError> {
        self.transition(category, |entry| {
            let slot = match stage {
                ExpeditionStage::Embarking => &mut entry.embarking,
                ExpeditionStage::Active => &mut entry.active,
            };
            if *slot == 0 {
                return Err(stage);
            }
            *slot = (*slot).saturating_sub(1);
            Ok(())
        })
    }

    fn transition<F>(
        &self,
        category: ExpeditionCategory,
        apply: F,
    ) -> Result<ExpeditionCounts, RegistryError>
    where
        F: FnOnce(&mut ExpeditionCounts) -> Result<(), ExpeditionStage>,
    {
        let updated = {
            let mut counts = self.lock();
            let entry = counts.entry(category).or_default();
            apply(entry).map_err(|stage| RegistryError::EmptyStage {
                category,
                stage: stage.as_str(),
            })?;
            *entry
        };
        self.bump_generation();
        Ok(updated)
    }

    /// The settlement generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance the settlement generation and return the new value.
    ///
    /// Called on every lifecycle transition, and by the settlement for any
    /// other event that should make agents re-evaluate.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }
}
