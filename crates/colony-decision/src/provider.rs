//! Candidate providers and the per-kind provider tables.
//!
//! Providers are registered once at startup. The registry splits them into
//! one table per [`AgentKind`] by calling
//! [`applicable_to`](CandidateProvider::applicable_to) during the build, so
//! schedulers never filter providers per pulse.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use colony_types::AgentKind;
use tracing::info;

use crate::activity::ActivityKind;
use crate::candidate::{Candidate, DecisionContext};
use crate::config::{ConfigError, DecisionConfig};
use crate::expedition::{ExpeditionPlanner, ExpeditionProvider};
use crate::providers;
use crate::score::Score;

/// One scored candidate as returned by a provider.
pub type Proposal = (Box<dyn Candidate>, Score);

/// A source of scored candidates.
///
/// Implementations read the context and never mutate it. They start from
/// [`Score::ZERO`] or a named base and clamp to the engine-wide range last.
pub trait CandidateProvider: fmt::Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether agents of `kind` ever get candidates from this provider.
    ///
    /// Checked once, when the registry is built.
    fn applicable_to(&self, kind: AgentKind) -> bool;

    /// Scored candidates for the context's agent. ZERO scores may be
    /// included or omitted; the candidate set drops them either way.
    fn propose(&self, ctx: &DecisionContext<'_>) -> Vec<Proposal>;
}

/// The providers that apply to one agent kind.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    general: Vec<Arc<dyn CandidateProvider>>,
    survival: Arc<dyn CandidateProvider>,
    fallback: ActivityKind,
}

impl ProviderTable {
    /// Providers for the normal fan-out.
    pub fn general(&self) -> &[Arc<dyn CandidateProvider>] {
        &self.general
    }

    /// The reserved provider used by the urgent override.
    pub fn survival(&self) -> &dyn CandidateProvider {
        self.survival.as_ref()
    }

    /// Activity used when no candidate has a positive score.
    pub const fn fallback(&self) -> ActivityKind {
        self.fallback
    }
}

/// Immutable provider tables for every agent kind.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    tables: BTreeMap<AgentKind, ProviderTable>,
}

impl ProviderRegistry {
    /// Start an empty registry.
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// The built-in providers for colonists and robots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn standard(config: &DecisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limit = config.activity_upper_limit;

        let eat: Arc<dyn CandidateProvider> = Arc::new(providers::EatMealProvider::new(limit));
        let recharge: Arc<dyn CandidateProvider> =
            Arc::new(providers::RechargeProvider::new(limit));

        Self::builder()
            .register(providers::SleepProvider::new(limit))
            .register_shared(Arc::clone(&eat))
            .register(providers::RelaxProvider::new(limit))
            .register(providers::WorkoutProvider::new(limit))
            .register(providers::StudyProvider::new(limit))
            .register(providers::ConverseProvider::new(limit))
            .register(providers::MaintenanceProvider::new(limit))
            .register(providers::GreenhouseProvider::new(limit))
            .register(providers::CookProvider::new(limit))
            .register_shared(Arc::clone(&recharge))
            .register(ExpeditionProvider::new(ExpeditionPlanner::new(
                config.expeditions.clone(),
            )))
            .survival(AgentKind::Person, eat)
            .survival(AgentKind::Robot, recharge)
            .fallback(AgentKind::Person, ActivityKind::Idle)
            .fallback(AgentKind::Robot, ActivityKind::Recharge)
            .build()
    }

    /// The table for `kind`.
    pub fn table(&self, kind: AgentKind) -> Option<&ProviderTable> {
        self.tables.get(&kind)
    }
}

/// Collects providers before the per-kind tables are computed.
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<Arc<dyn CandidateProvider>>,
    survival: BTreeMap<AgentKind, Arc<dyn CandidateProvider>>,
    fallback: BTreeMap<AgentKind, ActivityKind>,
}

impl ProviderRegistryBuilder {
    /// Add a provider to the general fan-out.
    #[must_use]
    pub fn register<P: CandidateProvider + 'static>(self, provider: P) -> Self {
        self.register_shared(Arc::new(provider))
    }

    /// Add an already shared provider to the general fan-out.
    #[must_use]
    pub fn register_shared(mut self, provider: Arc<dyn CandidateProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the reserved survival provider for `kind`.
    #[must_use]
    pub fn survival(mut self, kind: AgentKind, provider: Arc<dyn CandidateProvider>) -> Self {
        self.survival.insert(kind, provider);
        self
    }

    /// Set the fallback activity for `kind`.
    #[must_use]
    pub fn fallback(mut self, kind: AgentKind, activity: ActivityKind) -> Self {
        self.fallback.insert(kind, activity);
        self
    }

    /// Compute the per-kind tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any agent kind lacks a survival
    /// provider or a fallback, or its survival provider does not apply to
    /// that kind.
    pub fn build(mut self) -> Result<ProviderRegistry, ConfigError> {
        let mut tables = BTreeMap::new();
        for kind in AgentKind::ALL {
            let field = format!("providers.{kind:?}").to_lowercase();
            let survival = self.survival.remove(&kind).ok_or_else(|| {
                ConfigError::invalid(format!("{field}.survival"), "no survival provider")
            })?;
            if !survival.applicable_to(kind) {
                return Err(ConfigError::invalid(
                    format!("{field}.survival"),
                    format!("provider `{}` does not apply", survival.name()),
                ));
            }
            let fallback = self.fallback.remove(&kind).ok_or_else(|| {
                ConfigError::invalid(format!("{field}.fallback"), "no fallback activity")
            })?;
            let general: Vec<_> = self
                .providers
                .iter()
                .filter(|p| p.applicable_to(kind))
                .cloned()
                .collect();
            info!(
                kind = ?kind,
                providers = general.len(),
                survival = survival.name(),
                fallback = %fallback,
                "provider table built"
            );
            tables.insert(
                kind,
                ProviderTable {
                    general,
                    survival,
                    fallback,
                },
            );
        }
        Ok(ProviderRegistry { tables })
    }
}
