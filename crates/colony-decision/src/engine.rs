//! Entry point tying configuration, providers and schedulers together.

use std::sync::Arc;

use colony_types::AgentProfile;
use tracing::info;

use crate::config::{ConfigError, DecisionConfig};
use crate::expedition::ExpeditionPlanner;
use crate::provider::ProviderRegistry;
use crate::scheduler::{AgentScheduler, SchedulerSettings};

/// Validated configuration plus the shared provider tables.
///
/// Built once at startup. Cloning is cheap; every clone shares the same
/// provider tables.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    providers: Arc<ProviderRegistry>,
    settings: SchedulerSettings,
}

impl DecisionEngine {
    /// Validate `config` and build the standard provider tables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any constant is invalid.
    pub fn new(config: DecisionConfig) -> Result<Self, ConfigError> {
        let providers = ProviderRegistry::standard(&config)?;
        Ok(Self::assemble(config, providers))
    }

    /// Validate `config` and use a custom provider registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any constant is invalid.
    pub fn with_providers(
        config: DecisionConfig,
        providers: ProviderRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, providers))
    }

    fn assemble(config: DecisionConfig, providers: ProviderRegistry) -> Self {
        let settings = SchedulerSettings::from(&config);
        info!(
            cache_ttl = config.cache_ttl_millisols,
            critical_energy = config.critical_energy,
            switch_margin = config.switch_margin,
            expedition_categories = config.expeditions.categories.len(),
            "decision engine ready"
        );
        Self {
            config,
            providers: Arc::new(providers),
            settings,
        }
    }

    /// A fresh scheduler for `agent`.
    pub fn scheduler_for(&self, agent: &AgentProfile) -> AgentScheduler {
        AgentScheduler::new(agent.id, agent.kind, Arc::clone(&self.providers), self.settings)
    }

    /// An expedition planner using the engine's constants.
    pub fn planner(&self) -> ExpeditionPlanner {
        ExpeditionPlanner::new(self.config.expeditions.clone())
    }

    /// The validated configuration.
    pub const fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// The shared provider tables.
    pub const fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_types::{AgentKind, RobotType, SettlementId};

    use super::*;

    #[test]
    fn schedulers_share_provider_tables() {
        let engine = DecisionEngine::new(DecisionConfig::default()).unwrap();
        let robot = AgentProfile::robot("R1", SettlementId::new(), RobotType::GardenBot);
        let scheduler = engine.scheduler_for(&robot);
        assert_eq!(scheduler.agent(), robot.id);
        assert!(scheduler.current().is_none());
        assert!(engine.providers().table(AgentKind::Robot).is_some());
        assert!(Arc::strong_count(engine.providers()) >= 2);
    }

    #[test]
    fn invalid_config_prevents_startup() {
        let config = DecisionConfig {
            switch_margin: 0.5,
            ..DecisionConfig::default()
        };
        let err = DecisionEngine::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "switch_margin"));
    }
}
