//! Scoring and scheduling constants.
//!
//! [`DecisionConfig`] mirrors the `decision` section of the simulation's
//! YAML configuration. Every field has a default; [`DecisionConfig::validate`]
//! rejects malformed values so the engine never starts with them.

use std::collections::BTreeMap;

use colony_types::{ExpeditionCategory, Role, SimDuration, Specialty};
use serde::Deserialize;

/// Errors in the decision configuration. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A constant is missing, out of range, or inconsistent.
    #[error("invalid decision config `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level decision engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionConfig {
    /// Time-to-live of a candidate set before it is rebuilt (millisols).
    #[serde(default = "default_cache_ttl_millisols")]
    pub cache_ttl_millisols: f64,

    /// Energy below which the urgent survival override kicks in.
    #[serde(default = "default_critical_energy")]
    pub critical_energy: f64,

    /// Upper clamp for every activity score.
    #[serde(default = "default_activity_upper_limit")]
    pub activity_upper_limit: f64,

    /// How much better a freshly drawn candidate must score before it
    /// replaces a valid running activity.
    #[serde(default = "default_switch_margin")]
    pub switch_margin: f64,

    /// Expedition scoring constants.
    #[serde(default)]
    pub expeditions: ExpeditionConfig,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            cache_ttl_millisols: default_cache_ttl_millisols(),
            critical_energy: default_critical_energy(),
            activity_upper_limit: default_activity_upper_limit(),
            switch_margin: default_switch_margin(),
            expeditions: ExpeditionConfig::default(),
        }
    }
}

impl DecisionConfig {
    /// Cache time-to-live as a duration.
    pub const fn cache_ttl(&self) -> SimDuration {
        SimDuration::from_millisols(self.cache_ttl_millisols)
    }

    /// Check every constant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("cache_ttl_millisols", self.cache_ttl_millisols)?;
        require_finite("critical_energy", self.critical_energy)?;
        if !(0.0..100.0).contains(&self.critical_energy) {
            return Err(ConfigError::invalid(
                "critical_energy",
                format!("must be in [0, 100), got {}", self.critical_energy),
            ));
        }
        require_positive("activity_upper_limit", self.activity_upper_limit)?;
        require_finite("switch_margin", self.switch_margin)?;
        if self.switch_margin < 1.0 {
            return Err(ConfigError::invalid(
                "switch_margin",
                format!("must be at least 1, got {}", self.switch_margin),
            ));
        }
        self.expeditions.validate()
    }
}

/// Expedition scoring constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpeditionConfig {
    /// Upper clamp for every expedition score.
    #[serde(default = "default_expedition_upper_limit")]
    pub upper_limit: f64,

    /// Suitability multiplier when the agent's role is preferred.
    #[serde(default = "default_role_bonus")]
    pub role_bonus: f64,

    /// Suitability multiplier when the agent's role is not preferred.
    #[serde(default = "default_role_penalty")]
    pub role_penalty: f64,

    /// Base pool reduction per colonist indoors beyond capacity.
    #[serde(default = "default_crowding_penalty_per_agent")]
    pub crowding_penalty_per_agent: f64,

    /// Largest personality adjustment, reached at extroversion 0 or 100.
    #[serde(default = "default_extroversion_span")]
    pub extroversion_span: f64,

    /// Per-category constants.
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<ExpeditionCategory, CategoryConfig>,
}

impl Default for ExpeditionConfig {
    fn default() -> Self {
        Self {
            upper_limit: default_expedition_upper_limit(),
            role_bonus: default_role_bonus(),
            role_penalty: default_role_penalty(),
            crowding_penalty_per_agent: default_crowding_penalty_per_agent(),
            extroversion_span: default_extroversion_span(),
            categories: default_categories(),
        }
    }
}

impl ExpeditionConfig {
    /// Constants for `category`, if it is configured.
    pub fn category(&self, category: ExpeditionCategory) -> Option<&CategoryConfig> {
        self.categories.get(&category)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("expeditions.upper_limit", self.upper_limit)?;
        require_positive("expeditions.role_penalty", self.role_penalty)?;
        require_finite("expeditions.role_bonus", self.role_bonus)?;
        if self.role_bonus < 1.0 || self.role_penalty > 1.0 {
            return Err(ConfigError::invalid(
                "expeditions.role_bonus",
                format!(
                    "need role_bonus >= 1 >= role_penalty, got {} and {}",
                    self.role_bonus, self.role_penalty
                ),
            ));
        }
        require_finite(
            "expeditions.crowding_penalty_per_agent",
            self.crowding_penalty_per_agent,
        )?;
        if self.crowding_penalty_per_agent < 0.0 {
            return Err(ConfigError::invalid(
                "expeditions.crowding_penalty_per_agent",
                "must not be negative",
            ));
        }
        require_finite("expeditions.extroversion_span", self.extroversion_span)?;
        if !(0.0..1.0).contains(&self.extroversion_span) {
            return Err(ConfigError::invalid(
                "expeditions.extroversion_span",
                format!("must be in [0, 1), got {}", self.extroversion_span),
            ));
        }
        for (category, cfg) in &self.categories {
            cfg.validate(*category)?;
        }
        Ok(())
    }
}

/// Constants for one expedition category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryConfig {
    /// Whether agents may propose this category at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Named base value of the fitness score.
    pub base_score: f64,

    /// Colonists needed per concurrent expedition of this category.
    pub capacity_per_expedition: u32,

    /// Roles that get the leadership bonus. Empty means no role adjustment.
    #[serde(default)]
    pub preferred_roles: Vec<Role>,

    /// Specialties allowed to propose. Empty means any colonist.
    #[serde(default)]
    pub qualifying_specialties: Vec<Specialty>,
}

impl CategoryConfig {
    /// Whether a colonist with `specialty` may propose this category.
    pub fn qualifies(&self, specialty: Option<Specialty>) -> bool {
        self.qualifying_specialties.is_empty()
            || specialty.is_some_and(|s| self.qualifying_specialties.contains(&s))
    }

    fn validate(&self, category: ExpeditionCategory) -> Result<(), ConfigError> {
        require_positive(
            &format!("expeditions.categories.{category}.base_score"),
            self.base_score,
        )?;
        if self.capacity_per_expedition == 0 {
            return Err(ConfigError::invalid(
                format!("expeditions.categories.{category}.capacity_per_expedition"),
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

const fn default_cache_ttl_millisols() -> f64 {
    10.0
}

const fn default_critical_energy() -> f64 {
    15.0
}

const fn default_activity_upper_limit() -> f64 {
    1000.0
}

const fn default_switch_margin() -> f64 {
    1.5
}

const fn default_expedition_upper_limit() -> f64 {
    500.0
}

const fn default_role_bonus() -> f64 {
    1.5
}

const fn default_role_penalty() -> f64 {
    0.5
}

const fn default_crowding_penalty_per_agent() -> f64 {
    2.0
}

const fn default_extroversion_span() -> f64 {
    0.25
}

const fn default_true() -> bool {
    true
}

fn default_categories() -> BTreeMap<ExpeditionCategory, CategoryConfig> {
    let mut categories = BTreeMap::new();
    categories.insert(
        ExpeditionCategory::Exploration,
        CategoryConfig {
            enabled: true,
            base_score: 50.0,
            capacity_per_expedition: 8,
            preferred_roles: vec![
                Role::Commander,
                Role::SubCommander,
                Role::ChiefOfLogistics,
                Role::MissionSpecialist,
            ],
            qualifying_specialties: vec![
                Specialty::Geologist,
                Specialty::Pilot,
                Specialty::Engineer,
            ],
        },
    );
    categories.insert(
        ExpeditionCategory::Mining,
        CategoryConfig {
            enabled: true,
            base_score: 40.0,
            capacity_per_expedition: 10,
            preferred_roles: vec![Role::ChiefOfEngineering, Role::ChiefOfLogistics],
            qualifying_specialties: vec![
                Specialty::Geologist,
                Specialty::Engineer,
                Specialty::Pilot,
            ],
        },
    );
    categories.insert(
        ExpeditionCategory::Trade,
        CategoryConfig {
            enabled: true,
            base_score: 30.0,
            capacity_per_expedition: 12,
            preferred_roles: vec![Role::Commander, Role::ChiefOfSupply],
            qualifying_specialties: vec![Specialty::Trader, Specialty::Pilot],
        },
    );
    categories.insert(
        ExpeditionCategory::FieldStudy,
        CategoryConfig {
            enabled: true,
            base_score: 35.0,
            capacity_per_expedition: 10,
            preferred_roles: vec![Role::ChiefOfScience, Role::MissionSpecialist],
            qualifying_specialties: vec![
                Specialty::Geologist,
                Specialty::Biologist,
                Specialty::Scientist,
            ],
        },
    );
    categories.insert(
        ExpeditionCategory::Delivery,
        CategoryConfig {
            enabled: true,
            base_score: 25.0,
            capacity_per_expedition: 16,
            preferred_roles: vec![Role::ChiefOfSupply, Role::ChiefOfLogistics],
            qualifying_specialties: vec![Specialty::Pilot, Specialty::Trader],
        },
    );
    categories
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = DecisionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.expeditions.categories.len(), ExpeditionCategory::ALL.len());
        assert_eq!(cfg.cache_ttl().millisols(), 10.0);
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
cache_ttl_millisols: 4.0
expeditions:
  role_bonus: 2.0
  categories:
    mining:
      base_score: 60.0
      capacity_per_expedition: 5
      preferred_roles: [chief_of_engineering]
";
        let cfg: DecisionConfig = serde_yml::from_str(yaml).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cache_ttl_millisols, 4.0);
        assert_eq!(cfg.critical_energy, 15.0);
        assert_eq!(cfg.expeditions.role_bonus, 2.0);
        let mining = cfg.expeditions.category(ExpeditionCategory::Mining).unwrap();
        assert!(mining.enabled);
        assert_eq!(mining.capacity_per_expedition, 5);
        assert!(mining.qualifying_specialties.is_empty());
        assert!(cfg.expeditions.category(ExpeditionCategory::Trade).is_none());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = DecisionConfig::default();
        if let Some(trade) = cfg.expeditions.categories.get_mut(&ExpeditionCategory::Trade) {
            trade.capacity_per_expedition = 0;
        }
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                field: "expeditions.categories.trade.capacity_per_expedition".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
        );
    }

    #[test]
    fn inverted_role_factors_are_rejected() {
        let mut cfg = DecisionConfig::default();
        cfg.expeditions.role_bonus = 0.8;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_finite_limits_are_rejected() {
        let mut cfg = DecisionConfig::default();
        cfg.activity_upper_limit = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = DecisionConfig::default();
        cfg.cache_ttl_millisols = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_specialty_list_accepts_everyone() {
        let cfg = CategoryConfig {
            enabled: true,
            base_score: 1.0,
            capacity_per_expedition: 1,
            preferred_roles: Vec::new(),
            qualifying_specialties: Vec::new(),
        };
        assert!(cfg.qualifies(Some(Specialty::Chef)));
        assert!(cfg.qualifies(None));
    }
}
