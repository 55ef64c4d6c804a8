//! Engine configuration (YAML / env loading)
//!
//! ```yaml
//! database_path: /var/lib/progression/levels.db
//! tier_table: leveling-api
//! below_first_tier: untiered
//! log_filter: info,progression_engine=debug
//! ```
//!
//! Environment overrides use the `PROGRESSION__` prefix, e.g.
//! `PROGRESSION__TIER_TABLE=seasonal`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tiers::{BelowFirstTier, DEFAULT_TIER_TABLE};
use crate::{ProgressionError, Result};

pub const ENV_DATABASE_PATH: &str = "PROGRESSION__DATABASE_PATH";
pub const ENV_TIER_TABLE: &str = "PROGRESSION__TIER_TABLE";
pub const ENV_LOG_FILTER: &str = "PROGRESSION__LOG_FILTER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite file; `None` keeps everything in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Name of the persisted tier document
    pub tier_table: String,

    pub below_first_tier: BelowFirstTier,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            tier_table: DEFAULT_TIER_TABLE.to_string(),
            below_first_tier: BelowFirstTier::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ProgressionError::configuration(format!(
                "Cannot read config file {}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply `PROGRESSION__*` environment variables
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(name) = lookup(ENV_TIER_TABLE) {
            self.tier_table = name;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tier_table.trim().is_empty() {
            return Err(ProgressionError::configuration(
                "tier_table must not be empty",
            ));
        }
        Ok(())
    }
}
