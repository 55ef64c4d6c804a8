//! Progression Engine
//!
//! Tracks experience per user in two scopes and turns raw totals into
//! progression tiers.
//!
//! ## Scopes
//!
//! - **Guild**: `(guild_id, user_id)` records with total and artificial experience
//! - **Global**: `user_id` records fed only by real (non-artificial) grants
//!
//! ## Tier Families
//!
//! | Family   | Scope  | Resolver                         |
//! |----------|--------|----------------------------------|
//! | Level    | Guild  | three bands, base band cycles    |
//! | Prestige | Guild  | boundary walk                    |
//! | League   | Global | boundary walk                    |
//! | Boost    | Global | boundary walk, numeric labels    |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use progression_engine::{EngineConfig, ProgressionEngine, SqliteProgressionStore};
//!
//! let config = EngineConfig::from_path("progression.yaml")?.with_env_overrides()?;
//! let store = SqliteProgressionStore::new("levels.db")?;
//! let engine = ProgressionEngine::with_config(store, &config);
//!
//! engine.create_guild_record(guild_id, user_id).await?;
//! engine.add_experience(user_id, Some(guild_id), 25, false).await?;
//! let profile = engine.fetch_guild_profile(guild_id, user_id).await?;
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod tiers;

pub use config::EngineConfig;
pub use engine::ProgressionEngine;
pub use error::{ErrorKind, ProgressionError, Result};

pub use domain::{
    ExperienceUpdate, GlobalProfile, GlobalRecord, GuildProfile, GuildRecord, Label,
    ProgressionRecord, RecordStore, Remaining, Scope, Statistic, TierSource,
};
pub use infrastructure::InMemoryProgressionStore;
pub use tiers::{BelowFirstTier, TierCatalog, TierChange, TierSnapshot, TierTable};

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteProgressionStore;
