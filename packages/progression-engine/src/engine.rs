//! Progression engine
//!
//! Consumer-facing API: record lifecycle, profiles, experience grants and
//! leaderboards. Records go through a [`RecordStore`]; tier resolution uses
//! the engine's own [`TierCatalog`].
//!
//! # Usage
//!
//! ```rust
//! use progression_engine::{InMemoryProgressionStore, ProgressionEngine};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = ProgressionEngine::new(InMemoryProgressionStore::new());
//!
//! engine.create_guild_record(10, 20).await?;
//! engine.create_global_record(20).await?;
//! engine.add_experience(20, Some(10), 1_500, false).await?;
//!
//! let profile = engine.fetch_guild_profile(10, 20).await?;
//! assert_eq!(profile.level.current.to_string(), "Level 1");
//! # Ok::<(), progression_engine::ProgressionError>(())
//! # }).unwrap();
//! ```

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::{
    ExperienceUpdate, GlobalProfile, GlobalRecord, GuildProfile, GuildRecord, Label,
    ProgressionRecord, RecordStore, TierSource,
};
use crate::tiers::{TierCatalog, TierChange, TierSnapshot, TierTable};
use crate::{ProgressionError, Result};

pub struct ProgressionEngine {
    records: Arc<dyn RecordStore>,
    tiers: TierCatalog,
}

impl ProgressionEngine {
    /// Engine over one store serving both records and tier documents
    pub fn new<S>(store: S) -> Self
    where
        S: RecordStore + TierSource + 'static,
    {
        Self::with_config(store, &EngineConfig::default())
    }

    pub fn with_config<S>(store: S, config: &EngineConfig) -> Self
    where
        S: RecordStore + TierSource + 'static,
    {
        let store = Arc::new(store);
        let tiers = TierCatalog::new(store.clone(), config.tier_table.clone())
            .with_below_first_tier(config.below_first_tier);
        Self::from_parts(store, tiers)
    }

    pub fn from_parts(records: Arc<dyn RecordStore>, tiers: TierCatalog) -> Self {
        Self { records, tiers }
    }

    pub fn tiers(&self) -> &TierCatalog {
        &self.tiers
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Record lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Guild-scoped lookup when `guild_id` is given, global otherwise
    pub async fn exists(&self, user_id: u64, guild_id: Option<u64>) -> Result<bool> {
        Ok(match guild_id {
            Some(guild_id) => self
                .records
                .get_guild_record(guild_id, user_id)
                .await?
                .is_some(),
            None => self.records.get_global_record(user_id).await?.is_some(),
        })
    }

    /// Insert a zeroed guild record
    ///
    /// # Errors
    ///
    /// `UserOverwrite` when the key is already taken; nothing is written.
    pub async fn create_guild_record(&self, guild_id: u64, user_id: u64) -> Result<bool> {
        if self.exists(user_id, Some(guild_id)).await? {
            return Err(ProgressionError::guild_overwrite(guild_id, user_id));
        }
        let created = self
            .records
            .insert_guild_record(&GuildRecord::new(guild_id, user_id))
            .await?;
        info!(guild_id, user_id, "created guild record");
        Ok(created)
    }

    /// Insert a zeroed global record
    pub async fn create_global_record(&self, user_id: u64) -> Result<bool> {
        if self.exists(user_id, None).await? {
            return Err(ProgressionError::global_overwrite(user_id));
        }
        let created = self
            .records
            .insert_global_record(&GlobalRecord::new(user_id))
            .await?;
        info!(user_id, "created global record");
        Ok(created)
    }

    /// Create zeroed records for every member not yet tracked in `guild_id`
    pub async fn register_guild_members(&self, guild_id: u64, user_ids: &[u64]) -> Result<usize> {
        let records: Vec<GuildRecord> = user_ids
            .iter()
            .map(|&user_id| GuildRecord::new(guild_id, user_id))
            .collect();
        let inserted = self.records.insert_guild_records(&records).await?;
        info!(
            guild_id,
            requested = user_ids.len(),
            inserted,
            "registered guild members"
        );
        Ok(inserted)
    }

    /// Replace whatever is stored at the record's key
    pub async fn force_overwrite(&self, record: ProgressionRecord) -> Result<bool> {
        match &record {
            ProgressionRecord::Guild(guild) => {
                guild.validate()?;
                if self.exists(guild.user_id, Some(guild.guild_id)).await? {
                    info!(scope = %record.scope(), key = %record.key(), "overwriting record");
                }
                self.records.replace_guild_record(guild).await
            }
            ProgressionRecord::Global(global) => {
                global.validate()?;
                if self.exists(global.user_id, None).await? {
                    info!(scope = %record.scope(), key = %record.key(), "overwriting record");
                }
                self.records.replace_global_record(global).await
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Profiles
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn fetch_guild_profile(&self, guild_id: u64, user_id: u64) -> Result<GuildProfile> {
        let record = self.require_guild_record(guild_id, user_id).await?;
        let snapshot = self.tiers.current().await?;
        Ok(guild_profile(&snapshot, record))
    }

    pub async fn fetch_global_profile(&self, user_id: u64) -> Result<GlobalProfile> {
        let record = self.require_global_record(user_id).await?;
        let snapshot = self.tiers.current().await?;
        Ok(global_profile(&snapshot, record))
    }

    /// Current boost multiplier of a global record
    pub async fn fetch_boost(&self, user_id: u64) -> Result<Label> {
        let record = self.require_global_record(user_id).await?;
        let snapshot = self.tiers.current().await?;
        Ok(snapshot.boost(record.experience).current)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Experience
    // ═══════════════════════════════════════════════════════════════════════

    /// Add `amount` (may be negative) experience
    ///
    /// - with a guild: the guild record moves; artificial grants also move
    ///   its `artificial_experience`
    /// - real grants also move the global record
    /// - artificial grants never reach the global record, so without a guild
    ///   they change nothing
    ///
    /// Every precondition is checked before the first write.
    ///
    /// # Errors
    ///
    /// - `GlobalPermissions`: real grant without a guild
    /// - `RecordNotFound`: a targeted record does not exist
    ///
    /// # Returns
    ///
    /// `true` when every targeted record was updated, `false` when nothing
    /// was targeted
    pub async fn add_experience(
        &self,
        user_id: u64,
        guild_id: Option<u64>,
        amount: i64,
        artificial: bool,
    ) -> Result<bool> {
        let updates = plan_experience(user_id, guild_id, amount, artificial)?;
        if updates.is_empty() {
            debug!(user_id, amount, "artificial experience without a guild ignored");
            return Ok(false);
        }

        for update in &updates {
            match *update {
                ExperienceUpdate::Guild {
                    guild_id, user_id, ..
                } => {
                    self.require_guild_record(guild_id, user_id).await?;
                }
                ExperienceUpdate::Global { user_id, .. } => {
                    self.require_global_record(user_id).await?;
                }
            }
        }

        let applied = self.records.apply_experience(&updates).await?;
        if applied {
            debug!(user_id, ?guild_id, amount, artificial, "experience applied");
        } else {
            warn!(
                user_id,
                ?guild_id,
                amount,
                "experience update matched fewer records than planned"
            );
        }
        Ok(applied)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rankings
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn guild_leaderboard(&self, guild_id: u64, limit: usize) -> Result<Vec<GuildProfile>> {
        let records = self.records.list_guild_records(guild_id, Some(limit)).await?;
        let snapshot = self.tiers.current().await?;
        Ok(records
            .into_iter()
            .map(|record| guild_profile(&snapshot, record))
            .collect())
    }

    pub async fn global_leaderboard(&self, limit: usize) -> Result<Vec<GlobalProfile>> {
        let records = self.records.list_global_records(Some(limit)).await?;
        let snapshot = self.tiers.current().await?;
        Ok(records
            .into_iter()
            .map(|record| global_profile(&snapshot, record))
            .collect())
    }

    /// 1-based position within the guild
    pub async fn guild_rank(&self, guild_id: u64, user_id: u64) -> Result<u64> {
        self.records
            .guild_rank(guild_id, user_id)
            .await?
            .ok_or_else(|| ProgressionError::guild_record_not_found(guild_id, user_id))
    }

    pub async fn global_rank(&self, user_id: u64) -> Result<u64> {
        self.records
            .global_rank(user_id)
            .await?
            .ok_or_else(|| ProgressionError::global_record_not_found(user_id))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tier configuration
    // ═══════════════════════════════════════════════════════════════════════

    /// Reload the tier table from its source
    pub async fn reconfigure(&self) -> Result<Vec<TierChange>> {
        self.tiers.reload().await
    }

    pub async fn publish_tier_table(&self, table: &TierTable) -> Result<Vec<TierChange>> {
        self.tiers.publish(table).await
    }

    async fn require_guild_record(&self, guild_id: u64, user_id: u64) -> Result<GuildRecord> {
        self.records
            .get_guild_record(guild_id, user_id)
            .await?
            .ok_or_else(|| ProgressionError::guild_record_not_found(guild_id, user_id))
    }

    async fn require_global_record(&self, user_id: u64) -> Result<GlobalRecord> {
        self.records
            .get_global_record(user_id)
            .await?
            .ok_or_else(|| ProgressionError::global_record_not_found(user_id))
    }
}

fn guild_profile(snapshot: &TierSnapshot, record: GuildRecord) -> GuildProfile {
    GuildProfile {
        prestige: snapshot.prestige(record.experience),
        level: snapshot.level(record.experience),
        record,
    }
}

fn global_profile(snapshot: &TierSnapshot, record: GlobalRecord) -> GlobalProfile {
    GlobalProfile {
        league: snapshot.league(record.experience),
        boost: snapshot.boost(record.experience),
        record,
    }
}

/// Statements for one grant, guild first
fn plan_experience(
    user_id: u64,
    guild_id: Option<u64>,
    amount: i64,
    artificial: bool,
) -> Result<Vec<ExperienceUpdate>> {
    match (guild_id, artificial) {
        (None, false) => Err(ProgressionError::global_permissions(format!(
            "Real experience for user {} needs a guild context",
            user_id
        ))),
        (None, true) => Ok(Vec::new()),
        (Some(guild_id), true) => Ok(vec![ExperienceUpdate::Guild {
            guild_id,
            user_id,
            amount,
            artificial: true,
        }]),
        (Some(guild_id), false) => Ok(vec![
            ExperienceUpdate::Guild {
                guild_id,
                user_id,
                amount,
                artificial: false,
            },
            ExperienceUpdate::Global { user_id, amount },
        ]),
    }
}
