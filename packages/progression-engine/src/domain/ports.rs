//! Storage Ports (Trait Interfaces)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Production: SQLite (`SqliteProgressionStore`)
//! - Testing: InMemory (`InMemoryProgressionStore`)
//!
//! Every method is a potential suspension point. Per-key serialization is the
//! backend's job; the engine never locks records itself.

use async_trait::async_trait;

use super::models::{ExperienceUpdate, GlobalRecord, GuildRecord};
use crate::Result;

/// Progression Record Store Port (Primary Interface)
///
/// All record backends must implement this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reads
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Get a guild record by `(guild_id, user_id)`
    async fn get_guild_record(&self, guild_id: u64, user_id: u64) -> Result<Option<GuildRecord>>;

    /// Get a global record by `user_id`
    async fn get_global_record(&self, user_id: u64) -> Result<Option<GlobalRecord>>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Inserts (never overwrite)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a guild record
    ///
    /// # Errors
    ///
    /// Fails if the key already exists; an existing row is never replaced.
    async fn insert_guild_record(&self, record: &GuildRecord) -> Result<bool>;

    /// Insert a global record
    async fn insert_global_record(&self, record: &GlobalRecord) -> Result<bool>;

    /// Bulk insert, skipping keys that already exist
    ///
    /// # Returns
    ///
    /// Number of rows actually inserted
    async fn insert_guild_records(&self, records: &[GuildRecord]) -> Result<usize>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Forced replacement (delete-then-insert)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Delete any record at the key, then insert `record`
    async fn replace_guild_record(&self, record: &GuildRecord) -> Result<bool>;

    /// Delete any record at the key, then insert `record`
    async fn replace_global_record(&self, record: &GlobalRecord) -> Result<bool>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Experience
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Apply experience updates in order
    ///
    /// Backends with transactions apply the whole slice atomically. Totals
    /// saturate at zero and at `EXPERIENCE_CEILING`; artificial experience
    /// never exceeds the total.
    ///
    /// # Returns
    ///
    /// `true` when every update matched an existing row
    async fn apply_experience(&self, updates: &[ExperienceUpdate]) -> Result<bool>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Rankings
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //
    // Ordering: experience descending, then user_id ascending.

    /// Top guild records (None = unlimited)
    async fn list_guild_records(&self, guild_id: u64, limit: Option<usize>)
        -> Result<Vec<GuildRecord>>;

    /// Top global records (None = unlimited)
    async fn list_global_records(&self, limit: Option<usize>) -> Result<Vec<GlobalRecord>>;

    /// 1-based position of a user within a guild, None when absent
    async fn guild_rank(&self, guild_id: u64, user_id: u64) -> Result<Option<u64>>;

    /// 1-based global position, None when absent
    async fn global_rank(&self, user_id: u64) -> Result<Option<u64>>;
}

/// Tier table configuration source
#[async_trait]
pub trait TierSource: Send + Sync {
    /// Raw JSON document stored under `name`, if any
    async fn load_tier_table(&self, name: &str) -> Result<Option<String>>;

    /// Insert or update the document stored under `name`
    async fn save_tier_table(&self, name: &str, document: &str) -> Result<bool>;
}
