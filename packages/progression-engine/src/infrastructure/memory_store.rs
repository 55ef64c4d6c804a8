//! In-Memory Progression Store
//!
//! HashMap-based implementation for unit tests and embedding.
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{ExperienceUpdate, GlobalRecord, GuildRecord, RecordStore, TierSource};
use crate::{ProgressionError, Result};

#[derive(Clone, Default)]
pub struct InMemoryProgressionStore {
    guild: Arc<RwLock<HashMap<(u64, u64), GuildRecord>>>,
    global: Arc<RwLock<HashMap<u64, GlobalRecord>>>,
    configs: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryProgressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for `new`, mirrors `SqliteProgressionStore::in_memory`
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new())
    }
}

fn take_limit<T>(mut records: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

#[async_trait]
impl RecordStore for InMemoryProgressionStore {
    async fn get_guild_record(&self, guild_id: u64, user_id: u64) -> Result<Option<GuildRecord>> {
        Ok(self.guild.read().get(&(guild_id, user_id)).cloned())
    }

    async fn get_global_record(&self, user_id: u64) -> Result<Option<GlobalRecord>> {
        Ok(self.global.read().get(&user_id).cloned())
    }

    async fn insert_guild_record(&self, record: &GuildRecord) -> Result<bool> {
        match self.guild.write().entry((record.guild_id, record.user_id)) {
            Entry::Occupied(_) => Err(ProgressionError::guild_overwrite(
                record.guild_id,
                record.user_id,
            )),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn insert_global_record(&self, record: &GlobalRecord) -> Result<bool> {
        match self.global.write().entry(record.user_id) {
            Entry::Occupied(_) => Err(ProgressionError::global_overwrite(record.user_id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn insert_guild_records(&self, records: &[GuildRecord]) -> Result<usize> {
        let mut table = self.guild.write();
        let mut inserted = 0;
        for record in records {
            if let Entry::Vacant(slot) = table.entry((record.guild_id, record.user_id)) {
                slot.insert(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn replace_guild_record(&self, record: &GuildRecord) -> Result<bool> {
        self.guild
            .write()
            .insert((record.guild_id, record.user_id), record.clone());
        Ok(true)
    }

    async fn replace_global_record(&self, record: &GlobalRecord) -> Result<bool> {
        self.global.write().insert(record.user_id, record.clone());
        Ok(true)
    }

    async fn apply_experience(&self, updates: &[ExperienceUpdate]) -> Result<bool> {
        // Lock order: guild, then global.
        let mut guild = self.guild.write();
        let mut global = self.global.write();

        let mut matched = true;
        for update in updates {
            match *update {
                ExperienceUpdate::Guild {
                    guild_id,
                    user_id,
                    amount,
                    artificial,
                } => match guild.get_mut(&(guild_id, user_id)) {
                    Some(record) => record.apply(amount, artificial),
                    None => matched = false,
                },
                ExperienceUpdate::Global { user_id, amount } => match global.get_mut(&user_id) {
                    Some(record) => record.apply(amount),
                    None => matched = false,
                },
            }
        }
        Ok(matched)
    }

    async fn list_guild_records(
        &self,
        guild_id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<GuildRecord>> {
        let mut records: Vec<GuildRecord> = self
            .guild
            .read()
            .values()
            .filter(|r| r.guild_id == guild_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (Reverse(r.experience), r.user_id));
        Ok(take_limit(records, limit))
    }

    async fn list_global_records(&self, limit: Option<usize>) -> Result<Vec<GlobalRecord>> {
        let mut records: Vec<GlobalRecord> = self.global.read().values().cloned().collect();
        records.sort_by_key(|r| (Reverse(r.experience), r.user_id));
        Ok(take_limit(records, limit))
    }

    async fn guild_rank(&self, guild_id: u64, user_id: u64) -> Result<Option<u64>> {
        let table = self.guild.read();
        let Some(target) = table.get(&(guild_id, user_id)) else {
            return Ok(None);
        };
        let ahead = table
            .values()
            .filter(|r| r.guild_id == guild_id)
            .filter(|r| (Reverse(r.experience), r.user_id) < (Reverse(target.experience), user_id))
            .count();
        Ok(Some(ahead as u64 + 1))
    }

    async fn global_rank(&self, user_id: u64) -> Result<Option<u64>> {
        let table = self.global.read();
        let Some(target) = table.get(&user_id) else {
            return Ok(None);
        };
        let ahead = table
            .values()
            .filter(|r| (Reverse(r.experience), r.user_id) < (Reverse(target.experience), user_id))
            .count();
        Ok(Some(ahead as u64 + 1))
    }
}

#[async_trait]
impl TierSource for InMemoryProgressionStore {
    async fn load_tier_table(&self, name: &str) -> Result<Option<String>> {
        Ok(self.configs.read().get(name).cloned())
    }

    async fn save_tier_table(&self, name: &str, document: &str) -> Result<bool> {
        self.configs
            .write()
            .insert(name.to_string(), document.to_string());
        Ok(true)
    }
}
