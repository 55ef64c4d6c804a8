//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use progression_engine::{
    GlobalRecord, GuildRecord, InMemoryProgressionStore, ProgressionEngine, SqliteProgressionStore,
};

pub const GUILD: u64 = 10;
pub const OTHER_GUILD: u64 = 11;
pub const USER: u64 = 20;

pub fn memory_engine() -> ProgressionEngine {
    ProgressionEngine::new(InMemoryProgressionStore::new())
}

pub fn sqlite_engine() -> ProgressionEngine {
    ProgressionEngine::new(SqliteProgressionStore::in_memory().unwrap())
}

/// Guild + global record for `USER` in `GUILD`
pub async fn enrolled(engine: &ProgressionEngine) {
    engine.create_guild_record(GUILD, USER).await.unwrap();
    engine.create_global_record(USER).await.unwrap();
}

pub async fn guild_record(engine: &ProgressionEngine, guild_id: u64, user_id: u64) -> GuildRecord {
    engine
        .fetch_guild_profile(guild_id, user_id)
        .await
        .unwrap()
        .record
}

pub async fn global_record(engine: &ProgressionEngine, user_id: u64) -> GlobalRecord {
    engine.fetch_global_profile(user_id).await.unwrap().record
}

/// Seed a guild with `(user, experience)` pairs, global records included
pub async fn seed(engine: &ProgressionEngine, guild_id: u64, members: &[(u64, u64)]) {
    for &(user_id, experience) in members {
        engine
            .force_overwrite(GuildRecord::with_experience(guild_id, user_id, experience, 0).into())
            .await
            .unwrap();
        engine
            .force_overwrite(GlobalRecord::with_experience(user_id, experience).into())
            .await
            .unwrap();
    }
}
