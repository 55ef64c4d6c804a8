//! SQLite-backed engine: persistence and concurrent grants

mod common;

use common::*;
use pretty_assertions::assert_eq;
use progression_engine::{
    BelowFirstTier, EngineConfig, GuildRecord, Label, ProgressionEngine, SqliteProgressionStore,
    TierTable,
};
use progression_engine::tiers::TierOrigin;
use std::sync::Arc;
use tempfile::TempDir;

fn open(path: &std::path::Path) -> ProgressionEngine {
    ProgressionEngine::new(SqliteProgressionStore::new(path).unwrap())
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("levels.db");

    {
        let engine = open(&db_path);
        enrolled(&engine).await;
        engine
            .add_experience(USER, Some(GUILD), 1_200, false)
            .await
            .unwrap();
        engine
            .add_experience(USER, Some(GUILD), 300, true)
            .await
            .unwrap();
    }

    let engine = open(&db_path);
    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 1_500, 300)
    );
    assert_eq!(global_record(&engine, USER).await.experience, 1_200);
}

#[tokio::test]
async fn test_published_tier_table_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("levels.db");

    let mut table = TierTable::fallback().unwrap();
    table.leagues.labels[0] = Label::text("Driftwood");
    open(&db_path).publish_tier_table(&table).await.unwrap();

    let engine = open(&db_path);
    let snapshot = engine.tiers().current().await.unwrap();
    assert_eq!(snapshot.origin, TierOrigin::Persisted);
    assert_eq!(snapshot.table, table);
}

#[tokio::test]
async fn test_config_selects_tier_document() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("levels.db");

    let mut seasonal = TierTable::fallback().unwrap();
    seasonal.prestiges.bounds[0] = 100;
    let config = EngineConfig {
        database_path: Some(db_path.clone()),
        tier_table: "seasonal".to_string(),
        below_first_tier: BelowFirstTier::WrapToLast,
        ..EngineConfig::default()
    };

    let engine =
        ProgressionEngine::with_config(SqliteProgressionStore::new(&db_path).unwrap(), &config);
    engine.publish_tier_table(&seasonal).await.unwrap();
    engine.create_guild_record(GUILD, USER).await.unwrap();

    // Below the first bound the legacy policy reuses the last name.
    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(profile.prestige.current, Label::text("Elite"));
    assert_eq!(profile.prestige.next, Label::text("Recruit"));

    // The default document is untouched.
    let default_engine = open(&db_path);
    let snapshot = default_engine.tiers().current().await.unwrap();
    assert_eq!(snapshot.origin, TierOrigin::Static);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_are_not_lost() {
    let engine = Arc::new(sqlite_engine());
    enrolled(&engine).await;

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .add_experience(USER, Some(GUILD), 10, i % 4 == 0)
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }

    // 8 of the 32 grants were artificial.
    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 320, 80)
    );
    assert_eq!(global_record(&engine, USER).await.experience, 240);
}
