//! Engine scenarios, run against every storage backend

mod common;

use common::*;
use pretty_assertions::assert_eq;
use progression_engine::domain::EXPERIENCE_CEILING;
use progression_engine::{
    ErrorKind, GlobalRecord, GuildRecord, Label, ProgressionEngine, Remaining, TierTable,
};

macro_rules! on_every_backend {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::common::memory_engine()).await;
                }
            )*
        }

        mod sqlite {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::common::sqlite_engine()).await;
                }
            )*
        }
    };
}

on_every_backend!(
    duplicate_create_is_user_overwrite,
    real_grant_without_guild_has_no_side_effects,
    artificial_grant_only_touches_guild,
    real_grant_updates_both_scopes,
    negative_grant_saturates_and_clamps_artificial,
    grant_to_missing_record_writes_nothing,
    force_overwrite_then_fetch_profile,
    master_band_profile,
    global_profile_statistics,
    leaderboards_and_ranks,
    register_members_then_grant,
    publish_then_reconfigure,
    grant_near_experience_ceiling,
    artificial_grant_without_guild_changes_nothing,
);

async fn duplicate_create_is_user_overwrite(engine: ProgressionEngine) {
    enrolled(&engine).await;
    engine
        .add_experience(USER, Some(GUILD), 40, false)
        .await
        .unwrap();

    let err = engine.create_guild_record(GUILD, USER).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserOverwrite);
    assert!(err.message.contains("(10, 20)"));

    let err = engine.create_global_record(USER).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserOverwrite);

    assert_eq!(guild_record(&engine, GUILD, USER).await.experience, 40);
    assert_eq!(global_record(&engine, USER).await.experience, 40);
}

async fn real_grant_without_guild_has_no_side_effects(engine: ProgressionEngine) {
    enrolled(&engine).await;

    let err = engine.add_experience(USER, None, 50, false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::GlobalPermissions);
    assert!(err.is_recoverable());

    assert_eq!(guild_record(&engine, GUILD, USER).await, GuildRecord::new(GUILD, USER));
    assert_eq!(global_record(&engine, USER).await, GlobalRecord::new(USER));
}

async fn artificial_grant_only_touches_guild(engine: ProgressionEngine) {
    enrolled(&engine).await;

    assert!(engine.add_experience(USER, Some(GUILD), 50, true).await.unwrap());

    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 50, 50)
    );
    assert_eq!(global_record(&engine, USER).await.experience, 0);
}

async fn real_grant_updates_both_scopes(engine: ProgressionEngine) {
    enrolled(&engine).await;
    engine.create_guild_record(OTHER_GUILD, USER).await.unwrap();

    engine.add_experience(USER, Some(GUILD), 30, false).await.unwrap();
    engine.add_experience(USER, Some(GUILD), 20, true).await.unwrap();
    engine
        .add_experience(USER, Some(OTHER_GUILD), 5, false)
        .await
        .unwrap();

    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 50, 20)
    );
    assert_eq!(guild_record(&engine, OTHER_GUILD, USER).await.experience, 5);
    assert_eq!(global_record(&engine, USER).await.experience, 35);
}

async fn negative_grant_saturates_and_clamps_artificial(engine: ProgressionEngine) {
    engine
        .force_overwrite(GuildRecord::with_experience(GUILD, USER, 100, 80).into())
        .await
        .unwrap();
    engine
        .force_overwrite(GlobalRecord::with_experience(USER, 30).into())
        .await
        .unwrap();

    engine
        .add_experience(USER, Some(GUILD), -50, false)
        .await
        .unwrap();

    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 50, 50)
    );
    assert_eq!(global_record(&engine, USER).await.experience, 0);

    engine
        .add_experience(USER, Some(GUILD), -500, true)
        .await
        .unwrap();
    assert_eq!(
        guild_record(&engine, GUILD, USER).await,
        GuildRecord::with_experience(GUILD, USER, 0, 0)
    );
}

async fn grant_to_missing_record_writes_nothing(engine: ProgressionEngine) {
    engine.create_guild_record(GUILD, USER).await.unwrap();

    let err = engine
        .add_experience(USER, Some(GUILD), 10, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFound);
    assert_eq!(guild_record(&engine, GUILD, USER).await.experience, 0);

    let err = engine
        .add_experience(USER, Some(OTHER_GUILD), 10, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFound);
}

async fn force_overwrite_then_fetch_profile(engine: ProgressionEngine) {
    enrolled(&engine).await;
    engine
        .add_experience(USER, Some(GUILD), 999, false)
        .await
        .unwrap();

    let record = GuildRecord::with_experience(GUILD, USER, 52_600, 600);
    engine.force_overwrite(record.clone().into()).await.unwrap();

    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(profile.record, record);

    // 52_600 % 50_000 == 2_600: past 2_500, short of 4_500.
    assert_eq!(profile.level.current, Label::text("Level 2"));
    assert_eq!(profile.level.next, Label::text("Level 3"));
    assert_eq!(profile.level.remaining, Remaining::Points(1_900));

    assert_eq!(profile.prestige.current, Label::text("Bronze"));
    assert_eq!(profile.prestige.next, Label::text("Silver"));
    assert_eq!(profile.prestige.remaining, Remaining::Points(47_400));
}

async fn master_band_profile(engine: ProgressionEngine) {
    engine
        .force_overwrite(GuildRecord::with_experience(GUILD, USER, 300_000, 0).into())
        .await
        .unwrap();

    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(profile.level.current, Label::text("Level 0"));
    assert_eq!(profile.level.remaining, Remaining::Points(30_000));

    assert_eq!(profile.prestige.current, Label::text("Master"));
    assert_eq!(profile.prestige.next, Label::text("Elite"));
    assert_eq!(profile.prestige.remaining, Remaining::Points(700_000));

    engine
        .force_overwrite(GuildRecord::with_experience(GUILD, USER, 5_000_000, 0).into())
        .await
        .unwrap();
    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(profile.level.current, Label::text("Level 10"));
    assert!(profile.level.is_maxed());
    assert_eq!(profile.prestige.next, Label::text("Max Prestige Reached!"));
    assert!(profile.prestige.is_maxed());
}

async fn global_profile_statistics(engine: ProgressionEngine) {
    engine
        .force_overwrite(GlobalRecord::with_experience(USER, 60_000).into())
        .await
        .unwrap();

    let profile = engine.fetch_global_profile(USER).await.unwrap();
    assert_eq!(profile.league.current, Label::text("Iron"));
    assert_eq!(profile.league.next, Label::text("Steel"));
    assert_eq!(profile.league.remaining, Remaining::Points(90_000));

    assert_eq!(profile.boost.current.as_f64(), Some(1.1));
    assert_eq!(profile.boost.next.as_f64(), Some(1.25));
    assert_eq!(profile.boost.remaining, Remaining::Points(40_000));

    assert_eq!(engine.fetch_boost(USER).await.unwrap().as_f64(), Some(1.1));
}

async fn leaderboards_and_ranks(engine: ProgressionEngine) {
    seed(&engine, GUILD, &[(1, 500), (2, 9_000), (3, 500), (4, 20)]).await;
    seed(&engine, OTHER_GUILD, &[(5, 100_000)]).await;

    let top: Vec<u64> = engine
        .guild_leaderboard(GUILD, 3)
        .await
        .unwrap()
        .iter()
        .map(|p| p.record.user_id)
        .collect();
    assert_eq!(top, vec![2, 1, 3]);

    let global: Vec<u64> = engine
        .global_leaderboard(10)
        .await
        .unwrap()
        .iter()
        .map(|p| p.record.user_id)
        .collect();
    assert_eq!(global, vec![5, 2, 1, 3, 4]);

    assert_eq!(engine.guild_rank(GUILD, 3).await.unwrap(), 3);
    assert_eq!(engine.guild_rank(OTHER_GUILD, 5).await.unwrap(), 1);
    assert_eq!(engine.global_rank(4).await.unwrap(), 5);

    let err = engine.guild_rank(OTHER_GUILD, 1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecordNotFound);
}

async fn register_members_then_grant(engine: ProgressionEngine) {
    engine.create_guild_record(GUILD, 1).await.unwrap();
    engine
        .add_experience(1, Some(GUILD), 70, true)
        .await
        .unwrap();

    let inserted = engine
        .register_guild_members(GUILD, &[1, 2, 3])
        .await
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(guild_record(&engine, GUILD, 1).await.experience, 70);

    engine
        .add_experience(3, Some(GUILD), 15, true)
        .await
        .unwrap();
    assert_eq!(guild_record(&engine, GUILD, 3).await.artificial_experience, 15);
}

async fn publish_then_reconfigure(engine: ProgressionEngine) {
    engine
        .force_overwrite(GuildRecord::with_experience(GUILD, USER, 10, 0).into())
        .await
        .unwrap();
    assert_eq!(
        engine
            .fetch_guild_profile(GUILD, USER)
            .await
            .unwrap()
            .prestige
            .current,
        Label::text("Recruit")
    );

    let mut table = TierTable::fallback().unwrap();
    table.prestiges.labels[0] = Label::text("Initiate");
    let changes = engine.publish_tier_table(&table).await.unwrap();
    assert_eq!(changes.len(), 1);

    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(profile.prestige.current, Label::text("Initiate"));

    assert!(engine.reconfigure().await.unwrap().is_empty());
}

async fn grant_near_experience_ceiling(engine: ProgressionEngine) {
    let start = EXPERIENCE_CEILING - 5;
    engine
        .force_overwrite(GuildRecord::with_experience(GUILD, USER, start, start).into())
        .await
        .unwrap();
    engine
        .force_overwrite(GlobalRecord::with_experience(USER, start).into())
        .await
        .unwrap();

    assert!(engine.add_experience(USER, Some(GUILD), 10, false).await.unwrap());
    assert!(engine.add_experience(USER, Some(GUILD), 10, true).await.unwrap());

    let profile = engine.fetch_guild_profile(GUILD, USER).await.unwrap();
    assert_eq!(
        profile.record,
        GuildRecord::with_experience(GUILD, USER, EXPERIENCE_CEILING, EXPERIENCE_CEILING)
    );
    assert!(profile.level.is_maxed());
    assert!(profile.prestige.is_maxed());

    let profile = engine.fetch_global_profile(USER).await.unwrap();
    assert_eq!(profile.record.experience, EXPERIENCE_CEILING);
    assert!(profile.league.is_maxed());

    // Still readable and movable after saturating.
    engine
        .add_experience(USER, Some(GUILD), -(EXPERIENCE_CEILING as i64), false)
        .await
        .unwrap();
    assert_eq!(guild_record(&engine, GUILD, USER).await.experience, 0);
    assert_eq!(global_record(&engine, USER).await.experience, 0);
}

async fn artificial_grant_without_guild_changes_nothing(engine: ProgressionEngine) {
    enrolled(&engine).await;

    assert!(!engine.add_experience(USER, None, 50, true).await.unwrap());

    assert_eq!(guild_record(&engine, GUILD, USER).await, GuildRecord::new(GUILD, USER));
    assert_eq!(global_record(&engine, USER).await, GlobalRecord::new(USER));
}
