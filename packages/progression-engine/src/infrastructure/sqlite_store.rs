//! SQLite Progression Store
//!
//! File-based persistent storage using SQLite. Multi-statement operations
//! (forced overwrite, experience across both scopes, bulk registration) run
//! inside a single transaction.
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

use crate::domain::{
    ExperienceUpdate, GlobalRecord, GuildRecord, RecordStore, TierSource, EXPERIENCE_CEILING,
};
use crate::{ProgressionError, Result};

const GUILD_COLUMNS: &str = "guild_id, user_id, experience, artificial";
const GLOBAL_COLUMNS: &str = "user_id, experience";

/// SQLite-based RecordStore + TierSource implementation
#[derive(Clone)]
pub struct SqliteProgressionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProgressionStore {
    /// Create a new SQLite store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS guild_levels (
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                experience INTEGER NOT NULL DEFAULT 0,
                artificial INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (guild_id, user_id),
                CHECK (artificial <= experience)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_guild_levels_ranking
             ON guild_levels(guild_id, experience DESC, user_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_levels (
                user_id INTEGER PRIMARY KEY,
                experience INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_user_levels_ranking
             ON user_levels(experience DESC, user_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS configs (
                name TEXT PRIMARY KEY,
                settings TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

// SQLite INTEGER is a signed 64-bit value.
fn to_sql(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        ProgressionError::invalid_record(format!("{} exceeds the SQLite INTEGER range", value))
    })
}

fn from_sql(value: i64) -> u64 {
    value.max(0) as u64
}

/// `column + ?1` clamped to `[0, EXPERIENCE_CEILING]`
///
/// SQLite turns an overflowing integer sum into a REAL, so the upper bound is
/// checked before adding.
fn shifted(column: &str) -> String {
    format!(
        "CASE WHEN {column} > {max} - MAX(?1, 0) THEN {max} ELSE MAX({column} + ?1, 0) END",
        column = column,
        max = EXPERIENCE_CEILING,
    )
}

fn guild_from_row(row: &Row<'_>) -> rusqlite::Result<GuildRecord> {
    Ok(GuildRecord {
        guild_id: from_sql(row.get(0)?),
        user_id: from_sql(row.get(1)?),
        experience: from_sql(row.get(2)?),
        artificial_experience: from_sql(row.get(3)?),
    })
}

fn global_from_row(row: &Row<'_>) -> rusqlite::Result<GlobalRecord> {
    Ok(GlobalRecord {
        user_id: from_sql(row.get(0)?),
        experience: from_sql(row.get(1)?),
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn sql_limit(limit: Option<usize>) -> i64 {
    // Negative LIMIT means unlimited in SQLite.
    limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

#[async_trait]
impl RecordStore for SqliteProgressionStore {
    async fn get_guild_record(&self, guild_id: u64, user_id: u64) -> Result<Option<GuildRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM guild_levels WHERE guild_id = ?1 AND user_id = ?2",
                    GUILD_COLUMNS
                ),
                params![to_sql(guild_id)?, to_sql(user_id)?],
                guild_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn get_global_record(&self, user_id: u64) -> Result<Option<GlobalRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {} FROM user_levels WHERE user_id = ?1", GLOBAL_COLUMNS),
                params![to_sql(user_id)?],
                global_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn insert_guild_record(&self, record: &GuildRecord) -> Result<bool> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO guild_levels (guild_id, user_id, experience, artificial)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                to_sql(record.guild_id)?,
                to_sql(record.user_id)?,
                to_sql(record.experience)?,
                to_sql(record.artificial_experience)?,
            ],
        );
        match result {
            Ok(rows) => Ok(rows == 1),
            Err(err) if is_constraint_violation(&err) => {
                Err(ProgressionError::guild_overwrite(record.guild_id, record.user_id)
                    .with_source(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_global_record(&self, record: &GlobalRecord) -> Result<bool> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO user_levels (user_id, experience) VALUES (?1, ?2)",
            params![to_sql(record.user_id)?, to_sql(record.experience)?],
        );
        match result {
            Ok(rows) => Ok(rows == 1),
            Err(err) if is_constraint_violation(&err) => {
                Err(ProgressionError::global_overwrite(record.user_id).with_source(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_guild_records(&self, records: &[GuildRecord]) -> Result<usize> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO guild_levels (guild_id, user_id, experience, artificial)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    to_sql(record.guild_id)?,
                    to_sql(record.user_id)?,
                    to_sql(record.experience)?,
                    to_sql(record.artificial_experience)?,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    async fn replace_guild_record(&self, record: &GuildRecord) -> Result<bool> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM guild_levels WHERE guild_id = ?1 AND user_id = ?2",
            params![to_sql(record.guild_id)?, to_sql(record.user_id)?],
        )?;
        let rows = tx.execute(
            "INSERT INTO guild_levels (guild_id, user_id, experience, artificial)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                to_sql(record.guild_id)?,
                to_sql(record.user_id)?,
                to_sql(record.experience)?,
                to_sql(record.artificial_experience)?,
            ],
        )?;

        tx.commit()?;
        Ok(rows == 1)
    }

    async fn replace_global_record(&self, record: &GlobalRecord) -> Result<bool> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM user_levels WHERE user_id = ?1",
            params![to_sql(record.user_id)?],
        )?;
        let rows = tx.execute(
            "INSERT INTO user_levels (user_id, experience) VALUES (?1, ?2)",
            params![to_sql(record.user_id)?, to_sql(record.experience)?],
        )?;

        tx.commit()?;
        Ok(rows == 1)
    }

    async fn apply_experience(&self, updates: &[ExperienceUpdate]) -> Result<bool> {
        let real_guild = format!(
            "UPDATE guild_levels
             SET experience = {total},
                 artificial = MIN(artificial, {total})
             WHERE guild_id = ?2 AND user_id = ?3",
            total = shifted("experience"),
        );
        let artificial_guild = format!(
            "UPDATE guild_levels
             SET experience = {total},
                 artificial = MIN({artificial}, {total})
             WHERE guild_id = ?2 AND user_id = ?3",
            total = shifted("experience"),
            artificial = shifted("artificial"),
        );
        let global = format!(
            "UPDATE user_levels SET experience = {} WHERE user_id = ?2",
            shifted("experience")
        );

        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        // Right-hand sides read pre-update values, so `artificial` is clamped
        // against the new total computed from the old one.
        let mut matched = true;
        for update in updates {
            let rows = match *update {
                ExperienceUpdate::Guild {
                    guild_id,
                    user_id,
                    amount,
                    artificial,
                } => tx.execute(
                    if artificial { &artificial_guild } else { &real_guild },
                    params![amount, to_sql(guild_id)?, to_sql(user_id)?],
                )?,
                ExperienceUpdate::Global { user_id, amount } => {
                    tx.execute(&global, params![amount, to_sql(user_id)?])?
                }
            };
            matched &= rows == 1;
        }

        tx.commit()?;
        Ok(matched)
    }

    async fn list_guild_records(
        &self,
        guild_id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<GuildRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM guild_levels WHERE guild_id = ?1
             ORDER BY experience DESC, user_id ASC LIMIT ?2",
            GUILD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![to_sql(guild_id)?, sql_limit(limit)], guild_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn list_global_records(&self, limit: Option<usize>) -> Result<Vec<GlobalRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user_levels ORDER BY experience DESC, user_id ASC LIMIT ?1",
            GLOBAL_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![sql_limit(limit)], global_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn guild_rank(&self, guild_id: u64, user_id: u64) -> Result<Option<u64>> {
        let conn = self.conn.lock();
        let (guild, user) = (to_sql(guild_id)?, to_sql(user_id)?);

        let experience: Option<i64> = conn
            .query_row(
                "SELECT experience FROM guild_levels WHERE guild_id = ?1 AND user_id = ?2",
                params![guild, user],
                |row| row.get(0),
            )
            .optional()?;
        let Some(experience) = experience else {
            return Ok(None);
        };

        let ahead: i64 = conn.query_row(
            "SELECT COUNT(*) FROM guild_levels
             WHERE guild_id = ?1
               AND (experience > ?2 OR (experience = ?2 AND user_id < ?3))",
            params![guild, experience, user],
            |row| row.get(0),
        )?;
        Ok(Some(from_sql(ahead) + 1))
    }

    async fn global_rank(&self, user_id: u64) -> Result<Option<u64>> {
        let conn = self.conn.lock();
        let user = to_sql(user_id)?;

        let experience: Option<i64> = conn
            .query_row(
                "SELECT experience FROM user_levels WHERE user_id = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()?;
        let Some(experience) = experience else {
            return Ok(None);
        };

        let ahead: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_levels
             WHERE experience > ?1 OR (experience = ?1 AND user_id < ?2)",
            params![experience, user],
            |row| row.get(0),
        )?;
        Ok(Some(from_sql(ahead) + 1))
    }
}

#[async_trait]
impl TierSource for SqliteProgressionStore {
    async fn load_tier_table(&self, name: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let settings = conn
            .query_row(
                "SELECT settings FROM configs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(settings)
    }

    async fn save_tier_table(&self, name: &str, document: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "INSERT INTO configs (name, settings) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET settings = excluded.settings",
            params![name, document],
        )?;
        Ok(rows == 1)
    }
}
