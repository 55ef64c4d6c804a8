//! Tier catalog: explicit load/reload lifecycle for the tier table
//!
//! The catalog reads the persisted document through a [`TierSource`], falls
//! back to the compiled-in table when the document is missing or invalid, and
//! caches the result as an immutable [`TierSnapshot`]. Readers hold an `Arc`
//! to the snapshot they started with, so a concurrent reload never changes a
//! resolution midway.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::resolver::{resolve, resolve_level, BelowFirstTier};
use super::table::{TierChange, TierFamily, TierFamilyKind, TierTable};
use crate::domain::{Statistic, TierSource};
use crate::{ProgressionError, Result};

/// Default name of the persisted tier document
pub const DEFAULT_TIER_TABLE: &str = "leveling-api";

/// Where the active table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrigin {
    Persisted,
    Static,
}

/// Table used when the persisted document is unavailable
#[derive(Debug, Clone, Default)]
pub enum Fallback {
    /// Compiled-in `default_tiers.json`
    #[default]
    Static,
    Custom(TierTable),
    /// No fallback; a missing document is a configuration error
    Disabled,
}

/// One loaded, immutable version of the tier table
#[derive(Debug, Clone)]
pub struct TierSnapshot {
    pub table: TierTable,
    pub origin: TierOrigin,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub below_first_tier: BelowFirstTier,
}

impl TierSnapshot {
    pub fn new(table: TierTable, origin: TierOrigin, below_first_tier: BelowFirstTier) -> Result<Self> {
        let fingerprint = table.fingerprint()?;
        Ok(Self {
            table,
            origin,
            fingerprint,
            loaded_at: Utc::now(),
            below_first_tier,
        })
    }

    fn resolve_family(&self, experience: u64, family: &TierFamily, kind: TierFamilyKind) -> Statistic {
        resolve(
            experience,
            &family.bounds,
            &family.labels,
            kind.terminal_sentinel(),
            self.below_first_tier,
        )
    }

    pub fn level(&self, experience: u64) -> Statistic {
        resolve_level(experience, &self.table.levels)
    }

    pub fn prestige(&self, experience: u64) -> Statistic {
        self.resolve_family(experience, &self.table.prestiges, TierFamilyKind::Prestige)
    }

    pub fn league(&self, experience: u64) -> Statistic {
        self.resolve_family(experience, &self.table.leagues, TierFamilyKind::League)
    }

    pub fn boost(&self, experience: u64) -> Statistic {
        self.resolve_family(experience, &self.table.boosts, TierFamilyKind::Boost)
    }
}

/// Cached tier configuration owned by the engine
pub struct TierCatalog {
    source: Arc<dyn TierSource>,
    name: String,
    fallback: Fallback,
    below_first_tier: BelowFirstTier,
    current: RwLock<Option<Arc<TierSnapshot>>>,
}

impl TierCatalog {
    /// Catalog reading `name` from `source` with the static fallback
    pub fn new(source: Arc<dyn TierSource>, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            fallback: Fallback::Static,
            below_first_tier: BelowFirstTier::default(),
            current: RwLock::new(None),
        }
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_below_first_tier(mut self, policy: BelowFirstTier) -> Self {
        self.below_first_tier = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot without triggering a load
    pub fn cached(&self) -> Option<Arc<TierSnapshot>> {
        self.current.read().clone()
    }

    /// Active snapshot, loading it on first use
    pub async fn current(&self) -> Result<Arc<TierSnapshot>> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let (snapshot, _) = self.refresh().await?;
        Ok(snapshot)
    }

    /// Re-read the source and swap the snapshot
    ///
    /// # Returns
    ///
    /// Families that changed against the previous snapshot (all of them on
    /// the first load)
    pub async fn reload(&self) -> Result<Vec<TierChange>> {
        let (_, changes) = self.refresh().await?;
        Ok(changes)
    }

    /// Validate, persist, then reload `table`
    pub async fn publish(&self, table: &TierTable) -> Result<Vec<TierChange>> {
        table.validate()?;
        let document = table.to_json()?;

        if !self.source.save_tier_table(&self.name, &document).await? {
            return Err(ProgressionError::database(format!(
                "Tier table '{}' was not saved",
                self.name
            )));
        }
        info!(name = %self.name, "tier table published");

        self.reload().await
    }

    async fn refresh(&self) -> Result<(Arc<TierSnapshot>, Vec<TierChange>)> {
        let (table, origin) = match self.source.load_tier_table(&self.name).await? {
            Some(document) => match TierTable::from_json(&document) {
                Ok(table) => (table, TierOrigin::Persisted),
                Err(err) => {
                    warn!(name = %self.name, error = %err, "persisted tier table rejected, using fallback");
                    (self.fallback_table()?, TierOrigin::Static)
                }
            },
            None => {
                warn!(name = %self.name, "no persisted tier table, using fallback");
                (self.fallback_table()?, TierOrigin::Static)
            }
        };

        let snapshot = Arc::new(TierSnapshot::new(table, origin, self.below_first_tier)?);
        let previous = self.cached();
        let changes = snapshot
            .table
            .changes_from(previous.as_ref().map(|p| &p.table))?;

        *self.current.write() = Some(Arc::clone(&snapshot));

        info!(
            name = %self.name,
            origin = ?snapshot.origin,
            fingerprint = %snapshot.fingerprint,
            changed = changes.len(),
            "tier table loaded"
        );
        for change in &changes {
            debug!(family = %change.family, "tier family changed");
        }

        Ok((snapshot, changes))
    }

    fn fallback_table(&self) -> Result<TierTable> {
        match &self.fallback {
            Fallback::Static => TierTable::fallback(),
            Fallback::Custom(table) => {
                table.validate()?;
                Ok(table.clone())
            }
            Fallback::Disabled => Err(ProgressionError::configuration(format!(
                "Tier table '{}' is missing from both persisted and static sources",
                self.name
            ))),
        }
    }
}
