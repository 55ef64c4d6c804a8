//! Tier table: boundary + label lists for the four tier families
//!
//! The persisted document and the compiled-in fallback share one JSON shape:
//!
//! ```json
//! {
//!   "Levels":    {"0": [...], "1": [...], "2": [...]},
//!   "Prestiges": {"Bounds": [...], "Names": [...]},
//!   "Leagues":   {"Bounds": [...], "Names": [...]},
//!   "Boosts":    {"Bounds": [...], "Values": [...]}
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::domain::Label;
use crate::{ProgressionError, Result};

/// Experience below this selects the base level set
pub const BASE_BAND_CEILING: u64 = 300_000;
/// Experience below this (and at least `BASE_BAND_CEILING`) selects the master set
pub const MASTER_BAND_CEILING: u64 = 1_000_000;
/// Base-band experience repeats on this cycle
pub const BASE_CYCLE: u64 = 50_000;
/// Highest reachable level within any set
pub const LEVEL_CAP: usize = 10;

const STATIC_TIERS: &str = include_str!("default_tiers.json");

/// Tier families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierFamilyKind {
    Level,
    Prestige,
    League,
    Boost,
}

impl TierFamilyKind {
    pub const ALL: [TierFamilyKind; 4] = [
        TierFamilyKind::Level,
        TierFamilyKind::Prestige,
        TierFamilyKind::League,
        TierFamilyKind::Boost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TierFamilyKind::Level => "level",
            TierFamilyKind::Prestige => "prestige",
            TierFamilyKind::League => "league",
            TierFamilyKind::Boost => "boost",
        }
    }

    /// Text shown in place of `next` once the family is maxed
    pub fn terminal_sentinel(&self) -> &'static str {
        match self {
            TierFamilyKind::Level => "Prestige Available Soon ...",
            TierFamilyKind::Prestige => "Max Prestige Reached!",
            TierFamilyKind::League => "Max League Achieved!",
            TierFamilyKind::Boost => "Max Boost Earned!",
        }
    }
}

impl fmt::Display for TierFamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level set selected by the raw experience band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBand {
    Base,
    Master,
    Elite,
}

impl LevelBand {
    pub fn for_experience(experience: u64) -> Self {
        if experience < BASE_BAND_CEILING {
            LevelBand::Base
        } else if experience < MASTER_BAND_CEILING {
            LevelBand::Master
        } else {
            LevelBand::Elite
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelBand::Base => "base",
            LevelBand::Master => "master",
            LevelBand::Elite => "elite",
        }
    }
}

/// Ascending boundaries with lock-step labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierFamily {
    #[serde(rename = "Bounds")]
    pub bounds: Vec<u64>,
    #[serde(rename = "Names")]
    pub labels: Vec<Label>,
}

impl TierFamily {
    pub fn new(bounds: Vec<u64>, labels: Vec<Label>) -> Self {
        Self { bounds, labels }
    }

    fn validate(&self, kind: TierFamilyKind) -> Result<()> {
        validate_bounds(kind.as_str(), &self.bounds)?;
        if self.labels.len() != self.bounds.len() {
            return Err(ProgressionError::configuration(format!(
                "Tier family '{}' has {} boundaries but {} labels",
                kind,
                self.bounds.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }
}

/// The three level sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSets {
    #[serde(rename = "0")]
    pub base: Vec<u64>,
    #[serde(rename = "1")]
    pub master: Vec<u64>,
    #[serde(rename = "2")]
    pub elite: Vec<u64>,
}

impl LevelSets {
    pub fn for_band(&self, band: LevelBand) -> &[u64] {
        match band {
            LevelBand::Base => &self.base,
            LevelBand::Master => &self.master,
            LevelBand::Elite => &self.elite,
        }
    }

    fn validate(&self) -> Result<()> {
        validate_bounds("level.base", &self.base)?;
        validate_bounds("level.master", &self.master)?;
        validate_bounds("level.elite", &self.elite)?;

        // Base experience is reduced modulo the cycle before counting.
        if let Some(&last) = self.base.last() {
            if last >= BASE_CYCLE {
                return Err(ProgressionError::configuration(format!(
                    "Base level boundary {} is unreachable inside the {} cycle",
                    last, BASE_CYCLE
                )));
            }
        }
        Ok(())
    }
}

/// Immutable tier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(rename = "Levels")]
    pub levels: LevelSets,
    #[serde(rename = "Prestiges")]
    pub prestiges: TierFamily,
    #[serde(rename = "Leagues")]
    pub leagues: TierFamily,
    #[serde(rename = "Boosts", with = "boost_values")]
    pub boosts: TierFamily,
}

impl TierTable {
    /// Parse and validate a JSON document
    pub fn from_json(document: &str) -> Result<Self> {
        let table: TierTable = serde_json::from_str(document)?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The compiled-in table used when no persisted document is available
    pub fn fallback() -> Result<Self> {
        Self::from_json(STATIC_TIERS).map_err(|err| {
            ProgressionError::configuration(format!("Static tier table is invalid: {}", err))
                .with_source(err)
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.levels.validate()?;
        self.prestiges.validate(TierFamilyKind::Prestige)?;
        self.leagues.validate(TierFamilyKind::League)?;
        self.boosts.validate(TierFamilyKind::Boost)?;
        Ok(())
    }

    /// SHA-256 of the canonical JSON form, hex encoded
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&canonical);
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    fn family_value(&self, kind: TierFamilyKind) -> Result<serde_json::Value> {
        let value = match kind {
            TierFamilyKind::Level => serde_json::to_value(&self.levels)?,
            TierFamilyKind::Prestige => serde_json::to_value(&self.prestiges)?,
            TierFamilyKind::League => serde_json::to_value(&self.leagues)?,
            TierFamilyKind::Boost => {
                serde_json::to_value(boost_values::BoostShape::from(&self.boosts))?
            }
        };
        Ok(value)
    }

    /// Families that differ from `previous`
    ///
    /// With no previous table every family is reported as fresh.
    pub fn changes_from(&self, previous: Option<&TierTable>) -> Result<Vec<TierChange>> {
        let mut changes = Vec::new();
        for kind in TierFamilyKind::ALL {
            let after = self.family_value(kind)?;
            let before = match previous {
                Some(prev) => Some(prev.family_value(kind)?),
                None => None,
            };
            if before.as_ref() != Some(&after) {
                changes.push(TierChange {
                    family: kind,
                    before,
                    after,
                });
            }
        }
        Ok(changes)
    }
}

/// One changed tier family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierChange {
    pub family: TierFamilyKind,
    /// None when the family was not set before
    pub before: Option<serde_json::Value>,
    pub after: serde_json::Value,
}

fn validate_bounds(family: &str, bounds: &[u64]) -> Result<()> {
    if bounds.is_empty() {
        return Err(ProgressionError::configuration(format!(
            "Tier family '{}' has no boundaries",
            family
        )));
    }
    if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ProgressionError::configuration(format!(
            "Tier family '{}' boundaries are not strictly increasing at {} -> {}",
            family, pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Boosts are stored with a `Values` key instead of `Names`
mod boost_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::TierFamily;
    use crate::domain::Label;

    #[derive(Serialize, Deserialize)]
    pub(super) struct BoostShape {
        #[serde(rename = "Bounds")]
        bounds: Vec<u64>,
        #[serde(rename = "Values")]
        values: Vec<Label>,
    }

    impl From<&TierFamily> for BoostShape {
        fn from(family: &TierFamily) -> Self {
            Self {
                bounds: family.bounds.clone(),
                values: family.labels.clone(),
            }
        }
    }

    pub fn serialize<S: Serializer>(family: &TierFamily, serializer: S) -> Result<S::Ok, S::Error> {
        BoostShape::from(family).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TierFamily, D::Error> {
        let shape = BoostShape::deserialize(deserializer)?;
        Ok(TierFamily::new(shape.bounds, shape.values))
    }
}
