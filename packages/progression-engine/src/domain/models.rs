//! Progression domain models
//!
//! Plain typed records for both scopes plus the `Statistic` view produced by
//! the tier resolvers. Records are assembled through constructors only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProgressionError, Result};

// ═══════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════

/// Guild-scoped progression record
///
/// Unique key: `(guild_id, user_id)`.
///
/// # Invariant
///
/// `artificial_experience <= experience`: artificial gains are a subset of
/// total gains.
///
/// # Examples
///
/// ```rust
/// use progression_engine::domain::GuildRecord;
///
/// let record = GuildRecord::new(42, 7);
/// assert_eq!(record.experience, 0);
/// assert_eq!(record.artificial_experience, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    pub guild_id: u64,
    pub user_id: u64,
    pub experience: u64,
    pub artificial_experience: u64,
}

impl GuildRecord {
    /// Zeroed record for a fresh member
    pub fn new(guild_id: u64, user_id: u64) -> Self {
        Self {
            guild_id,
            user_id,
            experience: 0,
            artificial_experience: 0,
        }
    }

    pub fn with_experience(
        guild_id: u64,
        user_id: u64,
        experience: u64,
        artificial_experience: u64,
    ) -> Self {
        Self {
            guild_id,
            user_id,
            experience,
            artificial_experience,
        }
    }

    /// Check the artificial subset invariant and the storable range
    pub fn validate(&self) -> Result<()> {
        check_ceiling(
            self.experience,
            format_args!("(guild, user) - ({}, {})", self.guild_id, self.user_id),
        )?;
        if self.artificial_experience > self.experience {
            return Err(ProgressionError::invalid_record(format!(
                "Artificial experience {} exceeds total experience {} for (guild, user) - ({}, {})",
                self.artificial_experience, self.experience, self.guild_id, self.user_id
            )));
        }
        Ok(())
    }

    /// Apply an experience delta in place
    ///
    /// Totals saturate at zero; `artificial_experience` is clamped so it never
    /// exceeds `experience`.
    pub fn apply(&mut self, amount: i64, artificial: bool) {
        self.experience = apply_delta(self.experience, amount);
        if artificial {
            self.artificial_experience = apply_delta(self.artificial_experience, amount);
        }
        self.artificial_experience = self.artificial_experience.min(self.experience);
    }
}

/// Global-scoped progression record
///
/// Unique key: `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRecord {
    pub user_id: u64,
    pub experience: u64,
}

impl GlobalRecord {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            experience: 0,
        }
    }

    pub fn with_experience(user_id: u64, experience: u64) -> Self {
        Self {
            user_id,
            experience,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_ceiling(self.experience, format_args!("(user) - ({})", self.user_id))
    }

    pub fn apply(&mut self, amount: i64) {
        self.experience = apply_delta(self.experience, amount);
    }
}

/// Largest experience total any backend stores (SQLite INTEGER range)
pub const EXPERIENCE_CEILING: u64 = i64::MAX as u64;

/// Signed delta on an unsigned counter, saturating at 0 and [`EXPERIENCE_CEILING`]
pub fn apply_delta(value: u64, amount: i64) -> u64 {
    let moved = if amount >= 0 {
        value.saturating_add(amount.unsigned_abs())
    } else {
        value.saturating_sub(amount.unsigned_abs())
    };
    moved.min(EXPERIENCE_CEILING)
}

fn check_ceiling(experience: u64, key: fmt::Arguments<'_>) -> Result<()> {
    if experience > EXPERIENCE_CEILING {
        return Err(ProgressionError::invalid_record(format!(
            "Experience {} exceeds the storable maximum {} for {}",
            experience, EXPERIENCE_CEILING, key
        )));
    }
    Ok(())
}

/// Record scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Guild,
    Global,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Guild => "guild",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record of either scope, used for forced overwrites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ProgressionRecord {
    Guild(GuildRecord),
    Global(GlobalRecord),
}

impl ProgressionRecord {
    pub fn scope(&self) -> Scope {
        match self {
            ProgressionRecord::Guild(_) => Scope::Guild,
            ProgressionRecord::Global(_) => Scope::Global,
        }
    }

    /// Human-readable key, e.g. `(10, 20)` or `(20)`
    pub fn key(&self) -> String {
        match self {
            ProgressionRecord::Guild(r) => format!("({}, {})", r.guild_id, r.user_id),
            ProgressionRecord::Global(r) => format!("({})", r.user_id),
        }
    }
}

impl From<GuildRecord> for ProgressionRecord {
    fn from(record: GuildRecord) -> Self {
        ProgressionRecord::Guild(record)
    }
}

impl From<GlobalRecord> for ProgressionRecord {
    fn from(record: GlobalRecord) -> Self {
        ProgressionRecord::Global(record)
    }
}

/// One experience statement against a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceUpdate {
    Guild {
        guild_id: u64,
        user_id: u64,
        amount: i64,
        artificial: bool,
    },
    Global {
        user_id: u64,
        amount: i64,
    },
}

// ═══════════════════════════════════════════════════════════════════════════
// Statistics
// ═══════════════════════════════════════════════════════════════════════════

/// Tier label: a name ("Gold") or a numeric value (boost multiplier 1.25)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Number(f64),
    Text(String),
}

impl Label {
    pub fn text(value: impl Into<String>) -> Self {
        Label::Text(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Label::Number(n) => Some(*n),
            Label::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{}", n),
            Label::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

/// Distance to the next tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Remaining {
    /// Experience still needed
    Points(u64),
    /// No higher tier; carries no numeric meaning
    Terminal,
}

impl Remaining {
    pub fn points(&self) -> Option<u64> {
        match self {
            Remaining::Points(p) => Some(*p),
            Remaining::Terminal => None,
        }
    }
}

/// Position within one tier family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    /// Tier occupied now
    pub current: Label,
    /// Next tier, or the family's terminal sentinel when maxed
    pub next: Label,
    pub remaining: Remaining,
}

impl Statistic {
    pub fn progressing(current: Label, next: Label, remaining: u64) -> Self {
        Self {
            current,
            next,
            remaining: Remaining::Points(remaining),
        }
    }

    pub fn terminal(current: Label, sentinel: impl Into<String>) -> Self {
        Self {
            current,
            next: Label::Text(sentinel.into()),
            remaining: Remaining::Terminal,
        }
    }

    pub fn is_maxed(&self) -> bool {
        self.remaining == Remaining::Terminal
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Profiles
// ═══════════════════════════════════════════════════════════════════════════

/// Guild record with its Prestige and Level statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildProfile {
    pub record: GuildRecord,
    pub prestige: Statistic,
    pub level: Statistic,
}

/// Global record with its League and Boost statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalProfile {
    pub record: GlobalRecord,
    pub league: Statistic,
    pub boost: Statistic,
}
