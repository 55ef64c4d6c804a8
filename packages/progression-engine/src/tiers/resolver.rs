//! Tier resolvers
//!
//! - [`resolve`]: generic boundary walk used by Prestige, League and Boost
//! - [`resolve_level`]: three-band level counting with the base-band cycle
//!
//! Boundaries are inclusive lower bounds: `value >= bound` occupies the tier.

use serde::{Deserialize, Serialize};

use super::table::{LevelBand, LevelSets, TierFamilyKind, BASE_CYCLE, LEVEL_CAP};
use crate::domain::{Label, Statistic};

/// Label used for values below the first boundary
pub const UNTIERED_LABEL: &str = "Unranked";

/// What `current` becomes when the value sits below the first boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowFirstTier {
    /// Explicit "Unranked" label
    #[default]
    Untiered,
    /// Reuse the last label (legacy negative-index behaviour)
    WrapToLast,
}

/// Resolve `value` against ascending `bounds` with lock-step `labels`
///
/// # Examples
///
/// ```rust
/// use progression_engine::domain::{Label, Remaining};
/// use progression_engine::tiers::{resolve, BelowFirstTier};
///
/// let labels = vec![Label::text("Bronze"), Label::text("Silver")];
/// let stat = resolve(150, &[100, 200], &labels, "Max!", BelowFirstTier::Untiered);
///
/// assert_eq!(stat.current, Label::text("Bronze"));
/// assert_eq!(stat.next, Label::text("Silver"));
/// assert_eq!(stat.remaining, Remaining::Points(50));
/// ```
pub fn resolve(
    value: u64,
    bounds: &[u64],
    labels: &[Label],
    terminal: &str,
    below_first: BelowFirstTier,
) -> Statistic {
    let mut pos: Option<usize> = None;
    let mut remaining = None;

    for (index, &bound) in bounds.iter().enumerate() {
        if value >= bound {
            pos = Some(index);
        } else {
            remaining = Some(bound - value);
            break;
        }
    }

    let current = match pos {
        Some(index) => labels.get(index).cloned(),
        None => match below_first {
            BelowFirstTier::Untiered => None,
            BelowFirstTier::WrapToLast => labels.last().cloned(),
        },
    }
    .unwrap_or_else(|| Label::text(UNTIERED_LABEL));

    let next_index = pos.map_or(0, |index| index + 1);
    match (labels.get(next_index), remaining) {
        (Some(next), Some(remaining)) => Statistic::progressing(current, next.clone(), remaining),
        _ => Statistic::terminal(current, terminal),
    }
}

/// Resolve a raw experience total into a level statistic
///
/// Base-band experience is reduced modulo [`BASE_CYCLE`]; master and elite
/// use the raw value. Counting stops at [`LEVEL_CAP`].
pub fn resolve_level(experience: u64, sets: &LevelSets) -> Statistic {
    let band = LevelBand::for_experience(experience);
    let normalized = match band {
        LevelBand::Base => experience % BASE_CYCLE,
        LevelBand::Master | LevelBand::Elite => experience,
    };

    let mut level = 0usize;
    let mut remaining = None;
    for &bound in sets.for_band(band) {
        if level == LEVEL_CAP {
            break;
        }
        if normalized >= bound {
            level += 1;
        } else {
            remaining = Some(bound - normalized);
            break;
        }
    }

    tracing::trace!(experience, band = band.as_str(), level, "resolved level");

    let current = Label::Text(format!("Level {}", level));
    match remaining {
        Some(remaining) if level < LEVEL_CAP => Statistic::progressing(
            current,
            Label::Text(format!("Level {}", level + 1)),
            remaining,
        ),
        _ => Statistic::terminal(current, TierFamilyKind::Level.terminal_sentinel()),
    }
}
