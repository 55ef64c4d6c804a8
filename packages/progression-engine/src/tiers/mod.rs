//! Tier tables and resolvers
//!
//! - `table`: tier table document, validation, static fallback, change lists
//! - `resolver`: boundary and level resolution into `Statistic`s
//! - `catalog`: cached snapshot with explicit load/reload

pub mod catalog;
pub mod resolver;
pub mod table;

pub use catalog::{Fallback, TierCatalog, TierOrigin, TierSnapshot, DEFAULT_TIER_TABLE};
pub use resolver::{resolve, resolve_level, BelowFirstTier, UNTIERED_LABEL};
pub use table::{
    LevelBand, LevelSets, TierChange, TierFamily, TierFamilyKind, TierTable, BASE_BAND_CEILING,
    BASE_CYCLE, LEVEL_CAP, MASTER_BAND_CEILING,
};
