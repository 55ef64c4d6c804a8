//! Domain layer
//!
//! # Domain Models
//!
//! - `GuildRecord`: per-guild experience (total + artificial)
//! - `GlobalRecord`: cross-guild experience
//! - `Statistic`: `{current, next, remaining}` within one tier family
//! - `GuildProfile` / `GlobalProfile`: records joined with their statistics
//!
//! # Port Traits
//!
//! - `RecordStore`: record persistence
//! - `TierSource`: persisted tier table documents

pub mod models;
pub mod ports;

pub use models::{
    apply_delta, ExperienceUpdate, GlobalProfile, GlobalRecord, GuildProfile, GuildRecord, Label,
    ProgressionRecord, Remaining, Scope, Statistic, EXPERIENCE_CEILING,
};
pub use ports::{RecordStore, TierSource};
