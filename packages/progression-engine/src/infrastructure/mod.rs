//! Infrastructure layer - Storage adapters
//!
//! - `memory_store`: HashMap tables, always available
//! - `sqlite_store`: rusqlite adapter (feature `sqlite`)

pub mod memory_store;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use memory_store::InMemoryProgressionStore;

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteProgressionStore;
