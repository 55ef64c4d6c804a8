//! Error types for progression-engine

use std::fmt;
use thiserror::Error;

/// Progression error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Persistent store errors (SQLite, connectivity)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// Read against a key that has no record
    RecordNotFound,
    /// Attempted creation over an existing key
    UserOverwrite,
    /// Real experience grant without a guild context
    GlobalPermissions,
    /// Tier table missing or malformed, bad engine settings
    Configuration,
    /// Record violates a model invariant
    InvalidRecord,
    /// I/O errors
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::RecordNotFound => "record_not_found",
            ErrorKind::UserOverwrite => "user_overwrite",
            ErrorKind::GlobalPermissions => "global_permissions",
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidRecord => "invalid_record",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progression error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct ProgressionError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl ProgressionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRecord, message)
    }

    pub fn guild_record_not_found(guild_id: u64, user_id: u64) -> Self {
        Self::new(
            ErrorKind::RecordNotFound,
            format!("No record for (guild, user) - ({}, {})", guild_id, user_id),
        )
    }

    pub fn global_record_not_found(user_id: u64) -> Self {
        Self::new(
            ErrorKind::RecordNotFound,
            format!("No record for (user) - ({})", user_id),
        )
    }

    pub fn guild_overwrite(guild_id: u64, user_id: u64) -> Self {
        Self::new(
            ErrorKind::UserOverwrite,
            format!(
                "Cannot overwrite index (guild, user) - ({}, {})",
                guild_id, user_id
            ),
        )
    }

    pub fn global_overwrite(user_id: u64) -> Self {
        Self::new(
            ErrorKind::UserOverwrite,
            format!("Cannot overwrite index (user) - ({})", user_id),
        )
    }

    pub fn global_permissions(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GlobalPermissions, message)
    }

    /// Errors the caller is expected to handle (prompt, force-overwrite, create first).
    ///
    /// Store and configuration failures are not recoverable at this level.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UserOverwrite
                | ErrorKind::RecordNotFound
                | ErrorKind::GlobalPermissions
                | ErrorKind::InvalidRecord
        )
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for ProgressionError {
    fn from(err: rusqlite::Error) -> Self {
        ProgressionError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for ProgressionError {
    fn from(err: serde_json::Error) -> Self {
        ProgressionError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<serde_yaml::Error> for ProgressionError {
    fn from(err: serde_yaml::Error) -> Self {
        ProgressionError::serialization(format!("YAML error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for ProgressionError {
    fn from(err: std::io::Error) -> Self {
        ProgressionError::new(ErrorKind::Io, format!("IO error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProgressionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = ProgressionError::guild_overwrite(10, 20);
        let msg = format!("{}", err);
        assert_eq!(msg, "[user_overwrite] Cannot overwrite index (guild, user) - (10, 20)");
    }

    #[test]
    fn test_record_not_found_is_distinct() {
        let guild = ProgressionError::guild_record_not_found(1, 2);
        let global = ProgressionError::global_record_not_found(2);

        assert_eq!(guild.kind, ErrorKind::RecordNotFound);
        assert_eq!(global.kind, ErrorKind::RecordNotFound);
        assert!(guild.message.contains("(1, 2)"));
        assert!(global.message.contains("(2)"));
    }

    #[test]
    fn test_global_permissions_error() {
        let err = ProgressionError::global_permissions("You cannot edit global records");
        assert_eq!(err.kind, ErrorKind::GlobalPermissions);
        assert_eq!(
            err.to_string(),
            "[global_permissions] You cannot edit global records"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(ProgressionError::global_overwrite(1).is_recoverable());
        assert!(ProgressionError::global_record_not_found(1).is_recoverable());
        assert!(ProgressionError::global_permissions("x").is_recoverable());
        assert!(!ProgressionError::database("down").is_recoverable());
        assert!(!ProgressionError::configuration("no tiers").is_recoverable());
    }

    #[test]
    fn test_with_source() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ProgressionError::database("DB file missing").with_source(io_err);

        assert_eq!(err.kind, ErrorKind::Database);
        let source = err.source().unwrap();
        assert!(source.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Database.as_str(), "database");
        assert_eq!(ErrorKind::Serialization.as_str(), "serialization");
        assert_eq!(ErrorKind::RecordNotFound.as_str(), "record_not_found");
        assert_eq!(ErrorKind::UserOverwrite.as_str(), "user_overwrite");
        assert_eq!(ErrorKind::GlobalPermissions.as_str(), "global_permissions");
        assert_eq!(ErrorKind::Configuration.as_str(), "configuration");
        assert_eq!(ErrorKind::InvalidRecord.as_str(), "invalid_record");
        assert_eq!(ErrorKind::Io.as_str(), "io");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_error() {
        let err: ProgressionError = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json")
            .err()
            .unwrap();
        let err: ProgressionError = json_err.into();

        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(err.message.contains("JSON error"));
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(ProgressionError::global_record_not_found(7))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecordNotFound);
    }
}
