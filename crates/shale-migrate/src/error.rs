//! Error types for the migration tooling.

use thiserror::Error;

/// Result type for migration tooling operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Errors that can occur around migration execution and persistence.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Error from the pure schema engine.
    #[error("Schema error: {0}")]
    Core(#[from] shale_core::error::Error),

    /// Database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error reading or writing snapshot/artifact files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A migration id was expected in the history or artifact store but
    /// was not found.
    #[error("Migration not found: {id}")]
    MigrationNotFound {
        /// The missing migration id.
        id: String,
    },
}
