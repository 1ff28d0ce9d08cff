//! Error types for daylog-core

use thiserror::Error;

/// Result type alias using daylog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in daylog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote persistence could not complete a fetch or write
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Referenced entry, share token or comment thread does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A mutating operation ran without a signed-in session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from the remote side and leaves local state intact.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::Database(_) | Self::LibSql(_)
        )
    }
}
