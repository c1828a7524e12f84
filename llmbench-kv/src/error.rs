//! Error types for key-value storage.

/// Error type for key-value operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from libSQL.
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    /// A stored entry could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for key-value operations.
pub type Result<T> = std::result::Result<T, Error>;
