//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row could not be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for keyward_core::Error {
    fn from(e: Error) -> Self {
        keyward_core::Error::Storage(e.to_string())
    }
}
