//! Unified error types for the site registry.
//!
//! A lookup miss is not an error: lookups return `Option<Site>`. The variants
//! here cover programming errors (no current site), invalid input and
//! backend failures.

use tokio_rusqlite::rusqlite;

/// Unified error types for the site registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The current site was read outside a site context.
    #[error("NO_CURRENT_SITE: this request/process is not inside a subsite")]
    NoCurrentSite,

    /// Invalid input (e.g., missing required fields on create).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Text-encoded field could not be decoded, or a cache value could not be encoded.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),

    /// Persistence backend failed (not a miss).
    #[error("STORE_ERROR: {0}")]
    Store(String),

    /// Document subsystem failed (not a miss).
    #[error("DOCUMENT_ERROR: {0}")]
    Document(String),

    /// Cache database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
