//! Unified error types for shellcache.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the cache store and the fetch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Request URL could not be parsed or resolved.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Network-level fetch failure (DNS, connect, TLS, read).
    #[error("http error: {0}")]
    HttpError(String),

    /// The server answered with a non-success status.
    #[error("http status {0}")]
    HttpStatus(u16),

    /// Fetch exceeded the configured timeout.
    #[error("fetch timeout: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured size limit.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),
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
