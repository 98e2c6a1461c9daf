//! Unified error types for the traccia core.

use tokio_rusqlite::rusqlite;

/// Unified error type for store, reconciliation and sync operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., zero quantity, empty description).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// No order with the requested id.
    #[error("ORDER_NOT_FOUND: {0}")]
    OrderNotFound(i64),

    /// Mailbox I/O failed (connect, select, fetch). Aborts the current sync
    /// pass; mutations already persisted stay applied.
    #[error("MAILBOX_ERROR: {0}")]
    Mailbox(String),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("quantity must be at least 1".to_string());
        assert!(err.to_string().contains("INVALID_INPUT"));
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn test_mailbox_error_display() {
        let err = Error::Mailbox("connection reset".to_string());
        assert!(err.to_string().contains("MAILBOX_ERROR"));
    }
}
