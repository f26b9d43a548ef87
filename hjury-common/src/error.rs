//! Common error types for hjury

use thiserror::Error;

/// Common result type for hjury operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by hjury services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (or not owned by the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the resource's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error is SQLite reporting a busy/locked database
    pub fn is_database_locked(&self) -> bool {
        match self {
            #[cfg(feature = "sqlx")]
            Error::Database(db_err) => {
                let msg = db_err.to_string();
                msg.contains("database is locked") || msg.contains("database table is locked")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = Error::Conflict("session already completed".to_string());
        assert_eq!(err.to_string(), "Conflict: session already completed");
    }

    #[test]
    fn test_non_database_error_is_not_locked() {
        assert!(!Error::Internal("database is locked".to_string()).is_database_locked());
    }
}
