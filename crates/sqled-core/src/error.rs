//! Error types for SQLed

use thiserror::Error;

/// Core error type for SQLed operations
#[derive(Error, Debug)]
pub enum SqledError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for SQLed operations
pub type Result<T> = std::result::Result<T, SqledError>;
