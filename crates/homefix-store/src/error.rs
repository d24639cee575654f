//! Error types for homefix-store

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum Error {
    /// Query or connection failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored JSON could not be written or read back
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored column holds a value that does not parse
    #[error("corrupt {column} value {value:?}")]
    Corrupt {
        /// Column name
        column: &'static str,
        /// Raw stored text
        value: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
