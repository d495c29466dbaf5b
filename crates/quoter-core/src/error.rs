//! Error types for quoter-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid book: {0}")]
    InvalidBook(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
