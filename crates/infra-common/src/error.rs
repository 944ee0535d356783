//! Error types for infrastructure operations.

use thiserror::Error;

/// Errors raised by the infrastructure layer itself.
///
/// Logging setup swallows a benign double-initialization, so the only
/// failure this layer reports is a bad configuration value.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;
