//! Crate-wide error types.
//!
//! Follows the host convention of one root error enum with a variant per
//! layer (configuration, contract, sink I/O) rather than a grab-bag of
//! `String`s.

use thiserror::Error;

/// Configuration errors, produced while building a [`crate::config::TreeBufferConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history must be greater than zero")]
    ZeroHistory,

    #[error("unrecognized algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Root error type for the tree-buffer engine.
#[derive(Debug, Error)]
pub enum TreeBufferError {
    /// Invalid construction parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A precondition of a public operation was violated (stale handle, inactive
    /// node, handle from a different tree, ...). The engine does not attempt to
    /// repair the tree afterwards.
    #[error("precondition violation: {0}")]
    PreconditionViolation(String),

    /// The statistics sink rejected a write.
    #[error("statistics sink error: {0}")]
    Stats(#[from] std::io::Error),
}

/// Result type alias using [`TreeBufferError`].
pub type Result<T> = std::result::Result<T, TreeBufferError>;

impl TreeBufferError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionViolation(msg.into())
    }
}
