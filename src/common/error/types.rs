//! Unified error types for delimtab.
//!
//! Data-shape problems (ragged rows, unterminated enclosures, oversized
//! cells) are not errors here; they are handled permissively by the reader
//! and reported through return values. This type covers I/O failures and
//! contradictory configuration.
use thiserror::Error;

/// Main error type for delimtab operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Format definition or reader options contradict each other
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A persisted setting could not be interpreted
    #[error("Invalid setting '{key}': {value:?}")]
    InvalidSetting { key: String, value: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidSetting`].
    pub(crate) fn invalid_setting(key: &str, value: &str) -> Self {
        Error::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result type for delimtab operations.
pub type Result<T> = std::result::Result<T, Error>;
