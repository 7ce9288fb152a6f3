//! Error types for Quarry
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::ItemId;
use std::io;
use thiserror::Error;

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Quarry
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied malformed input (bad ids, non-array payloads, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An id referenced by an operation is not part of the current order
    #[error("Item not found: {id}")]
    NotFound {
        /// The id that could not be located
        id: ItemId,
    },

    /// I/O error (staging writes, reads, deletes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Staging store failure that is not a plain I/O error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A staged artifact failed validation while decoding
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read or parsed
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput(reason.into())
    }

    /// Shorthand for [`Error::Corruption`]
    pub fn corruption(reason: impl Into<String>) -> Self {
        Error::Corruption(reason.into())
    }

    /// True for failures of the staging storage layer.
    ///
    /// These are fatal to an index build; nothing is published.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Storage(_) | Error::Corruption(_) | Error::Serialization(_)
        )
    }

    /// True for caller input errors
    pub fn is_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// True when an id could not be located
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
