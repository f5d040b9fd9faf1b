//! Error types for AtlasTable
//!
//! Provides a unified error type for all operations.
//!
//! A missing row or a request whose columns are all absent is NOT an error:
//! those outcomes are reported through [`crate::filter::NamesLookup`].

use thiserror::Error;

/// Result type alias using AtlasError
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Unified error type for AtlasTable operations
#[derive(Debug, Error)]
pub enum AtlasError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // On-disk Integrity Errors
    // -------------------------------------------------------------------------
    #[error("Integrity error: {0}")]
    Integrity(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Unknown column family {table}/{cf}")]
    UnknownColumnFamily { table: String, cf: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    /// Shorthand for building an [`AtlasError::Integrity`]
    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        AtlasError::Integrity(msg.into())
    }

    /// True when the error points at on-disk corruption (or a locator bug)
    /// rather than at the environment or the caller.
    pub fn is_corruption(&self) -> bool {
        match self {
            AtlasError::Integrity(_) => true,
            AtlasError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
