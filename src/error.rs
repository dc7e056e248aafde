//! Error types for MARC extraction and serialization.
//!
//! This module provides the [`MarcError`] type for all library operations
//! and the [`Result`] convenience type.
//!
//! Errors fall into two groups:
//! - build-time misconfiguration ([`MarcError::ConfigurationError`]), raised while
//!   constructing rules and never while processing records;
//! - per-record failures (extraction, encoding, decoding), surfaced synchronously
//!   to the caller of the rule that hit them.

use thiserror::Error;

/// Error type for all MARC library operations.
#[derive(Error, Debug)]
pub enum MarcError {
    /// A rule, field spec, translation map or rules file is misconfigured.
    ///
    /// Only raised while building rules.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field extractor failed while processing a record.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Error indicating an invalid or malformed MARC record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Error indicating an invalid leader (24-byte header).
    #[error("Invalid leader: {0}")]
    InvalidLeader(String),

    /// Error indicating an invalid field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Error during parsing or rendering of MARCXML or marc-in-json data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error indicating a truncated or incomplete record.
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MarcError {
    /// Returns true for errors raised while building rules.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, MarcError::ConfigurationError(_))
    }
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;
