//! # Reconciliation Error Types Module
//!
//! This module defines the error types used throughout the reconciliation pipeline.
//!
//! Most "failures" in this domain are not errors at all: an unparseable quantity
//! resolves to a numeric default and a missing catalog match is a plain `None`.
//! The variants below cover the cases that must be surfaced to the caller.

use thiserror::Error;

/// Errors raised by the reconciliation pipeline
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A source record is missing required fields; the record is skipped
    #[error("Malformed record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    /// The nutrient catalog could not be loaded; fatal at batch start
    #[error("Catalog load error: {0}")]
    CatalogLoad(String),

    /// Configuration values are inconsistent or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source data could not be decoded at all
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an input file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    /// Build a malformed-record error for the given record identifier
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ReconcileError::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error only invalidates a single record (batch continues)
    pub fn is_record_local(&self) -> bool {
        matches!(self, ReconcileError::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
