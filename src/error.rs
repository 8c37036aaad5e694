// In: src/error.rs

//! This module defines the single, unified error type for the entire pbtable library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::fmt;
use thiserror::Error;

/// The part of a buffer that was being processed when a format error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Row,
    Index,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Header => "header",
            Phase::Row => "row",
            Phase::Index => "index",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PbTableError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// The caller's table object is structurally malformed.
    #[error("Invalid table: {0}")]
    Validation(String),

    /// A column definition cannot be turned into a row schema.
    #[error("Schema derivation failed: {0}")]
    Schema(String),

    /// A row's values do not satisfy the derived row schema.
    #[error("Row {row} could not be encoded: {reason}")]
    Encoding { row: usize, reason: String },

    /// The buffer is corrupt or truncated.
    #[error("Corrupt buffer while reading {phase} at byte {offset}: {reason}")]
    Format {
        phase: Phase,
        offset: usize,
        reason: String,
    },

    #[error("Requested row {requested} but the buffer only contains {available} rows")]
    NotFound { requested: usize, available: usize },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from file I/O, e.g. opening a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading a table or config document.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl PbTableError {
    pub(crate) fn format(phase: Phase, offset: usize, reason: impl Into<String>) -> Self {
        PbTableError::Format {
            phase,
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(row: usize, reason: impl Into<String>) -> Self {
        PbTableError::Encoding {
            row,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

#[cfg(feature = "python")]
impl From<PbTableError> for pyo3::PyErr {
    fn from(err: PbTableError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_phase() {
        let err = PbTableError::format(Phase::Index, 17, "unexpected tag 0x12");
        assert_eq!(
            err.to_string(),
            "Corrupt buffer while reading index at byte 17: unexpected tag 0x12"
        );
    }

    #[test]
    fn test_not_found_reports_available_rows() {
        let err = PbTableError::NotFound {
            requested: 3,
            available: 3,
        };
        assert!(err.to_string().contains("only contains 3 rows"));
    }
}
