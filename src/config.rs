// In: src/config.rs

//! The single source of truth for all pbtable codec configuration.
//!
//! `CodecConfig` is created once at the application boundary (e.g., from a JSON
//! document or Python keyword arguments) and then passed down through the engine
//! as a shared, read-only `Arc<CodecConfig>`. None of these settings change the
//! wire format; they only tighten validation or opt into extra bookkeeping.

use serde::{Deserialize, Serialize};

use crate::error::PbTableError;

/// The unified configuration for encode, decode, get, and add operations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// If true, per-column statistics are computed from the row data at encode
    /// time and stored in the header. If false, any statistics already present
    /// on the caller's column definitions are passed through untouched.
    #[serde(default = "default_true")]
    pub compute_stats: bool,

    /// If true, column names must be non-empty and unique within a header.
    #[serde(default)]
    pub strict_header: bool,

    /// Upper bound on a single record's declared length. A length prefix above
    /// this is treated as buffer corruption rather than an allocation request.
    #[serde(default = "default_max_record_len")]
    pub max_record_len: usize,

    /// If true, `add` rewrites the header record so that statistics and the row
    /// count cover the appended rows. Existing row records are copied verbatim.
    #[serde(default)]
    pub refresh_header_on_append: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compute_stats: true,
            strict_header: false,
            max_record_len: default_max_record_len(),
            refresh_header_on_append: false,
        }
    }
}

impl CodecConfig {
    /// Parses a configuration from a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PbTableError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Helper for `serde` to provide a default for `max_record_len` (64 MiB).
fn default_max_record_len() -> usize {
    64 * 1024 * 1024
}
