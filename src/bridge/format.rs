// In: src/bridge/format.rs

//! Defines the on-buffer constants and the public summary structures for the
//! pbtable format. This is the single source of truth for the record envelope
//! that every row record is wrapped in.

use serde::{Deserialize, Serialize};

use crate::types::{ColumnDef, Meta};

//==================================================================================
// I. Record Envelope
//==================================================================================

/// Field number of the repeated `data` field in the row envelope message.
pub const ROW_ENVELOPE_FIELD: u32 = 1;

/// The first byte of every row record payload: field 1, length-delimited.
pub const ROW_RECORD_MARKER: u8 = ((ROW_ENVELOPE_FIELD as u8) << 3) | 2;

//==================================================================================
// II. Buffer Summary Contract
//==================================================================================

/// A cheap structural summary of an encoded buffer, produced without decoding
/// any row record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BufferSummary {
    /// Bytes taken by the header record, length prefix included.
    pub header_size: usize,
    /// Bytes taken by all row records.
    pub data_size: usize,
    pub total_size: usize,
    /// Number of row records actually present.
    pub row_count: usize,
    pub header: Vec<ColumnDef>,
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_marker_is_field_one_length_delimited() {
        assert_eq!(ROW_RECORD_MARKER, 0x0A);
    }
}
