// In: src/bridge/stateless_api.rs

//! The free-function API. Every call uses `CodecConfig::default()`; callers that
//! need other settings go through `TableCodec`.

use crate::bridge::codec::TableCodec;
use crate::bridge::format::BufferSummary;
use crate::error::PbTableError;
use crate::types::{Row, RowRequest, RowSelection, Table};

/// Encodes a table whose rows are positional arrays.
pub fn encode(table: &Table) -> Result<Vec<u8>, PbTableError> {
    TableCodec::default().encode(table)
}

/// Decodes a buffer into a table with positional array rows.
pub fn decode(bytes: &[u8]) -> Result<Table, PbTableError> {
    TableCodec::default().decode(bytes)
}

/// Encodes a table whose rows are objects keyed by column name.
pub fn encode_verbose(table: &Table) -> Result<Vec<u8>, PbTableError> {
    TableCodec::default().encode_verbose(table)
}

/// Decodes a buffer into a table with rows keyed by column name.
pub fn decode_verbose(bytes: &[u8]) -> Result<Table, PbTableError> {
    TableCodec::default().decode_verbose(bytes)
}

/// Decodes only the requested rows: `get(&buf, 1)` or `get(&buf, vec![2, 0])`.
pub fn get(bytes: &[u8], request: impl Into<RowRequest>) -> Result<RowSelection, PbTableError> {
    TableCodec::default().get(bytes, request)
}

pub fn get_verbose(
    bytes: &[u8],
    request: impl Into<RowRequest>,
) -> Result<RowSelection, PbTableError> {
    TableCodec::default().get_verbose(bytes, request)
}

/// Appends positional array rows to an encoded buffer.
pub fn add(bytes: &[u8], rows: &[Row]) -> Result<Vec<u8>, PbTableError> {
    TableCodec::default().add(bytes, rows)
}

pub fn add_verbose(bytes: &[u8], rows: &[Row]) -> Result<Vec<u8>, PbTableError> {
    TableCodec::default().add_verbose(bytes, rows)
}

/// Byte offsets of every row record, for external caching and seeking.
pub fn get_index(bytes: &[u8]) -> Result<Vec<usize>, PbTableError> {
    TableCodec::default().get_index(bytes)
}

/// Analyzes a buffer without decoding any row.
pub fn analyze_buffer(bytes: &[u8]) -> Result<BufferSummary, PbTableError> {
    TableCodec::default().analyze(bytes)
}

/// Runs `op` and hands its result to `callback` before returning.
///
/// The callback fires synchronously, exactly once, with either the error or the
/// value.
///
/// ```
/// use pbtable::bridge::{encode, with_callback};
/// use pbtable::Table;
///
/// let table = Table::from_json(r#"{"header":[{"name":"n","type":"uint"}],"data":[[1]]}"#).unwrap();
/// let mut size = 0;
/// with_callback(|| encode(&table), |result| size = result.map_or(0, |b| b.len()));
/// assert!(size > 0);
/// ```
pub fn with_callback<T, Op, Cb>(op: Op, callback: Cb)
where
    Op: FnOnce() -> Result<T, PbTableError>,
    Cb: FnOnce(Result<T, PbTableError>),
{
    callback(op())
}
