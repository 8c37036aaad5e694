// In: src/engine/orchestrator.rs

//! The table engine: composes the header codec, row codec, and buffer scanner
//! into the whole-buffer operations.
//!
//! Every function here is pure: it takes an in-memory table or buffer plus a
//! read-only config and returns a new value. Nothing is cached between calls;
//! the row schema is re-derived from the header each time.

use crate::bridge::format::BufferSummary;
use crate::codec::{
    decode_header, decode_records_at, encode_header, index_records, RecordScanner, RowCodec,
    TableHeader,
};
use crate::config::CodecConfig;
use crate::error::PbTableError;
use crate::kernels::stats::{compute_column_stats, merge_column_stats};
use crate::schema::validate_header;
use crate::types::{ColumnDef, Row, RowFormat, RowRequest, RowSelection, Table, Value};

//==================================================================================
// 1. Validation Helpers
//==================================================================================

fn validate_columns(header: &[ColumnDef], config: &CodecConfig) -> Result<(), PbTableError> {
    if header.is_empty() {
        return Err(PbTableError::Validation("header has no columns".into()));
    }
    if config.strict_header {
        validate_header(header)?;
    }
    Ok(())
}

/// Rejects rows whose in-memory shape does not match the operation's format
/// before any of them is encoded.
fn validate_row_shapes(rows: &[Row], format: RowFormat) -> Result<(), PbTableError> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.format() != format) {
        let (found, expected) = match row.format() {
            RowFormat::Array => ("an array", "objects keyed by column name"),
            RowFormat::Verbose => ("an object", "positional arrays"),
        };
        return Err(PbTableError::Validation(format!(
            "row {} is {} but this operation expects {}",
            i, found, expected
        )));
    }
    Ok(())
}

fn shape_rows(header: &[ColumnDef], rows: Vec<Vec<Value>>, format: RowFormat) -> Vec<Row> {
    rows.into_iter()
        .map(|values| Row::from_values(values, header, format))
        .collect()
}

/// Encodes `rows` after `out`, chaining each row to the previous one of the
/// same batch. `first_row` is the buffer position of `rows[0]`, so errors name
/// rows the way `get` addresses them.
fn encode_rows(
    codec: &RowCodec,
    rows: &[Vec<Value>],
    first_row: usize,
    out: &mut Vec<u8>,
) -> Result<(), PbTableError> {
    for (i, values) in rows.iter().enumerate() {
        let previous = i.checked_sub(1).map(|p| rows[p].as_slice());
        codec.encode_row(values, previous, first_row + i, out)?;
    }
    Ok(())
}

//==================================================================================
// 2. Public Orchestration API
//==================================================================================

/// Encodes a whole table: one header record followed by one record per row.
///
/// Encoding is atomic. Structural problems are reported before anything is
/// written, and the first row that cannot be encoded aborts the operation.
pub fn encode_table(
    table: &Table,
    format: RowFormat,
    config: &CodecConfig,
) -> Result<Vec<u8>, PbTableError> {
    // 1. Fail fast on structure.
    validate_columns(&table.header, config)?;
    validate_row_shapes(&table.data, format)?;
    let codec = RowCodec::new(&table.header)?.with_max_record_len(config.max_record_len);

    // 2. Normalize rows to header order once; stats and encoding share them.
    let rows = table
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| codec.row_values(row, i))
        .collect::<Result<Vec<_>, _>>()?;

    // 3. Header record, with stats and row count.
    let header = TableHeader::for_rows(&table.header, table.meta.as_ref(), &rows, config);
    let mut out = Vec::new();
    encode_header(&header, config.max_record_len, &mut out)?;
    let header_size = out.len();

    // 4. Row records.
    encode_rows(&codec, &rows, 0, &mut out)?;

    log::debug!(
        "encoded {} rows into {} bytes ({} header)",
        rows.len(),
        out.len(),
        header_size
    );
    log_metric!(
        "event" = "encode",
        "rows" = &rows.len(),
        "header_bytes" = &header_size,
        "total_bytes" = &out.len()
    );
    Ok(out)
}

/// Decodes a whole buffer, chaining each row's recovered values into the next
/// for sequence columns.
///
/// The returned `meta.row_count` is the number of rows actually decoded.
pub fn decode_table(
    bytes: &[u8],
    format: RowFormat,
    config: &CodecConfig,
) -> Result<Table, PbTableError> {
    let (header, start) = decode_header(bytes, config.max_record_len)?;
    let codec = RowCodec::new(&header.columns)?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in RecordScanner::new(bytes, start, config.max_record_len) {
        let record = record?;
        let values = codec.decode_row(record.payload, record.offset, rows.last().map(Vec::as_slice))?;
        rows.push(values);
    }

    let TableHeader { columns, mut meta } = header;
    if meta.row_count.is_some_and(|n| n != rows.len() as u64) {
        log::debug!(
            "header row count {:?} differs from the {} rows present",
            meta.row_count,
            rows.len()
        );
    }
    meta.row_count = Some(rows.len() as u64);

    log_metric!("event" = "decode", "rows" = &rows.len(), "bytes" = &bytes.len());
    let data = shape_rows(&columns, rows, format);
    Ok(Table {
        header: columns,
        meta: Some(meta),
        data,
    })
}

/// Decodes only the requested rows, skipping the others without decoding them.
pub fn get_rows(
    bytes: &[u8],
    request: &RowRequest,
    format: RowFormat,
    config: &CodecConfig,
) -> Result<RowSelection, PbTableError> {
    let (header, start) = decode_header(bytes, config.max_record_len)?;
    let codec = RowCodec::new(&header.columns)?;

    let rows = decode_records_at(bytes, start, &codec, request.indices(), config.max_record_len)?;
    log_metric!("event" = "get", "requested" = &request.indices().len());

    let mut rows = shape_rows(&header.columns, rows, format);
    Ok(match request {
        RowRequest::One(idx) => RowSelection::One(rows.pop().ok_or_else(|| {
            PbTableError::Internal(format!("row {} was located but not returned", idx))
        })?),
        RowRequest::Many(_) => RowSelection::Many(rows),
    })
}

/// Appends rows to an existing buffer under its stored header.
///
/// Row errors name the row by its position in the extended buffer.
///
/// By default the original bytes are kept as they are and the new row records
/// are concatenated after them. With `refresh_header_on_append`, the header
/// record is rewritten so its statistics and row count cover the appended rows,
/// and the existing row records are copied after it unchanged.
pub fn append_rows(
    bytes: &[u8],
    rows: &[Row],
    format: RowFormat,
    config: &CodecConfig,
) -> Result<Vec<u8>, PbTableError> {
    let (header, start) = decode_header(bytes, config.max_record_len)?;
    let codec = RowCodec::new(&header.columns)?.with_max_record_len(config.max_record_len);

    if let Some(col) = header.columns.iter().find(|c| c.is_sequence()) {
        log::warn!(
            "refusing to append to a buffer with sequence column '{}'",
            col.name
        );
        return Err(PbTableError::UnsupportedOperation(format!(
            "cannot append rows: column '{}' stores deltas from the previous row and the \
             delta base of the first appended row is unknown; re-encode the whole table instead",
            col.name
        )));
    }

    validate_row_shapes(rows, format)?;
    let existing = index_records(bytes, start, config.max_record_len)?.len();
    let new_rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| codec.row_values(row, existing + i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut appended = Vec::new();
    encode_rows(&codec, &new_rows, existing, &mut appended)?;

    let mut out = if config.refresh_header_on_append {
        let refreshed = refresh_header(header, existing, &new_rows, config);
        let mut out = Vec::with_capacity(bytes.len() + appended.len());
        encode_header(&refreshed, config.max_record_len, &mut out)?;
        out.extend_from_slice(&bytes[start..]);
        out
    } else {
        let mut out = Vec::with_capacity(bytes.len() + appended.len());
        out.extend_from_slice(bytes);
        out
    };
    out.extend_from_slice(&appended);

    log::debug!(
        "appended {} rows ({} bytes) to a {} byte buffer",
        new_rows.len(),
        appended.len(),
        bytes.len()
    );
    log_metric!(
        "event" = "add",
        "rows" = &new_rows.len(),
        "appended_bytes" = &appended.len(),
        "refreshed_header" = &config.refresh_header_on_append
    );
    Ok(out)
}

/// Folds appended rows into the stored header's statistics and row count.
fn refresh_header(
    mut header: TableHeader,
    existing_rows: usize,
    new_rows: &[Vec<Value>],
    config: &CodecConfig,
) -> TableHeader {
    if config.compute_stats {
        for (i, col) in header.columns.iter_mut().enumerate() {
            if !col.column_type.is_numeric() {
                continue;
            }
            let appended: Vec<f64> = new_rows
                .iter()
                .filter_map(|row| row.get(i)?.as_f64())
                .collect();
            col.stats = match col.stats {
                Some(existing) => Some(merge_column_stats(
                    &existing,
                    existing_rows as u64,
                    &appended,
                )),
                None => compute_column_stats(&appended),
            };
        }
    }
    header.meta.row_count = Some((existing_rows + new_rows.len()) as u64);
    header
}

/// Returns the absolute byte offset of every row record's length prefix.
pub fn get_index(bytes: &[u8], config: &CodecConfig) -> Result<Vec<usize>, PbTableError> {
    let (_, start) = decode_header(bytes, config.max_record_len)?;
    let offsets = index_records(bytes, start, config.max_record_len)?;
    log_metric!("event" = "get_index", "rows" = &offsets.len());
    Ok(offsets)
}

/// Summarizes a buffer's layout from its header and record boundaries alone.
pub fn analyze_buffer(bytes: &[u8], config: &CodecConfig) -> Result<BufferSummary, PbTableError> {
    let (header, start) = decode_header(bytes, config.max_record_len)?;
    let row_count = index_records(bytes, start, config.max_record_len)?.len();
    Ok(BufferSummary {
        header_size: start,
        data_size: bytes.len() - start,
        total_size: bytes.len(),
        row_count,
        header: header.columns,
        meta: header.meta,
    })
}
