//! The header codec: column definitions, statistics, and metadata as the single
//! length-prefixed record at the start of every buffer.

use prost::Message;

use crate::codec::framing::{check_record_len, read_frame, write_record};
use crate::config::CodecConfig;
use crate::error::{PbTableError, Phase};
use crate::kernels::stats::compute_column_stats;
use crate::schema::header_schema::{
    ColumnMessage, HeaderMessage, MetaMessage, StatsMessage, TransformMessage,
};
use crate::types::{ColumnDef, ColumnType, Meta, Stats, TransformSpec, Value};

/// The decoded content of a header record.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub columns: Vec<ColumnDef>,
    pub meta: Meta,
}

impl TableHeader {
    /// Builds the header to store for a table about to be encoded.
    ///
    /// With `compute_stats` on, every numeric column gets fresh statistics over
    /// `rows` (positional values) and non-numeric columns lose any stats they
    /// carried. With it off, caller-supplied stats pass through. The row count
    /// is always set to `rows.len()`.
    pub fn for_rows(
        columns: &[ColumnDef],
        meta: Option<&Meta>,
        rows: &[Vec<Value>],
        config: &CodecConfig,
    ) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let mut col = col.clone();
                if config.compute_stats {
                    col.stats = if col.column_type.is_numeric() {
                        let column: Vec<f64> =
                            rows.iter().filter_map(|row| row.get(i)?.as_f64()).collect();
                        compute_column_stats(&column)
                    } else {
                        None
                    };
                }
                col
            })
            .collect();

        let mut meta = meta.cloned().unwrap_or_default();
        meta.row_count = Some(rows.len() as u64);
        Self { columns, meta }
    }
}

//==================================================================================
// 1. Encode
//==================================================================================

/// Encodes `header` as a length-prefixed record and appends it to `out`.
///
/// A payload longer than `max_record_len` is a `Validation` error, since
/// `decode_header` would refuse it under the same limit.
pub fn encode_header(
    header: &TableHeader,
    max_record_len: usize,
    out: &mut Vec<u8>,
) -> Result<(), PbTableError> {
    let message = to_message(header)?;
    let payload = message.encode_to_vec();
    log::debug!(
        "encoded header: {} columns, {} payload bytes",
        header.columns.len(),
        payload.len()
    );
    check_record_len(payload.len(), max_record_len)
        .map_err(|reason| PbTableError::Validation(format!("header {}", reason)))?;
    write_record(&payload, out);
    Ok(())
}

fn to_message(header: &TableHeader) -> Result<HeaderMessage, PbTableError> {
    let mut columns = Vec::with_capacity(header.columns.len());
    for (i, col) in header.columns.iter().enumerate() {
        if col.name.is_empty() {
            return Err(PbTableError::Validation(format!(
                "column {} is missing a name",
                i
            )));
        }
        columns.push(ColumnMessage {
            name: col.name.clone(),
            r#type: col.column_type.as_str().to_string(),
            transform: col.transform.as_ref().map(|t| TransformMessage {
                offset: Some(t.offset),
                multip: Some(t.multip),
                decimals: Some(t.decimals),
                sequence: Some(t.sequence),
            }),
            stats: col.stats.map(|s| StatsMessage {
                start: s.start,
                end: s.end,
                min: s.min,
                max: s.max,
                mean: s.mean,
                count: s.count,
            }),
        });
    }

    let row_count = header
        .meta
        .row_count
        .map(|n| {
            u32::try_from(n).map_err(|_| {
                PbTableError::Validation(format!("row count {} does not fit the header", n))
            })
        })
        .transpose()?;

    Ok(HeaderMessage {
        header: columns,
        meta: Some(MetaMessage {
            name: header.meta.name.clone(),
            owner: header.meta.owner.clone(),
            link: header.meta.link.clone(),
            comment: header.meta.comment.clone(),
            row_count,
        }),
    })
}

//==================================================================================
// 2. Decode
//==================================================================================

/// Decodes the header record at the start of `buf`.
///
/// Returns the header and the number of bytes it occupies (length prefix
/// included), i.e. the offset of the first row record.
pub fn decode_header(
    buf: &[u8],
    max_record_len: usize,
) -> Result<(TableHeader, usize), PbTableError> {
    let frame = read_frame(buf, 0, Phase::Header, max_record_len)?;
    let message = HeaderMessage::decode(frame.payload(buf)).map_err(|e| {
        PbTableError::format(Phase::Header, frame.payload_start(), e.to_string())
    })?;
    let header = from_message(message, frame.payload_start())?;
    Ok((header, frame.end()))
}

fn from_message(message: HeaderMessage, offset: usize) -> Result<TableHeader, PbTableError> {
    if message.header.is_empty() {
        return Err(PbTableError::format(
            Phase::Header,
            offset,
            "header record has no columns",
        ));
    }

    let mut columns = Vec::with_capacity(message.header.len());
    for (i, col) in message.header.into_iter().enumerate() {
        if col.name.is_empty() {
            return Err(PbTableError::format(
                Phase::Header,
                offset,
                format!("column {} has no name", i),
            ));
        }
        let column_type: ColumnType = col.r#type.parse()?;
        let transform = col.transform.map(|t| {
            let defaults = TransformSpec::default();
            TransformSpec {
                offset: t.offset.unwrap_or(defaults.offset),
                multip: t.multip.unwrap_or(defaults.multip),
                decimals: t.decimals.unwrap_or(defaults.decimals),
                sequence: t.sequence.unwrap_or(defaults.sequence),
            }
        });
        columns.push(ColumnDef {
            name: col.name,
            column_type,
            transform,
            stats: col.stats.map(|s| Stats {
                start: s.start,
                end: s.end,
                min: s.min,
                max: s.max,
                mean: s.mean,
                count: s.count,
            }),
        });
    }

    let meta = message
        .meta
        .map(|m| Meta {
            name: m.name,
            owner: m.owner,
            link: m.link,
            comment: m.comment,
            row_count: m.row_count.map(u64::from),
        })
        .unwrap_or_default();

    Ok(TableHeader { columns, meta })
}
