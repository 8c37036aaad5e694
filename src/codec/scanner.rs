//! The buffer scanner: walks row records without decoding them.
//!
//! Skipping a record costs one varint read and a seek, so locating row `k`
//! is linear in `k` but never pays for decoding the rows before it.

use hashbrown::HashMap;

use crate::bridge::format::ROW_RECORD_MARKER;
use crate::codec::framing::read_frame;
use crate::codec::row::RowCodec;
use crate::error::{PbTableError, Phase};
use crate::types::Value;

/// One undecoded row record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Absolute offset of the record's length prefix.
    pub offset: usize,
    pub payload: &'a [u8],
}

/// Iterates over the row records of `buf` starting at a record boundary.
///
/// Yields `Err` once and then stops if the buffer is corrupt.
pub struct RecordScanner<'a> {
    buf: &'a [u8],
    pos: usize,
    max_record_len: usize,
    failed: bool,
}

impl<'a> RecordScanner<'a> {
    pub fn new(buf: &'a [u8], start: usize, max_record_len: usize) -> Self {
        Self {
            buf,
            pos: start,
            max_record_len,
            failed: false,
        }
    }

    fn read_next(&mut self) -> Result<RawRecord<'a>, PbTableError> {
        let frame = read_frame(self.buf, self.pos, Phase::Index, self.max_record_len)?;
        let payload = frame.payload(self.buf);
        match payload.first() {
            Some(&ROW_RECORD_MARKER) => {}
            Some(&other) => {
                return Err(PbTableError::format(
                    Phase::Index,
                    frame.payload_start(),
                    format!(
                        "expected row record marker 0x{:02x}, found 0x{:02x}",
                        ROW_RECORD_MARKER, other
                    ),
                ))
            }
            None => {
                return Err(PbTableError::format(
                    Phase::Index,
                    frame.offset,
                    "empty row record",
                ))
            }
        }
        self.pos = frame.end();
        Ok(RawRecord {
            offset: frame.offset,
            payload,
        })
    }
}

impl<'a> Iterator for RecordScanner<'a> {
    type Item = Result<RawRecord<'a>, PbTableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let item = self.read_next();
        self.failed = item.is_err();
        Some(item)
    }
}

/// Returns the absolute offset of every row record from `start` to the end of
/// the buffer.
pub fn index_records(
    buf: &[u8],
    start: usize,
    max_record_len: usize,
) -> Result<Vec<usize>, PbTableError> {
    RecordScanner::new(buf, start, max_record_len)
        .map(|record| record.map(|r| r.offset))
        .collect()
}

/// Decodes the rows at `indices` (0-based, relative to `start`) in one pass.
///
/// The result is aligned with `indices`: requested order and duplicates are
/// preserved. Records that are not requested are skipped without decoding, and
/// the scan stops as soon as every requested row has been decoded.
///
/// A row other than the first cannot be decoded on its own when a column stores
/// sequence deltas, so such a request fails with `UnsupportedOperation`.
pub fn decode_records_at(
    buf: &[u8],
    start: usize,
    codec: &RowCodec,
    indices: &[usize],
    max_record_len: usize,
) -> Result<Vec<Vec<Value>>, PbTableError> {
    if let Some(col) = codec.header().iter().find(|c| c.is_sequence()) {
        if let Some(&idx) = indices.iter().find(|&&idx| idx > 0) {
            log::warn!(
                "refusing random access to row {}: column '{}' is sequence-encoded",
                idx,
                col.name
            );
            return Err(PbTableError::UnsupportedOperation(format!(
                "row {} cannot be read on its own because column '{}' stores deltas \
                 from the previous row; decode the whole table instead",
                idx, col.name
            )));
        }
    }

    if indices.is_empty() {
        return Ok(Vec::new());
    }

    let mut wanted: HashMap<usize, Vec<usize>> = HashMap::with_capacity(indices.len());
    for (position, &idx) in indices.iter().enumerate() {
        wanted.entry(idx).or_default().push(position);
    }

    let mut results: Vec<Option<Vec<Value>>> = vec![None; indices.len()];
    let mut remaining = wanted.len();
    let mut seen = 0usize;

    for record in RecordScanner::new(buf, start, max_record_len) {
        let record = record?;
        if let Some(positions) = wanted.get(&seen) {
            let values = codec.decode_row(record.payload, record.offset, None)?;
            for &position in positions {
                results[position] = Some(values.clone());
            }
            remaining -= 1;
        }
        seen += 1;
        if remaining == 0 {
            break;
        }
    }

    if remaining > 0 {
        let missing = indices
            .iter()
            .zip(&results)
            .find_map(|(&idx, slot)| slot.is_none().then_some(idx))
            .unwrap_or_default();
        return Err(PbTableError::NotFound {
            requested: missing,
            available: seen,
        });
    }

    Ok(results.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDef, ColumnType, TransformSpec};

    fn header() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::Uint),
            ColumnDef::new("v", ColumnType::Float),
        ]
    }

    /// Row records only, starting at offset 0.
    fn records(codec: &RowCodec, n: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        for i in 0..n {
            codec
                .encode_row(&[Value::Int(i), Value::Float(i as f64 + 0.5)], None, 0, &mut buf)
                .unwrap();
        }
        buf
    }

    #[test]
    fn test_index_offsets_are_strictly_increasing() {
        let cols = header();
        let codec = RowCodec::new(&cols).unwrap();
        let buf = records(&codec, 4);
        let offsets = index_records(&buf, 0, 1 << 20).unwrap();
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_requested_order_and_duplicates_are_preserved() {
        let cols = header();
        let codec = RowCodec::new(&cols).unwrap();
        let buf = records(&codec, 5);
        let rows = decode_records_at(&buf, 0, &codec, &[3, 0, 3], 1 << 20).unwrap();
        let ids: Vec<&Value> = rows.iter().map(|r| &r[0]).collect();
        assert_eq!(ids, vec![&Value::Int(3), &Value::Int(0), &Value::Int(3)]);
    }

    #[test]
    fn test_missing_row_reports_available_count() {
        let cols = header();
        let codec = RowCodec::new(&cols).unwrap();
        let buf = records(&codec, 3);
        let err = decode_records_at(&buf, 0, &codec, &[1, 7], 1 << 20).unwrap_err();
        assert!(matches!(
            err,
            PbTableError::NotFound {
                requested: 7,
                available: 3
            }
        ));
    }

    #[test]
    fn test_scan_stops_before_trailing_garbage_once_satisfied() {
        let cols = header();
        let codec = RowCodec::new(&cols).unwrap();
        let mut buf = records(&codec, 2);
        buf.extend_from_slice(&[0x02, 0x12, 0x00]);

        assert!(decode_records_at(&buf, 0, &codec, &[1], 1 << 20).is_ok());
        let err = index_records(&buf, 0, 1 << 20).unwrap_err();
        assert!(matches!(err, PbTableError::Format { phase: Phase::Index, .. }));
    }

    #[test]
    fn test_sequence_columns_only_allow_the_first_row() {
        let cols = vec![ColumnDef::new("n", ColumnType::Uint).with_transform(TransformSpec {
            sequence: true,
            ..Default::default()
        })];
        let codec = RowCodec::new(&cols).unwrap();
        let mut buf = Vec::new();
        codec.encode_row(&[Value::Int(100)], None, 0, &mut buf).unwrap();
        let first = [Value::Int(100)];
        codec
            .encode_row(&[Value::Int(105)], Some(&first), 1, &mut buf)
            .unwrap();

        let rows = decode_records_at(&buf, 0, &codec, &[0], 1 << 20).unwrap();
        assert_eq!(rows, vec![vec![Value::Int(100)]]);
        assert!(matches!(
            decode_records_at(&buf, 0, &codec, &[1], 1 << 20),
            Err(PbTableError::UnsupportedOperation(_))
        ));
    }
}
