//! The row codec: one table row to one length-prefixed row record, and back.
//!
//! A row record payload is the row envelope (`0x0A`, varint length) wrapping a
//! message whose field `i + 1` carries column `i`. Every column is always written,
//! in column order, with absent values normalized to the wire type's zero value,
//! so equal rows always produce identical bytes.

use prost::encoding::{
    self, decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint, skip_field,
    DecodeContext, WireType,
};
use prost::DecodeError;

use crate::bridge::format::ROW_ENVELOPE_FIELD;
use crate::codec::framing::{check_record_len, write_record};
use crate::error::{PbTableError, Phase};
use crate::kernels::transform;
use crate::schema::{derive_row_schema, RowSchema, WireKind};
use crate::types::{ColumnDef, Row, Value};

/// A column value coerced to its protobuf scalar.
#[derive(Debug, Clone, PartialEq)]
enum WireValue {
    Str(String),
    Int(i32),
    Float(f32),
    Bool(bool),
}

/// Encodes and decodes rows for one header. Construction derives the row schema,
/// so a header that cannot be turned into a schema fails here, before any row
/// is touched.
#[derive(Debug, Clone)]
pub struct RowCodec<'h> {
    header: &'h [ColumnDef],
    schema: RowSchema,
    max_record_len: usize,
}

impl<'h> RowCodec<'h> {
    pub fn new(header: &'h [ColumnDef]) -> Result<Self, PbTableError> {
        Ok(Self {
            header,
            schema: derive_row_schema(header)?,
            max_record_len: usize::MAX,
        })
    }

    /// Caps the payload size of every record `encode_row` writes.
    pub fn with_max_record_len(mut self, max_record_len: usize) -> Self {
        self.max_record_len = max_record_len;
        self
    }

    pub fn header(&self) -> &'h [ColumnDef] {
        self.header
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Whether any column stores deltas from the previous row.
    pub fn has_sequence(&self) -> bool {
        self.header.iter().any(ColumnDef::is_sequence)
    }

    /// Reads a caller row into positional values aligned to header order.
    ///
    /// Array rows must have exactly one value per column. Object rows may omit
    /// keys; an omitted column reads as `Value::Null`.
    pub fn row_values(&self, row: &Row, row_idx: usize) -> Result<Vec<Value>, PbTableError> {
        match row {
            Row::Array(values) if values.len() != self.header.len() => {
                Err(PbTableError::encoding(
                    row_idx,
                    format!(
                        "row has {} values but the header has {} columns",
                        values.len(),
                        self.header.len()
                    ),
                ))
            }
            Row::Array(values) => Ok(values.clone()),
            Row::Object(map) => Ok(self
                .header
                .iter()
                .map(|col| map.get(&col.name).cloned().unwrap_or_default())
                .collect()),
        }
    }

    //==============================================================================
    // Encode
    //==============================================================================

    /// Appends the row record for `values` to `out`.
    ///
    /// `previous_raw` is the previous row of the same encode pass, exactly as the
    /// caller supplied it; sequence columns take their delta base from it.
    pub fn encode_row(
        &self,
        values: &[Value],
        previous_raw: Option<&[Value]>,
        row_idx: usize,
        out: &mut Vec<u8>,
    ) -> Result<(), PbTableError> {
        if values.len() != self.schema.len() {
            return Err(PbTableError::encoding(
                row_idx,
                format!(
                    "row has {} values but the header has {} columns",
                    values.len(),
                    self.schema.len()
                ),
            ));
        }

        let mut body = Vec::with_capacity(self.schema.len() * 4);
        for (i, field) in self.schema.fields().iter().enumerate() {
            let wire = self.to_wire(i, &values[i], previous_raw).map_err(|reason| {
                PbTableError::encoding(row_idx, format!("column '{}': {}", field.name, reason))
            })?;
            match (field.kind, wire) {
                (WireKind::String, WireValue::Str(s)) => {
                    encoding::string::encode(field.number, &s, &mut body)
                }
                (WireKind::Int32, WireValue::Int(v)) => {
                    encoding::int32::encode(field.number, &v, &mut body)
                }
                (WireKind::SInt32, WireValue::Int(v)) => {
                    encoding::sint32::encode(field.number, &v, &mut body)
                }
                (WireKind::Float, WireValue::Float(v)) => {
                    encoding::float::encode(field.number, &v, &mut body)
                }
                (WireKind::Bool, WireValue::Bool(v)) => {
                    encoding::bool::encode(field.number, &v, &mut body)
                }
                (kind, wire) => {
                    return Err(PbTableError::Internal(format!(
                        "coerced {:?} for a {:?} field",
                        wire, kind
                    )))
                }
            }
        }

        let mut payload =
            Vec::with_capacity(1 + encoded_len_varint(body.len() as u64) + body.len());
        encode_key(ROW_ENVELOPE_FIELD, WireType::LengthDelimited, &mut payload);
        encode_varint(body.len() as u64, &mut payload);
        payload.extend_from_slice(&body);

        check_record_len(payload.len(), self.max_record_len)
            .map_err(|reason| PbTableError::encoding(row_idx, reason))?;
        write_record(&payload, out);
        Ok(())
    }

    fn to_wire(
        &self,
        col_idx: usize,
        value: &Value,
        previous_raw: Option<&[Value]>,
    ) -> Result<WireValue, String> {
        let col = &self.header[col_idx];
        match self.schema.fields()[col_idx].kind {
            WireKind::String => Ok(WireValue::Str(match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            WireKind::Bool => Ok(WireValue::Bool(!value.is_falsy())),
            WireKind::Float => {
                let v = match value {
                    Value::Null => 0.0,
                    Value::String(s) if s.trim().is_empty() => 0.0,
                    other => other
                        .as_f64()
                        .ok_or_else(|| format!("'{}' is not a number", other))?,
                };
                Ok(WireValue::Float(v as f32))
            }
            WireKind::Int32 | WireKind::SInt32 => {
                let raw = finite_number(value)?;
                let stored = match col.active_transform() {
                    Some(spec) => {
                        // The delta base is the previous row's value as normalized
                        // for storage, so an absent previous cell counts as zero.
                        let previous = previous_raw.map(|row| {
                            row.get(col_idx)
                                .and_then(Value::as_f64)
                                .filter(|v| v.is_finite())
                                .unwrap_or(0.0)
                        });
                        transform::parse(raw, previous, spec)
                    }
                    None => raw.map_or(0, |v| v.trunc() as i64),
                };
                i32::try_from(stored).map(WireValue::Int).map_err(|_| {
                    format!("stored value {} does not fit in a 32-bit integer", stored)
                })
            }
        }
    }

    //==============================================================================
    // Decode
    //==============================================================================

    /// Decodes one row record payload into positional values.
    ///
    /// `offset` is the record's position in the buffer, used only for error
    /// messages. `previous` must be the previous row's *recovered* values when
    /// decoding a chain of rows; it is `None` for the first row.
    pub fn decode_row(
        &self,
        payload: &[u8],
        offset: usize,
        previous: Option<&[Value]>,
    ) -> Result<Vec<Value>, PbTableError> {
        let fail = |reason: String| PbTableError::format(Phase::Row, offset, reason);

        let mut cursor = payload;
        let (tag, wire_type) = decode_key(&mut cursor)
            .map_err(|e| fail(format!("invalid row envelope: {}", e)))?;
        if tag != ROW_ENVELOPE_FIELD || wire_type != WireType::LengthDelimited {
            return Err(fail(format!(
                "expected the embedded row marker, found field {} with wire type {:?}",
                tag, wire_type
            )));
        }
        let declared = decode_varint(&mut cursor)
            .map_err(|e| fail(format!("invalid embedded row length: {}", e)))?;
        if declared != cursor.len() as u64 {
            return Err(fail(format!(
                "embedded row declares {} bytes but the record holds {}",
                declared,
                cursor.len()
            )));
        }

        let mut slots: Vec<Option<WireValue>> = vec![None; self.schema.len()];
        let mut body = cursor;
        while !body.is_empty() {
            let (tag, wire_type) =
                decode_key(&mut body).map_err(|e| fail(format!("invalid field key: {}", e)))?;
            let Some(idx) = self.schema.column_for_field(tag) else {
                skip_field(wire_type, tag, &mut body, DecodeContext::default())
                    .map_err(|e| fail(format!("cannot skip unknown field {}: {}", tag, e)))?;
                continue;
            };
            let field = &self.schema.fields()[idx];
            let value = merge_field(field.kind, wire_type, &mut body)
                .map_err(|e| fail(format!("field {} ('{}'): {}", tag, field.name, e)))?;
            slots[idx] = Some(value);
        }

        let mut values = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            let col = &self.header[i];
            let value = match (self.schema.fields()[i].kind, slot) {
                (WireKind::String, Some(WireValue::Str(s))) => Value::String(s),
                (WireKind::String, _) => Value::String(String::new()),
                (WireKind::Bool, slot) => Value::Bool(slot == Some(WireValue::Bool(true))),
                (WireKind::Float, Some(WireValue::Float(f))) => Value::Float(f as f64),
                (WireKind::Float, _) => Value::Float(0.0),
                (WireKind::Int32 | WireKind::SInt32, slot) => {
                    let stored = match slot {
                        Some(WireValue::Int(v)) => Some(v as i64),
                        _ => None,
                    };
                    match col.active_transform() {
                        Some(spec) => {
                            let previous = previous.map(|row| {
                                row.get(i).and_then(Value::as_f64).unwrap_or(0.0)
                            });
                            Value::from_number(transform::recover(stored, previous, spec))
                        }
                        None => Value::Int(stored.unwrap_or(0)),
                    }
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}

/// Reads an integer-column cell as a finite number. `None` means the cell is
/// absent and stores as zero.
fn finite_number(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => match other.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            Some(v) => Err(format!("non-finite value {}", v)),
            None => Err(format!("'{}' is not a number", other)),
        },
    }
}

fn merge_field(
    kind: WireKind,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<WireValue, DecodeError> {
    let ctx = DecodeContext::default();
    Ok(match kind {
        WireKind::String => {
            let mut v = String::new();
            encoding::string::merge(wire_type, &mut v, buf, ctx)?;
            WireValue::Str(v)
        }
        WireKind::Int32 => {
            let mut v = 0i32;
            encoding::int32::merge(wire_type, &mut v, buf, ctx)?;
            WireValue::Int(v)
        }
        WireKind::SInt32 => {
            let mut v = 0i32;
            encoding::sint32::merge(wire_type, &mut v, buf, ctx)?;
            WireValue::Int(v)
        }
        WireKind::Float => {
            let mut v = 0f32;
            encoding::float::merge(wire_type, &mut v, buf, ctx)?;
            WireValue::Float(v)
        }
        WireKind::Bool => {
            let mut v = false;
            encoding::bool::merge(wire_type, &mut v, buf, ctx)?;
            WireValue::Bool(v)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::framing::read_frame;
    use crate::types::{ColumnType, TransformSpec};
    use std::collections::BTreeMap;

    fn id_value_header() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::Uint),
            ColumnDef::new("v", ColumnType::Float),
        ]
    }

    fn encode_one(codec: &RowCodec, values: &[Value]) -> Vec<u8> {
        let mut out = Vec::new();
        codec.encode_row(values, None, 0, &mut out).unwrap();
        out
    }

    fn payload_of(record: &[u8]) -> &[u8] {
        let frame = read_frame(record, 0, Phase::Row, usize::MAX).unwrap();
        frame.payload(record)
    }

    #[test]
    fn test_record_bytes_are_fixed() {
        let header = id_value_header();
        let codec = RowCodec::new(&header).unwrap();
        let record = encode_one(&codec, &[Value::Int(1), Value::Float(1.5)]);
        assert_eq!(
            record,
            vec![0x09, 0x0A, 0x07, 0x08, 0x01, 0x15, 0x00, 0x00, 0xC0, 0x3F]
        );
    }

    #[test]
    fn test_oversized_record_is_rejected_on_write() {
        let header = id_value_header();
        let row = [Value::Int(1), Value::Float(1.5)];

        // The payload of this row is 9 bytes.
        let exact = RowCodec::new(&header).unwrap().with_max_record_len(9);
        assert_eq!(encode_one(&exact, &row).len(), 10);

        let tight = RowCodec::new(&header).unwrap().with_max_record_len(8);
        let mut out = Vec::new();
        let err = tight.encode_row(&row, None, 5, &mut out).unwrap_err();
        assert!(matches!(err, PbTableError::Encoding { row: 5, .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_every_type_survives_a_row() {
        let header = vec![
            ColumnDef::new("s", ColumnType::String),
            ColumnDef::new("u", ColumnType::Uint),
            ColumnDef::new("i", ColumnType::Int),
            ColumnDef::new("f", ColumnType::Float),
            ColumnDef::new("b", ColumnType::Bool),
        ];
        let codec = RowCodec::new(&header).unwrap();
        let row = vec![
            Value::from("héllo"),
            Value::Int(300),
            Value::Int(-42),
            Value::Float(-0.25),
            Value::Bool(true),
        ];
        let record = encode_one(&codec, &row);
        let decoded = codec.decode_row(payload_of(&record), 0, None).unwrap();
        assert_eq!(decoded, row);
    }

    #[test]
    fn test_nulls_normalize_to_zero_values() {
        let header = vec![
            ColumnDef::new("s", ColumnType::String),
            ColumnDef::new("i", ColumnType::Int),
            ColumnDef::new("b", ColumnType::Bool),
        ];
        let codec = RowCodec::new(&header).unwrap();
        let record = encode_one(&codec, &[Value::Null, Value::Null, Value::Null]);
        let decoded = codec.decode_row(payload_of(&record), 0, None).unwrap();
        assert_eq!(
            decoded,
            vec![Value::from(""), Value::Int(0), Value::Bool(false)]
        );
    }

    #[test]
    fn test_offset_transform_round_trip() {
        let header = vec![ColumnDef::new("t", ColumnType::Uint).with_transform(TransformSpec {
            offset: 1000.0,
            decimals: 1,
            ..Default::default()
        })];
        let codec = RowCodec::new(&header).unwrap();
        let record = encode_one(&codec, &[Value::Float(1012.5)]);
        // 125 is stored, not 1012.5.
        assert_eq!(&payload_of(&record)[2..], &[0x08, 0x7D]);
        let decoded = codec.decode_row(payload_of(&record), 0, None).unwrap();
        assert_eq!(decoded, vec![Value::Float(1012.5)]);
    }

    #[test]
    fn test_sequence_chains_across_rows() {
        let header = vec![ColumnDef::new("counter", ColumnType::Uint).with_transform(
            TransformSpec {
                sequence: true,
                ..Default::default()
            },
        )];
        let codec = RowCodec::new(&header).unwrap();
        let rows: Vec<Vec<Value>> = [100, 105, 112].iter().map(|&v| vec![Value::Int(v)]).collect();

        let mut records = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let previous = i.checked_sub(1).map(|p| rows[p].as_slice());
            let mut out = Vec::new();
            codec.encode_row(row, previous, i, &mut out).unwrap();
            records.push(out);
        }
        let stored: Vec<u8> = records.iter().map(|r| payload_of(r)[3]).collect();
        assert_eq!(stored, vec![100, 5, 7]);

        let mut decoded: Vec<Vec<Value>> = Vec::new();
        for record in &records {
            let previous = decoded.last().map(|r| r.as_slice());
            decoded.push(codec.decode_row(payload_of(record), 0, previous).unwrap());
        }
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_out_of_range_and_non_numeric_values_fail() {
        let header = vec![ColumnDef::new("i", ColumnType::Int)];
        let codec = RowCodec::new(&header).unwrap();
        let mut out = Vec::new();

        let err = codec
            .encode_row(&[Value::Int(1 << 40)], None, 3, &mut out)
            .unwrap_err();
        assert!(matches!(err, PbTableError::Encoding { row: 3, .. }));

        let err = codec
            .encode_row(&[Value::from("abc")], None, 4, &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("'abc' is not a number"));

        let err = codec
            .encode_row(&[Value::Float(f64::NAN)], None, 5, &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("non-finite"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_skipped_and_missing_fields_default() {
        let header = id_value_header();
        let codec = RowCodec::new(&header).unwrap();

        let mut body = Vec::new();
        encoding::int32::encode(9, &77, &mut body);
        encoding::int32::encode(1, &5, &mut body);
        let mut payload = Vec::new();
        encode_key(1, WireType::LengthDelimited, &mut payload);
        encode_varint(body.len() as u64, &mut payload);
        payload.extend_from_slice(&body);

        let decoded = codec.decode_row(&payload, 0, None).unwrap();
        assert_eq!(decoded, vec![Value::Int(5), Value::Float(0.0)]);
    }

    #[test]
    fn test_wrong_envelope_is_a_format_error() {
        let header = id_value_header();
        let codec = RowCodec::new(&header).unwrap();
        let err = codec.decode_row(&[0x12, 0x00], 40, None).unwrap_err();
        assert!(matches!(err, PbTableError::Format { phase: Phase::Row, offset: 40, .. }));
    }

    #[test]
    fn test_row_shapes() {
        let header = id_value_header();
        let codec = RowCodec::new(&header).unwrap();

        let short = Row::Array(vec![Value::Int(1)]);
        assert!(matches!(
            codec.row_values(&short, 2),
            Err(PbTableError::Encoding { row: 2, .. })
        ));

        let mut map = BTreeMap::new();
        map.insert("v".to_string(), Value::Float(2.5));
        let values = codec.row_values(&Row::Object(map), 0).unwrap();
        assert_eq!(values, vec![Value::Null, Value::Float(2.5)]);
    }
}
