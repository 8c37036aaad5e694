//! Schema derivation: turns a table header into the per-row message schema.
//!
//! A row record is a protobuf message whose field `i + 1` holds column `i`. The
//! derivation is a pure function of the column definitions, so callers rebuild
//! it whenever they need it instead of caching it anywhere.

pub mod header_schema;

use hashbrown::HashSet;
use prost::encoding::WireType;

use crate::error::PbTableError;
use crate::types::{ColumnDef, ColumnType};

//==================================================================================
// 1. Wire Type Mapping
//==================================================================================

/// The protobuf scalar used to carry a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    String,
    /// Plain varint `int32`; negative values take ten bytes.
    Int32,
    /// Zig-zag `sint32`.
    SInt32,
    /// 32-bit IEEE float.
    Float,
    Bool,
}

impl WireKind {
    pub fn for_column(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::String => WireKind::String,
            ColumnType::Uint => WireKind::Int32,
            ColumnType::Int => WireKind::SInt32,
            ColumnType::Float => WireKind::Float,
            ColumnType::Bool => WireKind::Bool,
        }
    }

    pub fn wire_type(&self) -> WireType {
        match self {
            WireKind::String => WireType::LengthDelimited,
            WireKind::Int32 | WireKind::SInt32 | WireKind::Bool => WireType::Varint,
            WireKind::Float => WireType::ThirtyTwoBit,
        }
    }
}

//==================================================================================
// 2. Row Schema
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Protobuf field number, `column index + 1`.
    pub number: u32,
    pub name: String,
    pub kind: WireKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSchema {
    fields: Vec<FieldSpec>,
}

impl RowSchema {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Maps a protobuf field number back to its column index.
    pub fn column_for_field(&self, number: u32) -> Option<usize> {
        let idx = (number as usize).checked_sub(1)?;
        (idx < self.fields.len()).then_some(idx)
    }
}

/// Derives the row-record schema for `header`, one optional field per column in
/// header order.
///
/// Fails with `Schema` if a column's transform cannot be reversed (a zero or
/// non-finite `multip`, a non-finite `offset`).
pub fn derive_row_schema(header: &[ColumnDef]) -> Result<RowSchema, PbTableError> {
    let mut fields = Vec::with_capacity(header.len());
    for (i, col) in header.iter().enumerate() {
        if let Some(t) = col.active_transform() {
            if t.multip == 0.0 || !t.multip.is_finite() {
                return Err(PbTableError::Schema(format!(
                    "column '{}' has transform multip {} which cannot be reversed",
                    col.name, t.multip
                )));
            }
            if !t.offset.is_finite() {
                return Err(PbTableError::Schema(format!(
                    "column '{}' has non-finite transform offset",
                    col.name
                )));
            }
        }
        let number = u32::try_from(i + 1)
            .map_err(|_| PbTableError::Schema("too many columns".to_string()))?;
        fields.push(FieldSpec {
            number,
            name: col.name.clone(),
            kind: WireKind::for_column(col.column_type),
        });
    }
    Ok(RowSchema { fields })
}

/// Checks that column names are non-empty and unique.
pub fn validate_header(header: &[ColumnDef]) -> Result<(), PbTableError> {
    if header.is_empty() {
        return Err(PbTableError::Schema("header must contain at least one column".into()));
    }
    let mut seen = HashSet::with_capacity(header.len());
    for (i, col) in header.iter().enumerate() {
        if col.name.is_empty() {
            return Err(PbTableError::Schema(format!("column {} has an empty name", i)));
        }
        if !seen.insert(col.name.as_str()) {
            return Err(PbTableError::Schema(format!(
                "duplicate column name '{}'",
                col.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformSpec;

    fn header() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::Uint),
            ColumnDef::new("name", ColumnType::String),
            ColumnDef::new("delta", ColumnType::Int),
            ColumnDef::new("value", ColumnType::Float),
            ColumnDef::new("active", ColumnType::Bool),
        ]
    }

    #[test]
    fn test_fields_follow_header_order() {
        let schema = derive_row_schema(&header()).unwrap();
        let kinds: Vec<(u32, &str, WireKind)> = schema
            .fields()
            .iter()
            .map(|f| (f.number, f.name.as_str(), f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (1, "id", WireKind::Int32),
                (2, "name", WireKind::String),
                (3, "delta", WireKind::SInt32),
                (4, "value", WireKind::Float),
                (5, "active", WireKind::Bool),
            ]
        );
    }

    #[test]
    fn test_column_for_field() {
        let schema = derive_row_schema(&header()).unwrap();
        assert_eq!(schema.column_for_field(1), Some(0));
        assert_eq!(schema.column_for_field(5), Some(4));
        assert_eq!(schema.column_for_field(0), None);
        assert_eq!(schema.column_for_field(6), None);
    }

    #[test]
    fn test_zero_multip_is_rejected() {
        let cols = vec![ColumnDef::new("x", ColumnType::Int).with_transform(TransformSpec {
            multip: 0.0,
            ..Default::default()
        })];
        assert!(matches!(derive_row_schema(&cols), Err(PbTableError::Schema(_))));
    }

    #[test]
    fn test_validate_header_rejects_duplicates() {
        let mut cols = header();
        cols.push(ColumnDef::new("id", ColumnType::Int));
        let err = validate_header(&cols).unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'id'"));
        assert!(validate_header(&header()).is_ok());
    }
}
