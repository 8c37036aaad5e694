// In: src/bridge/arrow_impl.rs

//! Conversion between decoded tables and Arrow `RecordBatch`es.
//!
//! Each column becomes one nullable Arrow field. The logical column type and any
//! transform are kept in field metadata so a batch converts back to the same
//! header; table metadata goes into schema metadata.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::PbTableError;
use crate::types::{ColumnDef, ColumnType, Meta, Row, Table, TransformSpec, Value};

const TYPE_KEY: &str = "pbtable.type";
const TRANSFORM_KEY: &str = "pbtable.transform";
const META_KEYS: [&str; 4] = ["name", "owner", "link", "comment"];

/// The Arrow type a column's values are carried in. Transformed integer columns
/// recover to fractional values, so they travel as `Float64`.
fn storage_type(col: &ColumnDef) -> DataType {
    if col.active_transform().is_some() {
        DataType::Float64
    } else {
        col.column_type.to_arrow_type()
    }
}

//==================================================================================
// 1. Table -> RecordBatch
//==================================================================================

pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch, PbTableError> {
    let mut fields = Vec::with_capacity(table.header.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.header.len());

    for (i, col) in table.header.iter().enumerate() {
        let mut metadata = HashMap::new();
        metadata.insert(TYPE_KEY.to_string(), col.column_type.as_str().to_string());
        if let Some(t) = &col.transform {
            metadata.insert(TRANSFORM_KEY.to_string(), serde_json::to_string(t)?);
        }
        let data_type = storage_type(col);
        fields.push(Field::new(&col.name, data_type.clone(), true).with_metadata(metadata));

        let cells: Vec<&Value> = table
            .data
            .iter()
            .map(|row| row.value_at(i, &table.header).unwrap_or(&Value::Null))
            .collect();
        columns.push(build_array(col, &data_type, &cells)?);
    }

    let mut schema_metadata = HashMap::new();
    if let Some(meta) = &table.meta {
        let values = [&meta.name, &meta.owner, &meta.link, &meta.comment];
        for (key, value) in META_KEYS.iter().zip(values) {
            if let Some(v) = value {
                schema_metadata.insert(key.to_string(), v.clone());
            }
        }
    }
    let schema = Schema::new(fields).with_metadata(schema_metadata);
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

fn build_array(
    col: &ColumnDef,
    data_type: &DataType,
    cells: &[&Value],
) -> Result<ArrayRef, PbTableError> {
    let number = |row: usize, v: &Value| -> Result<Option<f64>, PbTableError> {
        match v {
            Value::Null => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| {
                PbTableError::Validation(format!(
                    "column '{}' row {}: '{}' is not a number",
                    col.name, row, other
                ))
            }),
        }
    };

    Ok(match data_type {
        DataType::Utf8 => Arc::new(StringArray::from(
            cells
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .iter()
                .map(|v| (!v.is_null()).then(|| !v.is_falsy()))
                .collect::<Vec<_>>(),
        )),
        DataType::Int64 => {
            let mut values = Vec::with_capacity(cells.len());
            for (row, v) in cells.iter().enumerate() {
                values.push(match v {
                    Value::Int(i) => Some(*i),
                    other => number(row, other)?.map(|f| f.trunc() as i64),
                });
            }
            Arc::new(Int64Array::from(values))
        }
        _ => {
            let mut values = Vec::with_capacity(cells.len());
            for (row, v) in cells.iter().enumerate() {
                values.push(number(row, v)?);
            }
            Arc::new(Float64Array::from(values))
        }
    })
}

//==================================================================================
// 2. RecordBatch -> Table
//==================================================================================

/// Builds a table with array rows from a batch. Columns without pbtable field
/// metadata take the closest logical type for their Arrow type.
pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table, PbTableError> {
    let schema = batch.schema();
    let mut header = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<Vec<Value>> = Vec::with_capacity(schema.fields().len());

    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let metadata = field.metadata();
        let column_type = match metadata.get(TYPE_KEY) {
            Some(name) => name.parse::<ColumnType>()?,
            None => ColumnType::from_arrow_type(field.data_type())?,
        };
        let transform = metadata
            .get(TRANSFORM_KEY)
            .map(|json| serde_json::from_str::<TransformSpec>(json))
            .transpose()?;
        let col = ColumnDef {
            name: field.name().clone(),
            column_type,
            transform,
            stats: None,
        };
        columns.push(read_array(&col, array.as_ref())?);
        header.push(col);
    }

    let data = (0..batch.num_rows())
        .map(|row| Row::Array(columns.iter().map(|c| c[row].clone()).collect()))
        .collect();

    let schema_metadata = schema.metadata();
    let meta_value = |key: &str| schema_metadata.get(key).cloned();
    let meta = Meta {
        name: meta_value("name"),
        owner: meta_value("owner"),
        link: meta_value("link"),
        comment: meta_value("comment"),
        row_count: None,
    };
    let meta = (meta != Meta::default()).then_some(meta);

    Ok(Table { header, meta, data })
}

fn read_array(col: &ColumnDef, array: &dyn Array) -> Result<Vec<Value>, PbTableError> {
    let target = storage_type(col);
    let array = cast(array, &target)?;

    let values = match target {
        DataType::Utf8 => array
            .as_string::<i32>()
            .iter()
            .map(|v| v.map_or(Value::Null, Value::from))
            .collect(),
        DataType::Boolean => array
            .as_boolean()
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect(),
        DataType::Int64 => array
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Int))
            .collect(),
        _ => {
            let integral = col.column_type.is_integer();
            array
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| match v {
                    Some(f) if integral => Value::from_number(f),
                    Some(f) => Value::Float(f),
                    None => Value::Null,
                })
                .collect()
        }
    };
    Ok(values)
}
