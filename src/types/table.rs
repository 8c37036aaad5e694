//! The logical, in-memory table model: column definitions, metadata, and rows.
//!
//! Everything here is plain data with `serde` derives so tables can be read from
//! and written to JSON documents, which is how most callers describe them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PbTableError;
use crate::types::{ColumnType, Value};

//==================================================================================
// 1. Column Definitions
//==================================================================================

/// Per-column numeric transform applied to `int`/`uint` values before storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransformSpec {
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_multip")]
    pub multip: f64,
    #[serde(default)]
    pub decimals: i32,
    /// Store each value as a delta from the previous row instead of from `offset`.
    #[serde(default)]
    pub sequence: bool,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            offset: 0.0,
            multip: default_multip(),
            decimals: 0,
            sequence: false,
        }
    }
}

fn default_multip() -> f64 {
    1.0
}

/// Summary statistics of a numeric column, in the column's original units.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub start: f64,
    pub end: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Number of values the statistics cover. Null cells are not counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            transform: None,
            stats: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformSpec) -> Self {
        self.transform = Some(transform);
        self
    }

    /// The transform that actually applies to this column's values. Transforms
    /// declared on non-integer columns are kept in the header but ignored.
    pub fn active_transform(&self) -> Option<&TransformSpec> {
        if self.column_type.is_integer() {
            self.transform.as_ref()
        } else {
            None
        }
    }

    pub fn is_sequence(&self) -> bool {
        self.active_transform().map_or(false, |t| t.sequence)
    }
}

/// Free-form pass-through metadata plus the automatically maintained row count.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

//==================================================================================
// 2. Rows
//==================================================================================

/// The in-memory shape callers use for rows. Both shapes share one wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Rows are positional arrays aligned to header order.
    Array,
    /// Rows are maps keyed by column name.
    Verbose,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Row {
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Row {
    pub fn format(&self) -> RowFormat {
        match self {
            Row::Array(_) => RowFormat::Array,
            Row::Object(_) => RowFormat::Verbose,
        }
    }

    /// Reads the value for column `idx` of `header`. A verbose row missing the
    /// key yields `Value::Null`.
    pub fn value_at<'a>(&'a self, idx: usize, header: &[ColumnDef]) -> Option<&'a Value> {
        match self {
            Row::Array(values) => values.get(idx),
            Row::Object(map) => header.get(idx).and_then(|col| map.get(&col.name)),
        }
    }

    /// Shapes positional values (in header order) into a row of the requested format.
    pub fn from_values(values: Vec<Value>, header: &[ColumnDef], format: RowFormat) -> Row {
        match format {
            RowFormat::Array => Row::Array(values),
            RowFormat::Verbose => Row::Object(
                header
                    .iter()
                    .map(|col| col.name.clone())
                    .zip(values)
                    .collect(),
            ),
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::Array(values)
    }
}

//==================================================================================
// 3. Table
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub data: Vec<Row>,
}

impl Table {
    pub fn new(header: Vec<ColumnDef>, data: Vec<Row>) -> Self {
        Self {
            header,
            meta: None,
            data,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Parses a table from a JSON document.
    ///
    /// Structural problems (missing `header`/`data`, `data` not an array) are
    /// reported as `Validation` errors, and unknown column types as `Schema`
    /// errors, before the document is deserialized into typed rows.
    pub fn from_json(json: &str) -> Result<Self, PbTableError> {
        let doc: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(doc)
    }

    pub fn from_json_value(doc: serde_json::Value) -> Result<Self, PbTableError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| PbTableError::Validation("object is not a valid format".into()))?;

        let header = match obj.get("header") {
            Some(serde_json::Value::Array(cols)) if !cols.is_empty() => cols,
            Some(serde_json::Value::Array(_)) => {
                return Err(PbTableError::Validation("header has no columns".into()))
            }
            Some(_) => return Err(PbTableError::Validation("header is not an array".into())),
            None => return Err(PbTableError::Validation("object has no header".into())),
        };
        match obj.get("data") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => return Err(PbTableError::Validation("data is not an array".into())),
            None => return Err(PbTableError::Validation("object has no data".into())),
        }

        for (i, col) in header.iter().enumerate() {
            if let Some(type_name) = col.get("type").and_then(|t| t.as_str()) {
                type_name.parse::<ColumnType>().map_err(|_| {
                    PbTableError::Schema(format!(
                        "column {} ('{}') has unknown type '{}'",
                        i,
                        col.get("name").and_then(|n| n.as_str()).unwrap_or(""),
                        type_name
                    ))
                })?;
            }
        }

        serde_json::from_value(doc).map_err(|e| PbTableError::Validation(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PbTableError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
