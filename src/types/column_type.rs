//! This module defines the canonical, type-safe representation of the logical
//! column types a pbtable header may declare.

use crate::error::PbTableError;
use arrow::datatypes::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The logical type of a table column.
///
/// The lowercase names (`"string"`, `"uint"`, ...) are part of the wire contract:
/// they are what the header record stores for each column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Uint,
    Int,
    Float,
    Bool,
}

impl ColumnType {
    pub const ALL: [ColumnType; 5] = [
        ColumnType::String,
        ColumnType::Uint,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Uint => "uint",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }

    /// Returns `true` for the types whose values may carry a numeric transform.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Uint | Self::Int)
    }

    /// Returns `true` for the types that receive column statistics.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Uint | Self::Int | Self::Float)
    }

    /// Maps an Arrow `DataType` onto the closest logical column type.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, PbTableError> {
        match arrow_type {
            ArrowDataType::Int8 | ArrowDataType::Int16 | ArrowDataType::Int32 | ArrowDataType::Int64 => {
                Ok(Self::Int)
            }
            ArrowDataType::UInt8 | ArrowDataType::UInt16 | ArrowDataType::UInt32 | ArrowDataType::UInt64 => {
                Ok(Self::Uint)
            }
            ArrowDataType::Float16 | ArrowDataType::Float32 | ArrowDataType::Float64 => Ok(Self::Float),
            ArrowDataType::Boolean => Ok(Self::Bool),
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => Ok(Self::String),
            dt => Err(PbTableError::Schema(format!(
                "Cannot convert Arrow type {:?} to a column type",
                dt
            ))),
        }
    }

    /// The Arrow type used for values of this column when they are untransformed.
    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::String => ArrowDataType::Utf8,
            Self::Uint | Self::Int => ArrowDataType::Int64,
            Self::Float => ArrowDataType::Float64,
            Self::Bool => ArrowDataType::Boolean,
        }
    }
}

impl FromStr for ColumnType {
    type Err = PbTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                PbTableError::Schema(format!(
                    "Unknown column type '{}'. Valid types: string, uint, int, float, bool",
                    s
                ))
            })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
