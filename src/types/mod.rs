//! This module defines the core, strongly-typed data representations used
//! throughout pbtable: the logical column types, the dynamically-typed cell
//! value, and the in-memory table model.

pub mod column_type;
pub mod request;
pub mod table;
pub mod value;

// Re-export the main types for easier access.
pub use column_type::ColumnType;
pub use request::{RowRequest, RowSelection};
pub use table::{ColumnDef, Meta, Row, RowFormat, Stats, Table, TransformSpec};
pub use value::Value;
