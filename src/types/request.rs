//! Row selection for random-access reads.

use crate::types::Row;

/// Which rows to read: a single index, or a list whose order (and duplicates)
/// the result preserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRequest {
    One(usize),
    Many(Vec<usize>),
}

impl RowRequest {
    pub fn indices(&self) -> &[usize] {
        match self {
            RowRequest::One(idx) => std::slice::from_ref(idx),
            RowRequest::Many(indices) => indices,
        }
    }
}

impl From<usize> for RowRequest {
    fn from(idx: usize) -> Self {
        RowRequest::One(idx)
    }
}

impl From<Vec<usize>> for RowRequest {
    fn from(indices: Vec<usize>) -> Self {
        RowRequest::Many(indices)
    }
}

impl From<&[usize]> for RowRequest {
    fn from(indices: &[usize]) -> Self {
        RowRequest::Many(indices.to_vec())
    }
}

/// The result of a `get`, shaped like the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSelection {
    One(Row),
    Many(Vec<Row>),
}

impl RowSelection {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            RowSelection::One(row) => vec![row],
            RowSelection::Many(rows) => rows,
        }
    }
}
