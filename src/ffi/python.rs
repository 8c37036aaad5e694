// In: src/ffi/python.rs

//! Python bindings. Tables and rows cross the boundary as plain Python objects
//! (dicts and lists), round-tripped through the standard `json` module; buffers
//! cross as `bytes`. The codec work itself runs with the GIL released.

use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::bridge;
use crate::error::PbTableError;
use crate::types::{Row, RowRequest, RowSelection, Table};

//==================================================================================
// I. Marshalling Helpers
//==================================================================================

fn to_json(py: Python<'_>, obj: &Bound<'_, PyAny>) -> PyResult<String> {
    py.import_bound("json")?
        .call_method1("dumps", (obj,))?
        .extract::<String>()
}

fn from_json(py: Python<'_>, json: String) -> PyResult<PyObject> {
    Ok(py.import_bound("json")?.call_method1("loads", (json,))?.unbind())
}

fn table_from_py(py: Python<'_>, obj: &Bound<'_, PyAny>) -> PyResult<Table> {
    Ok(Table::from_json(&to_json(py, obj)?)?)
}

fn rows_from_py(py: Python<'_>, obj: &Bound<'_, PyAny>) -> PyResult<Vec<Row>> {
    serde_json::from_str(&to_json(py, obj)?)
        .map_err(|e| PbTableError::Validation(format!("rows are not a list of rows: {}", e)).into())
}

/// Accepts an `int` or a list of `int`s.
fn request_from_py(index: &Bound<'_, PyAny>) -> PyResult<RowRequest> {
    match index.extract::<usize>() {
        Ok(idx) => Ok(RowRequest::One(idx)),
        Err(_) => Ok(RowRequest::Many(index.extract::<Vec<usize>>()?)),
    }
}

fn selection_to_json(selection: RowSelection) -> Result<String, PbTableError> {
    Ok(match selection {
        RowSelection::One(row) => serde_json::to_string(&row)?,
        RowSelection::Many(rows) => serde_json::to_string(&rows)?,
    })
}

//==================================================================================
// II. Stateless Functions
//==================================================================================

#[pyfunction]
#[pyo3(name = "encode")]
pub fn encode_py(py: Python<'_>, table: &Bound<'_, PyAny>) -> PyResult<Py<PyBytes>> {
    let table = table_from_py(py, table)?;
    let bytes = py.allow_threads(|| bridge::encode(&table))?;
    Ok(PyBytes::new_bound(py, &bytes).unbind())
}

#[pyfunction]
#[pyo3(name = "encode_verbose")]
pub fn encode_verbose_py(py: Python<'_>, table: &Bound<'_, PyAny>) -> PyResult<Py<PyBytes>> {
    let table = table_from_py(py, table)?;
    let bytes = py.allow_threads(|| bridge::encode_verbose(&table))?;
    Ok(PyBytes::new_bound(py, &bytes).unbind())
}

#[pyfunction]
#[pyo3(name = "decode")]
pub fn decode_py(py: Python<'_>, data: &[u8]) -> PyResult<PyObject> {
    let json = py.allow_threads(|| bridge::decode(data)?.to_json())?;
    from_json(py, json)
}

#[pyfunction]
#[pyo3(name = "decode_verbose")]
pub fn decode_verbose_py(py: Python<'_>, data: &[u8]) -> PyResult<PyObject> {
    let json = py.allow_threads(|| bridge::decode_verbose(data)?.to_json())?;
    from_json(py, json)
}

#[pyfunction]
#[pyo3(name = "get")]
pub fn get_py(py: Python<'_>, data: &[u8], index: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let request = request_from_py(index)?;
    let json = py.allow_threads(|| selection_to_json(bridge::get(data, request)?))?;
    from_json(py, json)
}

#[pyfunction]
#[pyo3(name = "get_verbose")]
pub fn get_verbose_py(
    py: Python<'_>,
    data: &[u8],
    index: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let request = request_from_py(index)?;
    let json = py.allow_threads(|| selection_to_json(bridge::get_verbose(data, request)?))?;
    from_json(py, json)
}

#[pyfunction]
#[pyo3(name = "add")]
pub fn add_py(py: Python<'_>, data: &[u8], rows: &Bound<'_, PyAny>) -> PyResult<Py<PyBytes>> {
    let rows = rows_from_py(py, rows)?;
    let bytes = py.allow_threads(|| bridge::add(data, &rows))?;
    Ok(PyBytes::new_bound(py, &bytes).unbind())
}

#[pyfunction]
#[pyo3(name = "add_verbose")]
pub fn add_verbose_py(
    py: Python<'_>,
    data: &[u8],
    rows: &Bound<'_, PyAny>,
) -> PyResult<Py<PyBytes>> {
    let rows = rows_from_py(py, rows)?;
    let bytes = py.allow_threads(|| bridge::add_verbose(data, &rows))?;
    Ok(PyBytes::new_bound(py, &bytes).unbind())
}

#[pyfunction]
#[pyo3(name = "get_index")]
pub fn get_index_py(py: Python<'_>, data: &[u8]) -> PyResult<Vec<usize>> {
    Ok(py.allow_threads(|| bridge::get_index(data))?)
}

//==================================================================================
// III. Logging
//==================================================================================

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    Ok(crate::observability::enable_verbose_logging(
        log_file.as_deref(),
    )?)
}
