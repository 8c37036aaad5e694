//! This file is the root of the `pbtable` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`engine`, `codec`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the public API from the `bridge`.
//! 3.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (with the `python` feature).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod codec;
pub mod config;
pub mod engine;
pub mod kernels;
pub mod schema;
pub mod types;

mod error;
mod ffi;

pub use bridge::{
    add, add_verbose, analyze_buffer, decode, decode_verbose, encode, encode_verbose, get,
    get_index, get_verbose, record_batch_to_table, table_to_record_batch, with_callback,
    BufferSummary, TableCodec,
};
pub use config::CodecConfig;
pub use error::{PbTableError, Phase};
pub use observability::enable_verbose_logging;
pub use types::{
    ColumnDef, ColumnType, Meta, Row, RowFormat, RowRequest, RowSelection, Stats, Table,
    TransformSpec, Value,
};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `pbtable` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn pbtable(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use ffi::python;

    // --- Table operations ---
    m.add_function(wrap_pyfunction!(python::encode_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::decode_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::encode_verbose_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::decode_verbose_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::get_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::get_verbose_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::add_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::add_verbose_py, m)?)?;
    m.add_function(wrap_pyfunction!(python::get_index_py, m)?)?;

    // --- Expose the custom error type ---
    m.add(
        "PbTableError",
        m.py().get_type_bound::<pyo3::exceptions::PyValueError>(),
    )?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging for the table engine ---
    m.add_function(wrap_pyfunction!(python::enable_verbose_logging_py, m)?)?;

    Ok(())
}
