// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the sole public-facing API of the pbtable library. It wraps the
// pure table `engine` and is the boundary between callers (Rust code, Python,
// Arrow data) and the wire-level codecs.
//
// Data Flow (Encode):
//
//   1. [Stateless API (encode / encode_verbose)] -> Receives `&Table`
//         |
//         `-> builds a default `TableCodec`
//
//   2. [Stateful Facade (TableCodec)]            -> Holds `Arc<CodecConfig>`
//         |
//         `-> calls the engine with the row format implied by the method
//
//   3. [Table Engine (engine::orchestrator)]     -> Returns `Result<Vec<u8>>`
//
//
// Data Flow (Random Access):
//
//   1. [Stateless API (get / get_verbose)]       -> Receives `&[u8]` + `RowRequest`
//         |
//         `-> [Table Engine] decodes the header record only
//         |
//         `-> [Buffer Scanner] skips unrequested row records, decodes the rest
//
//   2. Returns `RowSelection`, shaped like the request (one row or a list)
//
// Arrow interop (`table_to_record_batch`, `record_batch_to_table`) converts
// decoded tables and never touches encoded bytes.
//
// ====================================================================================
pub(crate) mod arrow_impl;
pub mod codec;
pub(crate) mod format;
pub mod stateless_api;

// --- High-Level Stateful API ---
pub use codec::TableCodec;

// --- Low-Level Stateless API (for FFI and testing) ---
pub use stateless_api::{
    add, add_verbose, analyze_buffer, decode, decode_verbose, encode, encode_verbose, get,
    get_index, get_verbose, with_callback,
};

// --- Arrow Interop ---
pub use arrow_impl::{record_batch_to_table, table_to_record_batch};

// --- Format Constants and Structs ---
pub use format::BufferSummary;

#[cfg(test)]
mod tests;
