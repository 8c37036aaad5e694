//! The table engine: buffer lifecycle operations over the codecs.
//!
//! A buffer moves from a logical table to an encoded buffer (`encode_table`) and
//! may then grow by appended rows (`append_rows`). There is no update or delete:
//! a header is written once and every later row record reuses it.

pub mod orchestrator;

pub use orchestrator::{
    analyze_buffer, append_rows, decode_table, encode_table, get_index, get_rows,
};
