//! The wire-level codecs: record framing, the header record, row records, and the
//! scanner that walks row records without decoding them.
//!
//! Buffer layout:
//!
//! ```text
//! [varint len][Header message]  [varint len][0x0A][varint len][Row fields] ...
//! \_______ header record ______/ \____________ row record ______________/
//! ```

pub mod framing;
pub mod header;
pub mod row;
pub mod scanner;

pub use header::{decode_header, encode_header, TableHeader};
pub use row::RowCodec;
pub use scanner::{decode_records_at, index_records, RawRecord, RecordScanner};
