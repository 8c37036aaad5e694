// In: src/bridge/codec.rs

use std::sync::Arc;

use crate::bridge::format::BufferSummary;
use crate::config::CodecConfig;
use crate::engine;
use crate::error::PbTableError;
use crate::types::{Row, RowFormat, RowRequest, RowSelection, Table};

/// A table codec bound to one configuration.
///
/// The codec holds no per-buffer state; it is cheap to clone and safe to share
/// across threads. Each operation runs to completion on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct TableCodec {
    config: Arc<CodecConfig>,
}

impl TableCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn with_shared_config(config: Arc<CodecConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, table: &Table) -> Result<Vec<u8>, PbTableError> {
        engine::encode_table(table, RowFormat::Array, &self.config)
    }

    pub fn encode_verbose(&self, table: &Table) -> Result<Vec<u8>, PbTableError> {
        engine::encode_table(table, RowFormat::Verbose, &self.config)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Table, PbTableError> {
        engine::decode_table(bytes, RowFormat::Array, &self.config)
    }

    pub fn decode_verbose(&self, bytes: &[u8]) -> Result<Table, PbTableError> {
        engine::decode_table(bytes, RowFormat::Verbose, &self.config)
    }

    pub fn get(
        &self,
        bytes: &[u8],
        request: impl Into<RowRequest>,
    ) -> Result<RowSelection, PbTableError> {
        engine::get_rows(bytes, &request.into(), RowFormat::Array, &self.config)
    }

    pub fn get_verbose(
        &self,
        bytes: &[u8],
        request: impl Into<RowRequest>,
    ) -> Result<RowSelection, PbTableError> {
        engine::get_rows(bytes, &request.into(), RowFormat::Verbose, &self.config)
    }

    pub fn add(&self, bytes: &[u8], rows: &[Row]) -> Result<Vec<u8>, PbTableError> {
        engine::append_rows(bytes, rows, RowFormat::Array, &self.config)
    }

    pub fn add_verbose(&self, bytes: &[u8], rows: &[Row]) -> Result<Vec<u8>, PbTableError> {
        engine::append_rows(bytes, rows, RowFormat::Verbose, &self.config)
    }

    pub fn get_index(&self, bytes: &[u8]) -> Result<Vec<usize>, PbTableError> {
        engine::get_index(bytes, &self.config)
    }

    pub fn analyze(&self, bytes: &[u8]) -> Result<BufferSummary, PbTableError> {
        engine::analyze_buffer(bytes, &self.config)
    }
}
