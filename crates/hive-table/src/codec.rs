//! Binary serialization of a table.
//!
//! ```text
//! table  := format_version: u32 | schema | chunk_count: u32 | chunk*
//! chunk  := num_records: u32 | data_size: u32 | records[data_size]
//! ```
//!
//! All integers are little-endian. `schema` is the [`TableSchema`] encoding.
//! Chunks are written compacted, so the record bytes carry no growth slack.

use std::io::{Read, Write};

use hive_schema::TableSchema;
use hive_types::wire;
use tracing::debug;

use crate::chunk::Chunk;
use crate::config::TableConfig;
use crate::encoding::{self, RECORD_HEADER};
use crate::error::{TableError, TableResult};
use crate::table::Table;

/// Current table format version.
pub const TABLE_FORMAT_VERSION: u32 = 0;

impl Table {
    /// Compact the table, then serialize it to `w`.
    pub fn write<W: Write>(&mut self, w: &mut W) -> TableResult<()> {
        self.optimize_storage();
        self.write_as_is(w)
    }

    /// Serialize the table as it is laid out now.
    ///
    /// Growth slack inside records is written verbatim; call
    /// [`optimize_storage`](Self::optimize_storage) first (or use
    /// [`write`](Self::write)) for the dense form.
    pub fn write_as_is<W: Write>(&self, w: &mut W) -> TableResult<()> {
        wire::write_u32(w, TABLE_FORMAT_VERSION)?;
        self.schema.write(w)?;
        wire::write_u32(w, self.chunks.len() as u32)?;
        let mut bytes = 0;
        for chunk in &self.chunks {
            let live = chunk.live();
            wire::write_u32(w, chunk.num_records as u32)?;
            wire::write_u32(w, live.len() as u32)?;
            w.write_all(live)?;
            bytes += live.len();
        }
        debug!(
            records = self.num_records,
            chunks = self.chunks.len(),
            bytes,
            schema = %self.schema.hash().short_hex(),
            "table written"
        );
        Ok(())
    }

    /// Deserialize a table with the default configuration.
    pub fn read<R: Read>(r: &mut R) -> TableResult<Self> {
        Self::read_with_config(r, TableConfig::default())
    }

    /// Deserialize a table, validating every chunk's record framing.
    pub fn read_with_config<R: Read>(r: &mut R, config: TableConfig) -> TableResult<Self> {
        config.validate()?;
        let version = wire::read_u32(r)?;
        if version != TABLE_FORMAT_VERSION {
            return Err(TableError::UnsupportedVersion(version));
        }
        let schema = TableSchema::read(r)?;
        let chunk_count = wire::read_u32(r)? as usize;

        let mut chunks = Vec::new();
        let mut num_records = 0usize;
        let mut compact = true;
        for index in 0..chunk_count {
            let count = wire::read_u32(r)? as usize;
            let size = wire::read_u32(r)? as usize;
            let data = wire::read_vec(r, size)?;
            compact &= validate_chunk(index, &data, count, &schema)?;
            num_records += count;
            chunks.push(Chunk::from_records(data, count));
        }

        debug!(
            records = num_records,
            chunks = chunk_count,
            compact,
            schema = %schema.hash().short_hex(),
            "table read"
        );
        let mut table = Table::build(schema, config);
        table.chunks = chunks;
        table.num_records = num_records;
        table.compact = compact;
        Ok(table)
    }
}

/// Check that `data` is exactly `count` well-formed records.
///
/// Returns whether every record is free of slack.
fn validate_chunk(
    index: usize,
    data: &[u8],
    count: usize,
    schema: &TableSchema,
) -> TableResult<bool> {
    let corrupt = |reason: String| TableError::Corrupt {
        chunk: index,
        reason,
    };
    if count == 0 || data.is_empty() {
        return Err(corrupt(format!(
            "empty chunk ({count} records, {} bytes)",
            data.len()
        )));
    }

    let mut offset = 0;
    let mut seen = 0;
    let mut dense = true;
    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() < RECORD_HEADER {
            return Err(corrupt(format!("truncated record header at byte {offset}")));
        }
        let size = encoding::record_size(rest);
        if size < RECORD_HEADER || size > rest.len() {
            return Err(corrupt(format!(
                "record {seen} claims {size} bytes, {} available",
                rest.len()
            )));
        }
        let used = encoding::checked_record_data_size(&rest[..size], schema)
            .ok_or_else(|| corrupt(format!("record {seen} fields overrun its size {size}")))?;
        dense &= used == size;
        offset += size;
        seen += 1;
    }
    if seen != count {
        return Err(corrupt(format!("header says {count} records, found {seen}")));
    }
    Ok(dense)
}
