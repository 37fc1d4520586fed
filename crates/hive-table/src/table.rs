//! The chunked record store.
//!
//! [`Table`] keeps schema-conformant records packed back to back inside a
//! list of [`Chunk`]s. Records have no fixed size, so positions are tracked
//! with a [`Cursor`] that walks records sequentially: stepping forward is
//! O(1), seeking to an arbitrary index is O(index).
//!
//! # Invariants
//!
//! - Every chunk holds at least one record; emptied chunks are dropped.
//! - `head <= tail <= capacity` for every chunk, and `[head, tail)` is a
//!   gapless run of records.
//! - The per-chunk record counts sum to the table's record count.
//! - Every record has one field per schema column.

use hive_schema::TableSchema;
use hive_types::{Type, ValueRef};
use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::config::TableConfig;
use crate::cursor::Cursor;
use crate::encoding::{self, RECORD_HEADER};
use crate::error::TableResult;
use crate::rows::Rows;

/// A collection of variable-length records conforming to one schema.
///
/// Move-only: chunk buffers are owned exclusively by their table.
#[derive(Debug)]
pub struct Table {
    pub(crate) schema: TableSchema,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) num_records: usize,
    pub(crate) config: TableConfig,
    pub(crate) generation: u64,
    /// No record carries growth slack and chunks are freshly packed.
    pub(crate) compact: bool,
}

impl Table {
    /// An empty table for `schema` with the default configuration.
    pub fn new(schema: TableSchema) -> Self {
        Self::build(schema, TableConfig::default())
    }

    /// An empty table for `schema` with an explicit configuration.
    pub fn with_config(schema: TableSchema, config: TableConfig) -> TableResult<Self> {
        config.validate()?;
        Ok(Self::build(schema, config))
    }

    pub(crate) fn build(schema: TableSchema, config: TableConfig) -> Self {
        Self {
            schema,
            chunks: Vec::new(),
            num_records: 0,
            config,
            generation: 0,
            compact: true,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn num_rows(&self) -> usize {
        self.num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns `true` if storage is packed with no growth slack.
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Iterate over all rows in order.
    pub fn rows(&self) -> Rows<'_> {
        Rows::new(self)
    }

    // ---------------------------------------------------------------
    // Cursors
    // ---------------------------------------------------------------

    /// Cursor at the first record (equal to [`end`](Self::end) when empty).
    pub fn begin(&self) -> Cursor {
        Cursor {
            index: 0,
            chunk_index: 0,
            inner_index: 0,
            offset: self.chunks.first().map_or(0, |c| c.head),
            generation: self.generation,
        }
    }

    /// Cursor one past the last record.
    pub fn end(&self) -> Cursor {
        Cursor {
            index: self.num_records,
            chunk_index: self.chunks.len(),
            inner_index: 0,
            offset: 0,
            generation: self.generation,
        }
    }

    /// Cursor at record `index`, or [`end`](Self::end) if out of range.
    pub fn cursor_at(&self, index: usize) -> Cursor {
        if index >= self.num_records {
            return self.end();
        }
        let mut cursor = self.begin();
        self.advance_by(&mut cursor, index);
        cursor
    }

    /// Returns `true` if `cursor` points at a record of this table as it is
    /// now.
    pub fn is_valid(&self, cursor: &Cursor) -> bool {
        self.is_current(cursor)
            && cursor.index < self.num_records
            && cursor.chunk_index < self.chunks.len()
    }

    /// Returns `true` if `cursor` is a valid record or the end position.
    fn is_position(&self, cursor: &Cursor) -> bool {
        self.is_current(cursor) && cursor.index <= self.num_records
    }

    fn is_current(&self, cursor: &Cursor) -> bool {
        if cursor.generation != self.generation {
            warn!(
                cursor = cursor.generation,
                table = self.generation,
                "stale cursor used after table mutation"
            );
            return false;
        }
        true
    }

    /// Step to the next record. Returns `false` if the cursor cannot advance.
    pub fn advance(&self, cursor: &mut Cursor) -> bool {
        if !self.is_valid(cursor) {
            return false;
        }
        let chunk = &self.chunks[cursor.chunk_index];
        cursor.offset += chunk.record_size(cursor.offset);
        cursor.index += 1;
        cursor.inner_index += 1;
        if cursor.offset >= chunk.tail {
            assert_eq!(
                cursor.inner_index, chunk.num_records,
                "chunk {} record count disagrees with its bytes",
                cursor.chunk_index
            );
            self.seat_at_chunk(cursor, cursor.chunk_index + 1);
        }
        true
    }

    /// Step forward `n` records. Returns the number of steps taken.
    ///
    /// Whole chunks are skipped using their record counts; the remainder is
    /// walked record by record.
    pub fn advance_by(&self, cursor: &mut Cursor, n: usize) -> usize {
        let mut taken = 0;
        while taken < n && self.is_valid(cursor) {
            let chunk = &self.chunks[cursor.chunk_index];
            let left_in_chunk = chunk.num_records - cursor.inner_index;
            if n - taken >= left_in_chunk {
                cursor.index += left_in_chunk;
                taken += left_in_chunk;
                self.seat_at_chunk(cursor, cursor.chunk_index + 1);
            } else {
                self.advance(cursor);
                taken += 1;
            }
        }
        taken
    }

    /// Point `cursor` at the first record of chunk `chunk_index`, or at the
    /// end position past the last chunk.
    fn seat_at_chunk(&self, cursor: &mut Cursor, chunk_index: usize) {
        cursor.chunk_index = chunk_index;
        cursor.inner_index = 0;
        cursor.offset = self.chunks.get(chunk_index).map_or(0, |c| c.head);
    }

    /// The bytes of the record under a valid cursor, slack included.
    pub(crate) fn record(&self, cursor: &Cursor) -> &[u8] {
        self.chunks[cursor.chunk_index].record(cursor.offset)
    }

    /// Record a mutation: invalidate other cursors and keep `cursor` current.
    pub(crate) fn touch(&mut self, cursor: Option<&mut Cursor>) {
        self.generation += 1;
        self.compact = false;
        if let Some(cursor) = cursor {
            cursor.generation = self.generation;
        }
        if self.config.check_invariants {
            self.check_invariants();
        }
    }

    fn column_types(&self) -> Vec<Type> {
        self.schema.iter().map(|c| c.ty).collect()
    }

    // ---------------------------------------------------------------
    // Records
    // ---------------------------------------------------------------

    /// Insert a record before `cursor` (at the end for [`end`](Self::end)).
    ///
    /// Each supplied field is morphed to its column's type; fields beyond the
    /// column count are ignored and missing trailing columns are zero. On
    /// return `cursor` points at the new record.
    pub fn insert(&mut self, cursor: &mut Cursor, fields: &[ValueRef<'_>]) {
        if !self.is_position(cursor) {
            return;
        }
        let types = self.column_types();
        let supplied = fields.len().min(types.len());
        let mut values = fields[..supplied].to_vec();

        let mut size = RECORD_HEADER;
        for (value, &ty) in values.iter_mut().zip(&types) {
            value.morph(ty);
            let reserve = encoding::reserve_size(ty, value, self.config.min_string_reserve);
            size += reserve.max(encoding::encoded_size(ty, value));
        }
        size += types[supplied..]
            .iter()
            .map(|&ty| encoding::min_size(ty))
            .sum::<usize>();

        self.record_make(cursor, size);

        let chunk = &mut self.chunks[cursor.chunk_index];
        let start = cursor.offset;
        encoding::write_record_size(&mut chunk.data[start..], size);
        let mut pos = start + RECORD_HEADER;
        for (value, &ty) in values.iter().zip(&types) {
            pos += encoding::write_value(ty, value, &mut chunk.data[pos..]);
        }
        // Unsupplied columns and slack are already zero: freshly made
        // segments are zero-filled.
        chunk.num_records += 1;
        self.num_records += 1;
        self.touch(Some(cursor));
    }

    /// Append a record and return a cursor to it.
    pub fn push_row(&mut self, fields: &[ValueRef<'_>]) -> Cursor {
        let mut cursor = self.end();
        self.insert(&mut cursor, fields);
        cursor
    }

    /// Remove the record under `cursor`.
    ///
    /// No-op if the cursor does not point at a record. On return `cursor`
    /// points at the record that followed (same index), or the end.
    pub fn remove(&mut self, cursor: &mut Cursor) {
        if !self.is_valid(cursor) {
            return;
        }
        let size = self.chunks[cursor.chunk_index].record_size(cursor.offset);
        let split = self.segment_resize(cursor, size, 0);
        assert!(!split, "shrinking a record never splits a chunk");

        let ci = cursor.chunk_index;
        self.chunks[ci].num_records -= 1;
        self.num_records -= 1;
        if self.chunks[ci].num_records == 0 {
            self.chunks.remove(ci);
            self.seat_at_chunk(cursor, ci);
        } else if cursor.offset >= self.chunks[ci].tail {
            self.seat_at_chunk(cursor, ci + 1);
        }
        self.touch(Some(cursor));
    }

    /// Remove every record. The schema is kept.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.num_records = 0;
        self.touch(None);
        self.compact = true;
    }

    /// Read field `column` of the record under `cursor`.
    ///
    /// Returns null for an invalid cursor or column. Strings borrow the
    /// table's storage.
    pub fn get_field(&self, cursor: &Cursor, column: usize) -> ValueRef<'_> {
        if !self.is_valid(cursor) {
            return ValueRef::null();
        }
        let Some(ty) = self.schema.column_type(column) else {
            return ValueRef::null();
        };
        let record = self.record(cursor);
        let offset = encoding::field_offset(record, &self.schema, column);
        encoding::read_value(ty, &record[offset..])
    }

    /// Overwrite field `column` of the record under `cursor`.
    ///
    /// `value` is morphed to the column type. The field is rewritten in place
    /// when the record's slack allows, otherwise the record is resized (which
    /// may split its chunk). No-op for an invalid cursor or column. On return
    /// `cursor` still points at the same record.
    pub fn set_field(&mut self, cursor: &mut Cursor, column: usize, value: ValueRef<'_>) {
        if !self.is_valid(cursor) {
            return;
        }
        let Some(ty) = self.schema.column_type(column) else {
            return;
        };
        if ty.is_null() {
            return;
        }
        let mut value = value;
        value.morph(ty);

        let (mut record_size, field_start, old_size, data_end) = {
            let record = self.record(cursor);
            let field_start = encoding::field_offset(record, &self.schema, column);
            let old_size = encoding::field_size(ty, &record[field_start..]);
            let data_end = encoding::record_data_size(record, &self.schema);
            (record.len(), field_start, old_size, data_end)
        };
        let new_size = encoding::encoded_size(ty, &value);
        let new_end = data_end - old_size + new_size;

        if new_end > record_size {
            let grown = record_size - old_size + new_size;
            self.segment_resize(cursor, record_size, grown);
            record_size = grown;
        }

        let chunk = &mut self.chunks[cursor.chunk_index];
        let base = cursor.offset;
        encoding::write_record_size(&mut chunk.data[base..], record_size);
        chunk.data.copy_within(
            base + field_start + old_size..base + data_end,
            base + field_start + new_size,
        );
        if new_end < data_end {
            chunk.data[base + new_end..base + data_end].fill(0);
        }
        encoding::write_value(ty, &value, &mut chunk.data[base + field_start..]);
        self.touch(Some(cursor));
    }

    // ---------------------------------------------------------------
    // Schema
    // ---------------------------------------------------------------

    /// Adopt `schema`.
    ///
    /// Returns `true` if the column types changed. Records are then rebuilt
    /// under the new layout: with an unchanged column count every value is
    /// converted position-wise by truncation ([`ValueRef::truncate_to`]),
    /// otherwise the table is cleared. A pure rename keeps the data as is and
    /// returns `false`.
    pub fn configure(&mut self, schema: &TableSchema) -> bool {
        let previous = self.schema.clone();
        if !self.schema.assign(schema) {
            return false;
        }

        let old = Table {
            schema: previous,
            chunks: std::mem::take(&mut self.chunks),
            num_records: std::mem::take(&mut self.num_records),
            config: self.config.clone(),
            generation: self.generation,
            compact: self.compact,
        };
        self.clear();

        if old.schema.len() == self.schema.len() && !self.schema.is_empty() {
            self.migrate_from(&old);
        }
        debug!(
            rows_before = old.num_records,
            rows_after = self.num_records,
            columns = self.schema.len(),
            "table reconfigured with new column types"
        );
        true
    }

    /// Append every record of `old`, converting values to this table's
    /// column types. Both schemas have the same column count.
    fn migrate_from(&mut self, old: &Table) {
        let types = self.column_types();
        let mut src = old.begin();
        let mut dst = self.end();
        let mut fields = Vec::with_capacity(types.len());
        while old.is_valid(&src) {
            fields.clear();
            fields.extend(
                types
                    .iter()
                    .enumerate()
                    .map(|(i, &ty)| old.get_field(&src, i).truncate_to(ty)),
            );
            self.insert(&mut dst, &fields);
            self.advance(&mut dst);
            old.advance(&mut src);
        }
    }

    // ---------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------

    /// Verify chunk bookkeeping.
    ///
    /// # Panics
    ///
    /// Panics on any violation of the table invariants.
    pub fn check_invariants(&self) {
        let mut total = 0;
        for (i, chunk) in self.chunks.iter().enumerate() {
            assert!(
                chunk.head <= chunk.tail && chunk.tail <= chunk.data.len(),
                "chunk {i} bounds out of order: {chunk:?}"
            );
            assert!(chunk.num_records > 0, "chunk {i} is empty");
            let mut offset = chunk.head;
            let mut count = 0;
            while offset < chunk.tail {
                let record = chunk.record(offset);
                let data = encoding::record_data_size(record, &self.schema);
                assert!(
                    data <= record.len(),
                    "chunk {i} record {count} overflows its size ({data} > {})",
                    record.len()
                );
                offset += record.len();
                count += 1;
            }
            assert_eq!(offset, chunk.tail, "chunk {i} records overrun the tail");
            assert_eq!(count, chunk.num_records, "chunk {i} record count mismatch");
            total += count;
        }
        assert_eq!(total, self.num_records, "table record count mismatch");
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(TableSchema::new())
    }
}
