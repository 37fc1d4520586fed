//! In-place resizing of a byte range inside a chunk.
//!
//! Every structural mutation funnels through [`Table::segment_resize`]:
//! making a record grows an empty segment, removing one shrinks it to zero,
//! and rewriting a field resizes the whole record. The segment starts at the
//! cursor's offset. Growth uses slack on the side that moves fewer bytes; when
//! neither side has room the chunk is split and the segment lands in a fresh
//! chunk of at least the configured size.

use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::cursor::Cursor;
use crate::table::Table;

impl Table {
    /// Reserve `size` zeroed bytes for a new record before `cursor`.
    ///
    /// Allocates the first chunk of an empty table. On return `cursor`
    /// addresses the new segment; the caller writes the record and bumps the
    /// record counters.
    pub(crate) fn record_make(&mut self, cursor: &mut Cursor, size: usize) {
        if self.chunks.is_empty() {
            self.chunks
                .push(Chunk::with_capacity(self.config.chunk_size.max(size)));
            cursor.chunk_index = 0;
            cursor.inner_index = 0;
            cursor.offset = 0;
        } else if cursor.chunk_index >= self.chunks.len() {
            self.seat_after_last(cursor, self.chunks.len() - 1);
        } else if cursor.inner_index == 0 && cursor.chunk_index > 0 {
            // At a chunk boundary, appending to the previous chunk is free
            // when it has room and this chunk does not.
            let ci = cursor.chunk_index;
            if self.chunks[ci].space_head() < size && self.chunks[ci - 1].space_tail() >= size {
                self.seat_after_last(cursor, ci - 1);
            }
        }
        self.segment_resize(cursor, 0, size);
    }

    fn seat_after_last(&self, cursor: &mut Cursor, chunk_index: usize) {
        let chunk = &self.chunks[chunk_index];
        cursor.chunk_index = chunk_index;
        cursor.inner_index = chunk.num_records;
        cursor.offset = chunk.tail;
    }

    /// Resize the `old`-byte segment at `cursor` to `new` bytes.
    ///
    /// Shrinking keeps the first `new` bytes; growing keeps the old bytes and
    /// zero-fills the rest. `cursor` is moved to wherever the segment ends up.
    /// Returns `true` if a chunk was split.
    pub(crate) fn segment_resize(&mut self, cursor: &mut Cursor, old: usize, new: usize) -> bool {
        let ci = cursor.chunk_index;
        let chunk = &mut self.chunks[ci];
        let start = cursor.offset;
        let before = start - chunk.head;
        let after = chunk.tail - (start + old);

        if new <= old {
            let delta = old - new;
            if delta == 0 {
                return false;
            }
            if before + new < after {
                chunk.data.copy_within(chunk.head..start + new, chunk.head + delta);
                chunk.head += delta;
                cursor.offset += delta;
                trace!(chunk = ci, bytes = before + new, delta, "shrink: shifted head side right");
            } else {
                chunk.data.copy_within(start + old..chunk.tail, start + new);
                chunk.tail -= delta;
                trace!(chunk = ci, bytes = after, delta, "shrink: shifted tail side left");
            }
            return false;
        }

        let delta = new - old;
        let head_room = chunk.space_head() >= delta;
        let tail_room = chunk.space_tail() >= delta;

        if head_room && (!tail_room || before < after) {
            chunk.data.copy_within(chunk.head..start + old, chunk.head - delta);
            chunk.head -= delta;
            cursor.offset -= delta;
            let grown = cursor.offset + old..cursor.offset + new;
            chunk.data[grown].fill(0);
            trace!(chunk = ci, bytes = before + old, delta, "grow: shifted head side left");
            return false;
        }
        if tail_room {
            chunk.data.copy_within(start + old..chunk.tail, start + new);
            chunk.tail += delta;
            chunk.data[start + old..start + new].fill(0);
            trace!(chunk = ci, bytes = after, delta, "grow: shifted tail side right");
            return false;
        }

        if before == 0 && after == 0 {
            // The segment is all the chunk holds: reallocate instead of
            // splitting.
            let mut data = vec![0u8; self.config.chunk_size.max(new)];
            data[..old].copy_from_slice(&chunk.data[start..start + old]);
            chunk.data = data;
            chunk.head = 0;
            chunk.tail = new;
            cursor.offset = 0;
            debug!(chunk = ci, capacity = chunk.data.len(), "chunk reallocated");
            return false;
        }

        if before < after {
            self.split_head(cursor, old, new, before);
        } else {
            self.split_tail(cursor, old, new, after);
        }
        true
    }

    /// Move everything up to the end of the segment into a new chunk in
    /// front of the current one, with the segment grown to `new` bytes.
    fn split_head(&mut self, cursor: &mut Cursor, old: usize, new: usize, before: usize) {
        let ci = cursor.chunk_index;
        let capacity = self.config.chunk_size.max(before + new);
        let mut fresh = Chunk::with_capacity(capacity);
        fresh.head = capacity - (before + new);
        fresh.tail = capacity;

        let original = &mut self.chunks[ci];
        let start = cursor.offset;
        let moved = cursor.inner_index + usize::from(old > 0);
        fresh.data[fresh.head..fresh.head + before + old]
            .copy_from_slice(&original.data[original.head..start + old]);
        fresh.num_records = moved;
        original.head = start + old;
        original.num_records -= moved;

        cursor.offset = fresh.head + before;
        debug!(
            chunk = ci,
            moved_records = moved,
            moved_bytes = before + old,
            capacity,
            "chunk split at head"
        );
        self.chunks.insert(ci, fresh);
    }

    /// Move the segment and everything after it into a new chunk behind the
    /// current one, with the segment grown to `new` bytes.
    fn split_tail(&mut self, cursor: &mut Cursor, old: usize, new: usize, after: usize) {
        let ci = cursor.chunk_index;
        let capacity = self.config.chunk_size.max(new + after);
        let mut fresh = Chunk::with_capacity(capacity);
        fresh.tail = new + after;

        let original = &mut self.chunks[ci];
        let start = cursor.offset;
        let moved = original.num_records - cursor.inner_index;
        fresh.data[..old].copy_from_slice(&original.data[start..start + old]);
        fresh.data[new..new + after].copy_from_slice(&original.data[start + old..original.tail]);
        fresh.num_records = moved;
        original.tail = start;
        original.num_records -= moved;

        cursor.chunk_index = ci + 1;
        cursor.inner_index = 0;
        cursor.offset = 0;
        debug!(
            chunk = ci,
            moved_records = moved,
            moved_bytes = old + after,
            capacity,
            "chunk split at tail"
        );
        self.chunks.insert(ci + 1, fresh);
    }
}

#[cfg(test)]
mod tests {
    use hive_schema::TableSchema;
    use hive_types::{SizeClass, Type, ValueRef};

    use super::*;
    use crate::config::TableConfig;

    fn small_table(columns: &[(&str, Type)]) -> Table {
        let schema = TableSchema::from_columns(columns.iter().copied()).unwrap();
        let config = TableConfig {
            chunk_size: 64,
            min_string_reserve: 0,
            check_invariants: true,
        };
        Table::with_config(schema, config).unwrap()
    }

    #[test]
    fn appends_fill_a_chunk_then_open_a_new_one() {
        let mut table = small_table(&[("x", Type::uint64())]);
        // 12-byte records: five fit in a 64-byte chunk.
        for i in 0..5u64 {
            table.push_row(&[ValueRef::u64(i)]);
        }
        assert_eq!(table.num_chunks(), 1);
        table.push_row(&[ValueRef::u64(5)]);
        assert_eq!(table.num_chunks(), 2);
        assert_eq!(table.chunks()[0].num_records(), 5);
        assert_eq!(table.chunks()[1].num_records(), 1);

        let values: Vec<u64> = table
            .rows()
            .map(|row| row.get(0).integer_unsigned())
            .collect();
        assert_eq!(values, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn insert_at_front_of_full_chunk_splits_head() {
        let mut table = small_table(&[("x", Type::uint64())]);
        for i in 1..=5u64 {
            table.push_row(&[ValueRef::u64(i)]);
        }
        let mut cursor = table.begin();
        table.insert(&mut cursor, &[ValueRef::u64(0)]);
        assert_eq!(cursor.index(), 0);
        assert_eq!(table.get_field(&cursor, 0).integer_unsigned(), 0);
        assert_eq!(table.num_chunks(), 2);
        assert_eq!(table.chunks()[0].num_records(), 1);

        let values: Vec<u64> = table
            .rows()
            .map(|row| row.get(0).integer_unsigned())
            .collect();
        assert_eq!(values, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn insert_in_middle_of_full_chunk_splits_tail() {
        let mut table = small_table(&[("x", Type::uint64())]);
        for i in [0u64, 1, 2, 4, 5] {
            table.push_row(&[ValueRef::u64(i)]);
        }
        let mut cursor = table.cursor_at(3);
        table.insert(&mut cursor, &[ValueRef::u64(3)]);
        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.chunk_index(), 1);
        assert_eq!(table.get_field(&cursor, 0).integer_unsigned(), 3);

        let values: Vec<u64> = table
            .rows()
            .map(|row| row.get(0).integer_unsigned())
            .collect();
        assert_eq!(values, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn removing_from_the_front_frees_head_slack() {
        let mut table = small_table(&[("x", Type::uint64())]);
        for i in 0..4u64 {
            table.push_row(&[ValueRef::u64(i)]);
        }
        let mut cursor = table.begin();
        table.remove(&mut cursor);
        // The cheaper move is the empty head side.
        assert_eq!(table.chunks()[0].head(), 12);
        assert_eq!(table.get_field(&cursor, 0).integer_unsigned(), 1);
    }

    #[test]
    fn growing_a_lone_record_reallocates_its_chunk() {
        let mut table = small_table(&[("s", Type::string(SizeClass::Bits16))]);
        let mut cursor = table.push_row(&[ValueRef::string("a")]);
        let long = "z".repeat(100);
        table.set_field(&mut cursor, 0, ValueRef::string(&long));
        assert_eq!(table.num_chunks(), 1);
        assert_eq!(table.get_field(&cursor, 0).as_str(), Some(long.as_str()));
    }

    #[test]
    fn growing_past_a_full_chunk_keeps_neighbours_intact() {
        let mut table = small_table(&[
            ("s", Type::string(SizeClass::Bits8)),
            ("n", Type::uint16()),
        ]);
        for i in 0..6u16 {
            table.push_row(&[ValueRef::string("ab"), ValueRef::u16(i)]);
        }
        let mut cursor = table.cursor_at(2);
        let long = "q".repeat(80);
        table.set_field(&mut cursor, 0, ValueRef::string(&long));
        assert_eq!(table.get_field(&cursor, 0).as_str(), Some(long.as_str()));
        assert_eq!(table.get_field(&cursor, 1).integer_unsigned(), 2);

        for (i, row) in table.rows().enumerate() {
            assert_eq!(row.get(1).integer_unsigned(), i as u64);
            if i != 2 {
                assert_eq!(row.get(0).as_str(), Some("ab"));
            }
        }
    }
}
