use std::mem;

use tracing::debug;

use crate::chunk::Chunk;
use crate::encoding;
use crate::table::Table;

impl Table {
    /// Repack every record into fresh chunks, dropping growth slack.
    ///
    /// Records are visited in order and copied at their occupied size into
    /// chunks of the configured size. Values are unchanged, but all cursors
    /// are invalidated. Does nothing if the table is already compact.
    pub fn optimize_storage(&mut self) {
        if self.compact {
            return;
        }
        let target = self.config.chunk_size;
        let before_chunks = self.chunks.len();
        let before_bytes: usize = self.chunks.iter().map(Chunk::used).sum();

        let mut packed = Vec::new();
        let mut current = Chunk::with_capacity(target);
        for chunk in &self.chunks {
            let mut offset = chunk.head;
            while offset < chunk.tail {
                let record = chunk.record(offset);
                let data = encoding::record_data_size(record, &self.schema);
                if current.space_tail() < data {
                    let full = mem::replace(&mut current, Chunk::with_capacity(target.max(data)));
                    if full.num_records > 0 {
                        packed.push(full);
                    }
                }
                current.push_record(&record[..data]);
                offset += record.len();
            }
        }
        if current.num_records > 0 {
            packed.push(current);
        }

        let after_bytes: usize = packed.iter().map(Chunk::used).sum();
        self.chunks = packed;
        self.generation += 1;
        self.compact = true;
        if self.config.check_invariants {
            self.check_invariants();
        }
        debug!(
            records = self.num_records,
            chunks_before = before_chunks,
            chunks_after = self.chunks.len(),
            bytes_before = before_bytes,
            bytes_after = after_bytes,
            "table storage compacted"
        );
    }
}
