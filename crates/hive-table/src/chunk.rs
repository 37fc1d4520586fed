use std::fmt;

use crate::encoding;

/// A fixed-capacity byte buffer holding a contiguous run of packed records.
///
/// The live bytes are `data[head..tail]`. Free space on either side is slack
/// that records can grow into without reallocating.
pub struct Chunk {
    pub(crate) data: Vec<u8>,
    pub(crate) head: usize,
    pub(crate) tail: usize,
    pub(crate) num_records: usize,
}

impl Chunk {
    /// A zero-filled chunk with no records.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            head: 0,
            tail: 0,
            num_records: 0,
        }
    }

    /// A chunk whose live range is all of `data`.
    pub(crate) fn from_records(data: Vec<u8>, num_records: usize) -> Self {
        let tail = data.len();
        Self {
            data,
            head: 0,
            tail,
            num_records,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// Bytes occupied by records, slack included.
    pub fn used(&self) -> usize {
        self.tail - self.head
    }

    /// Free bytes before the first record.
    pub fn space_head(&self) -> usize {
        self.head
    }

    /// Free bytes after the last record.
    pub fn space_tail(&self) -> usize {
        self.data.len() - self.tail
    }

    /// The live record bytes.
    pub fn live(&self) -> &[u8] {
        &self.data[self.head..self.tail]
    }

    /// Stored size of the record starting at `offset`.
    pub(crate) fn record_size(&self, offset: usize) -> usize {
        encoding::record_size(&self.data[offset..self.tail])
    }

    /// The record starting at `offset`, slack included.
    pub(crate) fn record(&self, offset: usize) -> &[u8] {
        let size = self.record_size(offset);
        &self.data[offset..offset + size]
    }

    /// Append `record` at the tail, rewriting its header to its length.
    ///
    /// The caller guarantees there is room.
    pub(crate) fn push_record(&mut self, record: &[u8]) {
        let start = self.tail;
        let end = start + record.len();
        self.data[start..end].copy_from_slice(record);
        encoding::write_record_size(&mut self.data[start..end], record.len());
        self.tail = end;
        self.num_records += 1;
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("capacity", &self.data.len())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("num_records", &self.num_records)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_chunk_is_all_tail_space() {
        let chunk = Chunk::with_capacity(128);
        assert_eq!(chunk.capacity(), 128);
        assert_eq!(chunk.space_head(), 0);
        assert_eq!(chunk.space_tail(), 128);
        assert_eq!(chunk.used(), 0);
        assert!(chunk.live().is_empty());
    }

    #[test]
    fn push_record_rewrites_header() {
        let mut chunk = Chunk::with_capacity(64);
        chunk.push_record(&[99, 0, 0, 0, 7, 8]);
        assert_eq!(chunk.num_records(), 1);
        assert_eq!(chunk.record_size(0), 6);
        assert_eq!(chunk.record(0), &[6, 0, 0, 0, 7, 8]);
        assert_eq!(chunk.space_tail(), 58);
    }
}
