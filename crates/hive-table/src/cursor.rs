use std::cmp::Ordering;

/// Position of a record within a [`Table`](crate::Table).
///
/// A cursor is a plain value: it does not borrow the table. Every mutation
/// advances the table's generation, and a cursor from an older generation is
/// treated as invalid, except the cursor handed to `insert`, `remove`, or
/// `set_field`, which is repositioned and stays usable.
///
/// Cursors compare by logical record index only.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub(crate) index: usize,
    pub(crate) chunk_index: usize,
    pub(crate) inner_index: usize,
    pub(crate) offset: usize,
    pub(crate) generation: u64,
}

impl Cursor {
    /// Logical record index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Chunk holding the record.
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Record position within its chunk.
    pub fn inner_index(&self) -> usize {
        self.inner_index
    }

    /// Byte offset of the record within its chunk's buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Cursor {}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}
