use std::iter::FusedIterator;

use hive_types::ValueRef;

use crate::cursor::Cursor;
use crate::table::Table;

/// Iterator over the rows of a [`Table`], in order.
///
/// Created by [`Table::rows`]. The shared borrow keeps the table from being
/// mutated while rows are alive.
pub struct Rows<'t> {
    table: &'t Table,
    cursor: Cursor,
}

impl<'t> Rows<'t> {
    pub(crate) fn new(table: &'t Table) -> Self {
        Self {
            table,
            cursor: table.begin(),
        }
    }
}

impl<'t> Iterator for Rows<'t> {
    type Item = Row<'t>;

    fn next(&mut self) -> Option<Row<'t>> {
        if !self.table.is_valid(&self.cursor) {
            return None;
        }
        let row = Row {
            table: self.table,
            cursor: self.cursor,
        };
        self.table.advance(&mut self.cursor);
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.table.num_rows().saturating_sub(self.cursor.index());
        (left, Some(left))
    }
}

impl ExactSizeIterator for Rows<'_> {}

impl FusedIterator for Rows<'_> {}

/// A view of one record.
#[derive(Clone, Copy)]
pub struct Row<'t> {
    table: &'t Table,
    cursor: Cursor,
}

impl<'t> Row<'t> {
    /// Position of this row in the table.
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    /// Field `column`, or null if out of range.
    pub fn get(&self, column: usize) -> ValueRef<'t> {
        self.table.get_field(&self.cursor, column)
    }

    /// Every field in column order.
    pub fn values(&self) -> Vec<ValueRef<'t>> {
        (0..self.table.schema().len()).map(|c| self.get(c)).collect()
    }

    /// A cursor at this row, usable for mutation once the borrow ends.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}
