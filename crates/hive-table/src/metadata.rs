//! Name/value store layered on a two-column [`Table`].
//!
//! Uses only the public table API: names live in a `string8` column and
//! values in a `dynamic` column, so each entry keeps its own type.

use std::io::{Read, Write};

use hive_schema::{SchemaError, TableSchema};
use hive_types::{SizeClass, Type, ValueRef};

use crate::cursor::Cursor;
use crate::error::{TableError, TableResult};
use crate::table::Table;

const NAME: usize = 0;
const VALUE: usize = 1;

/// Longest accepted entry name, in bytes.
pub const MAX_KEY_LEN: usize = 255;

fn metadata_schema() -> TableSchema {
    TableSchema::from_columns([
        ("name", Type::string(SizeClass::Bits8)),
        ("value", Type::dynamic()),
    ])
    .expect("metadata schema has two distinct, typed columns")
}

/// Ordered name/value pairs with per-entry value types.
#[derive(Debug)]
pub struct Metadata {
    table: Table,
}

impl Metadata {
    pub fn new() -> Self {
        Self {
            table: Table::new(metadata_schema()),
        }
    }

    /// The backing table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn find(&self, name: &str) -> Option<Cursor> {
        self.table
            .rows()
            .find(|row| row.get(NAME).as_bytes() == name.as_bytes())
            .map(|row| row.cursor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The value stored under `name`.
    pub fn get(&self, name: &str) -> Option<ValueRef<'_>> {
        let cursor = self.find(name)?;
        Some(self.table.get_field(&cursor, VALUE))
    }

    /// Store `value` under `name`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: ValueRef<'_>) -> TableResult<()> {
        if name.is_empty() || name.len() > MAX_KEY_LEN {
            return Err(TableError::InvalidKey(name.to_string()));
        }
        match self.find(name) {
            Some(mut cursor) => self.table.set_field(&mut cursor, VALUE, value),
            None => {
                self.table.push_row(&[ValueRef::string(name), value]);
            }
        }
        Ok(())
    }

    /// Remove the entry under `name`. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some(mut cursor) => {
                self.table.remove(&mut cursor);
                true
            }
            None => false,
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueRef<'_>)> + '_ {
        self.table
            .rows()
            .map(|row| (row.get(NAME).as_str().unwrap_or_default(), row.get(VALUE)))
    }

    pub fn write<W: Write>(&mut self, w: &mut W) -> TableResult<()> {
        self.table.write(w)
    }

    /// Read metadata written by [`write`](Self::write).
    ///
    /// Fails if the stored table does not have the metadata layout.
    pub fn read<R: Read>(r: &mut R) -> TableResult<Self> {
        let table = Table::read(r)?;
        if *table.schema() != metadata_schema() {
            return Err(SchemaError::Corrupt(format!(
                "expected metadata columns, found {} columns ({})",
                table.schema().len(),
                table.schema().hash().short_hex()
            ))
            .into());
        }
        Ok(Self { table })
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
