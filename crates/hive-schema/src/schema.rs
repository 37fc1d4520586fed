use std::io::{Read, Write};

use hive_types::{wire, Type};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::hasher::{SchemaHash, SchemaHasher};

/// Current on-wire schema format version.
pub const SCHEMA_FORMAT_VERSION: u32 = 0;

/// Column count limit imposed by the one-byte count prefix.
pub const MAX_COLUMNS: usize = u8::MAX as usize;

/// Column name limit imposed by the one-byte length prefix.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// A named, typed column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: Type,
    /// Position within the owning schema. Maintained by the schema.
    pub index: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            index: 0,
        }
    }
}

/// Ordered list of columns plus a content hash.
///
/// Equality is hash equality: two schemas are the same when they have the
/// same column names and types in the same order.
#[derive(Clone, Debug)]
pub struct TableSchema {
    hash: SchemaHash,
    columns: Vec<Column>,
}

impl TableSchema {
    /// An empty schema.
    pub fn new() -> Self {
        let mut schema = Self {
            hash: SchemaHash::default(),
            columns: Vec::new(),
        };
        schema.update();
        schema
    }

    /// Build a schema from `(name, type)` pairs, validating each column.
    pub fn from_columns<I, S>(columns: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        let mut schema = Self::new();
        for (name, ty) in columns {
            schema.push(name, ty)?;
        }
        Ok(schema)
    }

    pub fn hash(&self) -> SchemaHash {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Type of the column at `index`, or `None` when out of range.
    pub fn column_type(&self, index: usize) -> Option<Type> {
        self.columns.get(index).map(|c| c.ty)
    }

    pub fn find(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Reindex the columns and recompute the hash.
    ///
    /// Returns `true` if the hash changed.
    pub fn update(&mut self) -> bool {
        let mut hasher = SchemaHasher::new(self.columns.len());
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.index = i;
            hasher.column(&column.name, column.ty);
        }
        let hash = hasher.finish();
        let changed = hash != self.hash;
        self.hash = hash;
        changed
    }

    /// Insert a column at `index` (`0..=len`).
    pub fn insert(&mut self, index: usize, name: impl Into<String>, ty: Type) -> SchemaResult<()> {
        let name = name.into();
        if index > self.columns.len() {
            return Err(SchemaError::ColumnIndexOutOfRange {
                index,
                len: self.columns.len(),
            });
        }
        if self.columns.len() >= MAX_COLUMNS {
            return Err(SchemaError::TooManyColumns { max: MAX_COLUMNS });
        }
        if ty.is_null() {
            return Err(SchemaError::ColumnInvalid { index });
        }
        self.check_name(&name, None)?;
        self.columns.insert(index, Column::new(name, ty));
        self.update();
        Ok(())
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, ty: Type) -> SchemaResult<()> {
        self.insert(self.columns.len(), name, ty)
    }

    /// Remove and return the column at `index`.
    pub fn remove(&mut self, index: usize) -> SchemaResult<Column> {
        if index >= self.columns.len() {
            return Err(SchemaError::ColumnIndexOutOfRange {
                index,
                len: self.columns.len(),
            });
        }
        let column = self.columns.remove(index);
        self.update();
        Ok(column)
    }

    /// Rename the column at `index`. Its type is unchanged.
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> SchemaResult<()> {
        let name = name.into();
        if index >= self.columns.len() {
            return Err(SchemaError::ColumnIndexOutOfRange {
                index,
                len: self.columns.len(),
            });
        }
        self.check_name(&name, Some(index))?;
        self.columns[index].name = name;
        self.update();
        Ok(())
    }

    /// Returns `true` if the position-wise column types differ from
    /// `other`'s, counting a different column count as a difference.
    pub fn layout_differs(&self, other: &TableSchema) -> bool {
        self.columns.len() != other.columns.len()
            || self
                .columns
                .iter()
                .zip(&other.columns)
                .any(|(a, b)| a.ty != b.ty)
    }

    /// Replace this schema with `other`.
    ///
    /// Returns `true` if the column types changed, i.e. records laid out for
    /// the previous schema cannot be read under the new one. A schema that
    /// only renames columns reports `false`.
    pub fn assign(&mut self, other: &TableSchema) -> bool {
        let changed = self.layout_differs(other);
        self.columns.clone_from(&other.columns);
        self.update();
        changed
    }

    fn check_name(&self, name: &str, skip: Option<usize>) -> SchemaResult<()> {
        if name.is_empty() {
            return Err(SchemaError::ColumnNameEmpty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(SchemaError::ColumnNameTooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        let shared = self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| Some(i) != skip && c.name == name);
        if shared {
            return Err(SchemaError::ColumnNameShared(name.to_string()));
        }
        Ok(())
    }

    /// Serialize:
    ///
    /// ```text
    /// format_version: u32
    /// column_count:   u8
    /// column*:        name_len: u8, name: [u8], type: u32
    /// ```
    pub fn write<W: Write>(&self, w: &mut W) -> SchemaResult<()> {
        let count = u8::try_from(self.columns.len())
            .map_err(|_| SchemaError::TooManyColumns { max: MAX_COLUMNS })?;
        wire::write_u32(w, SCHEMA_FORMAT_VERSION)?;
        wire::write_u8(w, count)?;
        for column in &self.columns {
            let len = u8::try_from(column.name.len()).map_err(|_| SchemaError::ColumnNameTooLong {
                len: column.name.len(),
                max: MAX_NAME_LEN,
            })?;
            wire::write_u8(w, len)?;
            w.write_all(column.name.as_bytes())?;
            wire::write_u32(w, column.ty.to_bits())?;
        }
        Ok(())
    }

    /// Deserialize a schema written by [`write`](Self::write).
    ///
    /// Column definitions are validated exactly like edits; any violation is
    /// reported as [`SchemaError::Corrupt`].
    pub fn read<R: Read>(r: &mut R) -> SchemaResult<Self> {
        let version = wire::read_u32(r)?;
        if version != SCHEMA_FORMAT_VERSION {
            return Err(SchemaError::UnsupportedVersion(version));
        }
        let count = wire::read_u8(r)? as usize;
        let mut schema = Self::new();
        for index in 0..count {
            let len = wire::read_u8(r)? as usize;
            let name = String::from_utf8(wire::read_vec(r, len)?)
                .map_err(|_| SchemaError::Corrupt(format!("column {index} name is not UTF-8")))?;
            let bits = wire::read_u32(r)?;
            let ty = Type::from_bits(bits)
                .map_err(|e| SchemaError::Corrupt(format!("column {index}: {e}")))?;
            schema
                .push(name, ty)
                .map_err(|e| SchemaError::Corrupt(format!("column {index}: {e}")))?;
        }
        debug!(columns = count, hash = %schema.hash.short_hex(), "schema decoded");
        Ok(schema)
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for TableSchema {}

impl<'a> IntoIterator for &'a TableSchema {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
