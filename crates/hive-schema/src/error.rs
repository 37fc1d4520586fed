use thiserror::Error;

/// Errors from schema edits and schema decoding.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A column was given an empty name.
    #[error("column name is empty")]
    ColumnNameEmpty,

    /// Another column already uses this name.
    #[error("column name already in use: {0}")]
    ColumnNameShared(String),

    /// Column name does not fit the one-byte length prefix.
    #[error("column name is {len} bytes, limit is {max}")]
    ColumnNameTooLong { len: usize, max: usize },

    /// Column declared with an unusable (null) type.
    #[error("column {index} has an invalid type")]
    ColumnInvalid { index: usize },

    /// Column index outside the schema.
    #[error("column index {index} out of range for {len} columns")]
    ColumnIndexOutOfRange { index: usize, len: usize },

    /// The schema already holds the maximum number of columns.
    #[error("schema is full ({max} columns)")]
    TooManyColumns { max: usize },

    #[error("unsupported schema format version: {0}")]
    UnsupportedVersion(u32),

    /// Malformed bytes encountered while decoding.
    #[error("corrupt schema: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
