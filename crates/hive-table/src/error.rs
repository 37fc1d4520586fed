use hive_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    /// Schema edit rejected, or the serialized schema is unreadable.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("unsupported table format version: {0}")]
    UnsupportedVersion(u32),

    /// Malformed chunk data encountered while decoding.
    #[error("corrupt chunk {chunk}: {reason}")]
    Corrupt { chunk: usize, reason: String },

    #[error("invalid table config: {0}")]
    InvalidConfig(String),

    #[error("invalid metadata key: {0:?}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    /// Returns `true` when the underlying byte source or sink failed, as
    /// opposed to the bytes themselves being malformed.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Schema(SchemaError::Io(_)))
    }
}

pub type TableResult<T> = Result<T, TableError>;
