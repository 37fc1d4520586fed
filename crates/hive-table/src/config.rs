use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Smallest chunk size accepted by [`TableConfig::validate`].
pub const MIN_CHUNK_SIZE: usize = 64;

/// Storage tuning for a [`Table`](crate::Table).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Target size of a freshly allocated chunk, in bytes. Records larger
    /// than this get a chunk of their own.
    pub chunk_size: usize,
    /// Minimum payload room reserved for a variable-length field on insert.
    /// Reservations grow to the next power of two above the value's length.
    pub min_string_reserve: usize,
    /// Run [`Table::check_invariants`](crate::Table::check_invariants) after
    /// every mutation. The check scans the whole table, so leave it off
    /// outside of tests.
    pub check_invariants: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            min_string_reserve: 8,
            check_invariants: false,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> TableResult<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(TableError::InvalidConfig(format!(
                "chunk_size {} is below the minimum of {MIN_CHUNK_SIZE}",
                self.chunk_size
            )));
        }
        if self.chunk_size > u32::MAX as usize {
            return Err(TableError::InvalidConfig(format!(
                "chunk_size {} does not fit a u32 length",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = TableConfig::default();
        assert_eq!(c.chunk_size, 8192);
        assert_eq!(c.min_string_reserve, 8);
        assert!(!c.check_invariants);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn tiny_chunks_are_rejected() {
        let c = TableConfig {
            chunk_size: 16,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(TableError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: TableConfig = serde_json::from_str(r#"{"chunk_size": 256}"#).unwrap();
        assert_eq!(c.chunk_size, 256);
        assert_eq!(c.min_string_reserve, 8);
        assert!(!c.check_invariants);
    }

    #[test]
    fn json_roundtrip() {
        let c = TableConfig {
            chunk_size: 1024,
            min_string_reserve: 32,
            check_invariants: true,
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<TableConfig>(&json).unwrap(), c);
    }
}
