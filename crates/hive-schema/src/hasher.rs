use std::fmt;

use hive_types::Type;

/// Content hash of a schema.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SchemaHash([u8; 32]);

impl SchemaHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaHash({})", self.short_hex())
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Domain-separated BLAKE3 hasher over a column list.
///
/// The digest covers the column count, then each column's type tag and
/// name, in order. Column positions are implied by order and are not hashed
/// separately.
pub struct SchemaHasher {
    inner: blake3::Hasher,
}

impl SchemaHasher {
    /// Domain tag prepended to every schema hash.
    pub const DOMAIN: &'static str = "hive-schema-v1";

    pub fn new(column_count: usize) -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(Self::DOMAIN.as_bytes());
        inner.update(b":");
        inner.update(&(column_count as u32).to_le_bytes());
        Self { inner }
    }

    pub fn column(&mut self, name: &str, ty: Type) -> &mut Self {
        self.inner.update(&ty.to_bits().to_le_bytes());
        self.inner.update(&(name.len() as u32).to_le_bytes());
        self.inner.update(name.as_bytes());
        self
    }

    pub fn finish(&self) -> SchemaHash {
        SchemaHash(*self.inner.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = SchemaHasher::new(1).column("x", Type::int16()).finish();
        let b = SchemaHasher::new(1).column("x", Type::int16()).finish();
        assert_eq!(a, b);
    }

    #[test]
    fn name_type_and_count_all_matter() {
        let base = SchemaHasher::new(1).column("x", Type::int16()).finish();
        assert_ne!(base, SchemaHasher::new(1).column("y", Type::int16()).finish());
        assert_ne!(base, SchemaHasher::new(1).column("x", Type::uint16()).finish());
        assert_ne!(base, SchemaHasher::new(2).column("x", Type::int16()).finish());
    }

    #[test]
    fn name_boundaries_are_unambiguous() {
        let a = SchemaHasher::new(2)
            .column("ab", Type::int8())
            .column("c", Type::int8())
            .finish();
        let b = SchemaHasher::new(2)
            .column("a", Type::int8())
            .column("bc", Type::int8())
            .finish();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_schema_hash_is_not_default() {
        assert_ne!(SchemaHasher::new(0).finish(), SchemaHash::default());
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(SchemaHasher::new(0).finish().short_hex().len(), 8);
    }
}
