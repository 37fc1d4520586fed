use std::fmt;

use bitflags::bitflags;

use crate::error::TypeError;

/// What a value is, independent of its width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueKind {
    /// No value.
    Null = 0,
    /// Placeholder resolved per value from an embedded type tag.
    Dynamic = 1,
    /// Signed or unsigned two's complement integer.
    Integer = 2,
    /// IEEE 754 floating point.
    Decimal = 3,
    /// Reference to another hive object.
    ObjectId = 4,
    /// Length-prefixed byte string.
    String = 5,
}

impl ValueKind {
    /// Parse from the kind byte of a type tag.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Null),
            1 => Some(Self::Dynamic),
            2 => Some(Self::Integer),
            3 => Some(Self::Decimal),
            4 => Some(Self::ObjectId),
            5 => Some(Self::String),
            _ => None,
        }
    }
}

/// Width class of a type: 8, 16, 32 or 64 bits.
///
/// For fixed-size kinds it selects the scalar width. For variable-size kinds
/// it selects the width of the length prefix and therefore the maximum
/// payload length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SizeClass {
    Bits8 = 0,
    Bits16 = 1,
    Bits32 = 2,
    Bits64 = 3,
}

impl SizeClass {
    /// Parse from the size byte of a type tag.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Bits8),
            1 => Some(Self::Bits16),
            2 => Some(Self::Bits32),
            3 => Some(Self::Bits64),
            _ => None,
        }
    }

    /// Width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Bytes used by the length prefix of a variable-size value.
    ///
    /// The prefix never exceeds 4 bytes; the 64-bit class shares the 32-bit
    /// prefix.
    pub const fn length_prefix(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Bits32 | Self::Bits64 => 4,
        }
    }

    /// Largest payload length a variable-size value of this class can carry.
    pub const fn max_length(self) -> usize {
        match self {
            Self::Bits8 => u8::MAX as usize,
            Self::Bits16 => u16::MAX as usize,
            Self::Bits32 | Self::Bits64 => u32::MAX as usize,
        }
    }

    /// The smallest class whose length prefix can describe `len` bytes.
    pub fn fitting(len: usize) -> Self {
        if len <= Self::Bits8.max_length() {
            Self::Bits8
        } else if len <= Self::Bits16.max_length() {
            Self::Bits16
        } else {
            Self::Bits32
        }
    }
}

bitflags! {
    /// Modifier bits carried in a type tag.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Integer is signed. Meaningless for other kinds.
        const SIGNED = 0b0000_0001;
    }
}

/// Type descriptor for a column or a value.
///
/// Packs into a `u32` tag for storage: `kind | size_class << 8 | flags << 16`.
/// The all-zero tag is the null type, so zero-filled bytes decode as null.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    kind: ValueKind,
    size: SizeClass,
    flags: TypeFlags,
}

impl Type {
    /// Build a type. Flags are dropped for kinds other than integer.
    pub const fn new(kind: ValueKind, size: SizeClass, flags: TypeFlags) -> Self {
        let flags = match kind {
            ValueKind::Integer => flags,
            _ => TypeFlags::empty(),
        };
        Self { kind, size, flags }
    }

    pub const fn null() -> Self {
        Self::new(ValueKind::Null, SizeClass::Bits8, TypeFlags::empty())
    }

    pub const fn dynamic() -> Self {
        Self::new(ValueKind::Dynamic, SizeClass::Bits8, TypeFlags::empty())
    }

    pub const fn integer(size: SizeClass, signed: bool) -> Self {
        let flags = if signed {
            TypeFlags::SIGNED
        } else {
            TypeFlags::empty()
        };
        Self::new(ValueKind::Integer, size, flags)
    }

    pub const fn int8() -> Self {
        Self::integer(SizeClass::Bits8, true)
    }

    pub const fn int16() -> Self {
        Self::integer(SizeClass::Bits16, true)
    }

    pub const fn int32() -> Self {
        Self::integer(SizeClass::Bits32, true)
    }

    pub const fn int64() -> Self {
        Self::integer(SizeClass::Bits64, true)
    }

    pub const fn uint8() -> Self {
        Self::integer(SizeClass::Bits8, false)
    }

    pub const fn uint16() -> Self {
        Self::integer(SizeClass::Bits16, false)
    }

    pub const fn uint32() -> Self {
        Self::integer(SizeClass::Bits32, false)
    }

    pub const fn uint64() -> Self {
        Self::integer(SizeClass::Bits64, false)
    }

    pub const fn decimal(size: SizeClass) -> Self {
        Self::new(ValueKind::Decimal, size, TypeFlags::empty())
    }

    pub const fn float32() -> Self {
        Self::decimal(SizeClass::Bits32)
    }

    pub const fn float64() -> Self {
        Self::decimal(SizeClass::Bits64)
    }

    pub const fn object_id() -> Self {
        Self::new(ValueKind::ObjectId, SizeClass::Bits64, TypeFlags::empty())
    }

    pub const fn string(size: SizeClass) -> Self {
        Self::new(ValueKind::String, size, TypeFlags::empty())
    }

    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    pub const fn size_class(&self) -> SizeClass {
        self.size
    }

    pub const fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_null(&self) -> bool {
        self.kind == ValueKind::Null
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == ValueKind::Dynamic
    }

    pub fn is_signed(&self) -> bool {
        self.flags.contains(TypeFlags::SIGNED)
    }

    /// Returns `true` for kinds whose encoded size depends on the value.
    pub fn is_variable_size(&self) -> bool {
        matches!(self.kind, ValueKind::String | ValueKind::Dynamic)
    }

    /// Encoded byte size for fixed-size kinds, `None` for variable-size ones.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.kind {
            ValueKind::Null => Some(0),
            ValueKind::Integer => Some(self.size.bytes()),
            ValueKind::Decimal => Some(if self.size == SizeClass::Bits64 { 8 } else { 4 }),
            ValueKind::ObjectId => Some(8),
            ValueKind::String | ValueKind::Dynamic => None,
        }
    }

    /// Pack into the `u32` storage tag.
    pub fn to_bits(&self) -> u32 {
        self.kind as u32 | (self.size as u32) << 8 | (self.flags.bits() as u32) << 16
    }

    /// Unpack a `u32` storage tag.
    pub fn from_bits(bits: u32) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidTypeTag(bits);
        if bits >> 24 != 0 {
            return Err(invalid());
        }
        let kind = ValueKind::from_u8(bits as u8).ok_or_else(invalid)?;
        let size = SizeClass::from_u8((bits >> 8) as u8).ok_or_else(invalid)?;
        let flags = TypeFlags::from_bits((bits >> 16) as u8).ok_or_else(invalid)?;
        if kind != ValueKind::Integer && !flags.is_empty() {
            return Err(invalid());
        }
        Ok(Self { kind, size, flags })
    }
}

impl Default for Type {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.size.bits();
        match self.kind {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Dynamic => write!(f, "dynamic"),
            ValueKind::Integer if self.is_signed() => write!(f, "int{bits}"),
            ValueKind::Integer => write!(f, "uint{bits}"),
            ValueKind::Decimal => write!(f, "decimal{bits}"),
            ValueKind::ObjectId => write!(f, "object_id"),
            ValueKind::String => write!(f, "string{bits}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_tag_is_zero() {
        assert_eq!(Type::null().to_bits(), 0);
        assert_eq!(Type::from_bits(0).unwrap(), Type::null());
    }

    #[test]
    fn tag_roundtrip_all_constructors() {
        let types = [
            Type::null(),
            Type::dynamic(),
            Type::int8(),
            Type::uint16(),
            Type::int32(),
            Type::uint64(),
            Type::float32(),
            Type::float64(),
            Type::object_id(),
            Type::string(SizeClass::Bits8),
            Type::string(SizeClass::Bits32),
        ];
        for ty in types {
            assert_eq!(Type::from_bits(ty.to_bits()).unwrap(), ty, "{ty}");
        }
    }

    #[test]
    fn signedness_is_part_of_identity() {
        assert_ne!(Type::int16(), Type::uint16());
        assert_ne!(Type::int16().to_bits(), Type::uint16().to_bits());
    }

    #[test]
    fn flags_dropped_for_non_integers() {
        let ty = Type::new(ValueKind::String, SizeClass::Bits8, TypeFlags::SIGNED);
        assert!(ty.flags().is_empty());
    }

    #[test]
    fn from_bits_rejects_garbage() {
        assert_eq!(Type::from_bits(0xFF), Err(TypeError::InvalidTypeTag(0xFF)));
        assert!(Type::from_bits(2 | 9 << 8).is_err());
        assert!(Type::from_bits(2 | 0x80 << 16).is_err());
        assert!(Type::from_bits(5 | 1 << 16).is_err());
        assert!(Type::from_bits(1 << 24).is_err());
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(Type::null().fixed_size(), Some(0));
        assert_eq!(Type::uint8().fixed_size(), Some(1));
        assert_eq!(Type::int16().fixed_size(), Some(2));
        assert_eq!(Type::int64().fixed_size(), Some(8));
        assert_eq!(Type::decimal(SizeClass::Bits16).fixed_size(), Some(4));
        assert_eq!(Type::float64().fixed_size(), Some(8));
        assert_eq!(Type::object_id().fixed_size(), Some(8));
        assert_eq!(Type::string(SizeClass::Bits8).fixed_size(), None);
        assert_eq!(Type::dynamic().fixed_size(), None);
    }

    #[test]
    fn size_class_limits() {
        assert_eq!(SizeClass::Bits8.max_length(), 255);
        assert_eq!(SizeClass::Bits16.max_length(), 65_535);
        assert_eq!(SizeClass::Bits64.length_prefix(), 4);
        assert_eq!(SizeClass::fitting(0), SizeClass::Bits8);
        assert_eq!(SizeClass::fitting(255), SizeClass::Bits8);
        assert_eq!(SizeClass::fitting(256), SizeClass::Bits16);
        assert_eq!(SizeClass::fitting(70_000), SizeClass::Bits32);
    }

    #[test]
    fn display_names() {
        assert_eq!(Type::int16().to_string(), "int16");
        assert_eq!(Type::uint8().to_string(), "uint8");
        assert_eq!(Type::string(SizeClass::Bits32).to_string(), "string32");
        assert_eq!(Type::object_id().to_string(), "object_id");
    }
}
