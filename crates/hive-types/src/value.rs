//! Borrowed, type-tagged values.
//!
//! [`ValueRef`] is the currency for moving cell values in and out of a
//! table. Scalars are carried inline; strings borrow their bytes. A value
//! read from a table therefore holds a shared borrow of that table, and the
//! compiler rejects any mutation of the table while the value is alive.

use std::fmt;

use crate::data_type::{SizeClass, Type, ValueKind};
use crate::object::ObjectId;

/// Tolerance used when comparing decimals for equality.
pub const DECIMAL_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug)]
enum Payload<'a> {
    None,
    Signed(i64),
    Unsigned(u64),
    Decimal(f64),
    Object(ObjectId),
    Bytes(&'a [u8]),
}

/// A non-owning, type-tagged reference to a value.
///
/// The payload always matches the type: signed integers carry a value in
/// range of their size class, 32-bit decimals carry an `f32`-representable
/// value, and strings never exceed their size class's maximum length.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    ty: Type,
    payload: Payload<'a>,
}

impl<'a> ValueRef<'a> {
    /// The null value.
    pub const fn null() -> Self {
        Self {
            ty: Type::null(),
            payload: Payload::None,
        }
    }

    /// The `dynamic` placeholder. Compares equal to everything.
    pub const fn dynamic() -> Self {
        Self {
            ty: Type::dynamic(),
            payload: Payload::None,
        }
    }

    /// The zero value of `ty`: 0, 0.0, the null object id, or an empty string.
    pub fn zero(ty: Type) -> Self {
        let payload = match ty.kind() {
            ValueKind::Null | ValueKind::Dynamic => Payload::None,
            ValueKind::Integer if ty.is_signed() => Payload::Signed(0),
            ValueKind::Integer => Payload::Unsigned(0),
            ValueKind::Decimal => Payload::Decimal(0.0),
            ValueKind::ObjectId => Payload::Object(ObjectId::null()),
            ValueKind::String => Payload::Bytes(&[]),
        };
        Self { ty, payload }
    }

    pub fn i8(v: i8) -> Self {
        Self::signed(Type::int8(), v as i64)
    }

    pub fn i16(v: i16) -> Self {
        Self::signed(Type::int16(), v as i64)
    }

    pub fn i32(v: i32) -> Self {
        Self::signed(Type::int32(), v as i64)
    }

    pub fn i64(v: i64) -> Self {
        Self::signed(Type::int64(), v)
    }

    pub fn u8(v: u8) -> Self {
        Self::unsigned(Type::uint8(), v as u64)
    }

    pub fn u16(v: u16) -> Self {
        Self::unsigned(Type::uint16(), v as u64)
    }

    pub fn u32(v: u32) -> Self {
        Self::unsigned(Type::uint32(), v as u64)
    }

    pub fn u64(v: u64) -> Self {
        Self::unsigned(Type::uint64(), v)
    }

    pub fn f32(v: f32) -> Self {
        Self {
            ty: Type::float32(),
            payload: Payload::Decimal(v as f64),
        }
    }

    pub fn f64(v: f64) -> Self {
        Self {
            ty: Type::float64(),
            payload: Payload::Decimal(v),
        }
    }

    pub fn object_id(id: ObjectId) -> Self {
        Self {
            ty: Type::object_id(),
            payload: Payload::Object(id),
        }
    }

    /// A string value typed with the smallest size class that holds it.
    pub fn string(s: &'a str) -> Self {
        Self::bytes(s.as_bytes())
    }

    /// A byte-string value typed with the smallest size class that holds it.
    pub fn bytes(b: &'a [u8]) -> Self {
        Self::string_in(SizeClass::fitting(b.len()), b)
    }

    /// A string value of an explicit size class. Longer input is clamped.
    pub fn string_in(size: SizeClass, b: &'a [u8]) -> Self {
        let len = b.len().min(size.max_length());
        Self {
            ty: Type::string(size),
            payload: Payload::Bytes(&b[..len]),
        }
    }

    /// An integer of type `ty` holding `v`, saturated into `ty`'s range.
    pub fn integer(ty: Type, v: i128) -> Self {
        if ty.kind() != ValueKind::Integer {
            return Self::zero(ty);
        }
        let (min, max) = integer_range(ty);
        let v = v.clamp(min, max);
        let payload = if ty.is_signed() {
            Payload::Signed(v as i64)
        } else {
            Payload::Unsigned(v as u64)
        };
        Self { ty, payload }
    }

    /// A decimal of type `ty` holding `v`, rounded to `ty`'s precision.
    pub fn decimal_of(ty: Type, v: f64) -> Self {
        if ty.kind() != ValueKind::Decimal {
            return Self::zero(ty);
        }
        let v = if ty.size_class() == SizeClass::Bits64 {
            v
        } else {
            v as f32 as f64
        };
        Self {
            ty,
            payload: Payload::Decimal(v),
        }
    }

    fn signed(ty: Type, v: i64) -> Self {
        Self {
            ty,
            payload: Payload::Signed(v),
        }
    }

    fn unsigned(ty: Type, v: u64) -> Self {
        Self {
            ty,
            payload: Payload::Unsigned(v),
        }
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn kind(&self) -> ValueKind {
        self.ty.kind()
    }

    pub fn is_null(&self) -> bool {
        self.ty.is_null()
    }

    /// Logical byte length: the payload length for strings, the encoded
    /// scalar width otherwise.
    pub fn size(&self) -> usize {
        match self.payload {
            Payload::Bytes(b) => b.len(),
            _ => self.ty.fixed_size().unwrap_or(0),
        }
    }

    /// The value as a signed integer, reinterpreting unsigned values of the
    /// same width. Returns 0 for non-integers.
    pub fn integer_signed(&self) -> i64 {
        match self.payload {
            Payload::Signed(v) => v,
            Payload::Unsigned(v) => sign_extend(v, self.ty.size_class().bits()),
            _ => 0,
        }
    }

    /// The value as an unsigned integer, reinterpreting signed values of the
    /// same width. Returns 0 for non-integers.
    pub fn integer_unsigned(&self) -> u64 {
        match self.payload {
            Payload::Unsigned(v) => v,
            Payload::Signed(v) => mask(v as u64, self.ty.size_class().bits()),
            _ => 0,
        }
    }

    /// The value as a float. Returns 0.0 for non-decimals.
    pub fn decimal(&self) -> f64 {
        match self.payload {
            Payload::Decimal(v) => v,
            _ => 0.0,
        }
    }

    /// The object id. Returns the null id for other kinds.
    pub fn object(&self) -> ObjectId {
        match self.payload {
            Payload::Object(id) => id,
            _ => ObjectId::null(),
        }
    }

    /// The borrowed payload of a string. Empty for other kinds.
    pub fn as_bytes(&self) -> &'a [u8] {
        match self.payload {
            Payload::Bytes(b) => b,
            _ => &[],
        }
    }

    /// The payload of a string as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.payload {
            Payload::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Exact integer value, independent of signedness.
    fn integer_wide(&self) -> i128 {
        match self.payload {
            Payload::Signed(v) => v as i128,
            Payload::Unsigned(v) => v as i128,
            _ => 0,
        }
    }

    /// Convert the representation to `new_type` in place.
    ///
    /// No-op when the type already matches or the target is `dynamic`.
    /// Across kinds the value resets to the target's zero. Integers saturate
    /// into the target range, decimals round to the target precision, and
    /// strings are clamped to the target's maximum length.
    pub fn morph(&mut self, new_type: Type) {
        if self.ty == new_type || new_type.is_dynamic() {
            return;
        }
        if self.kind() != new_type.kind() {
            *self = Self::zero(new_type);
            return;
        }
        *self = match new_type.kind() {
            ValueKind::Integer => Self::integer(new_type, self.integer_wide()),
            ValueKind::Decimal => Self::decimal_of(new_type, self.decimal()),
            ValueKind::String => Self::string_in(new_type.size_class(), self.as_bytes()),
            ValueKind::Null | ValueKind::Dynamic | ValueKind::ObjectId => Self {
                ty: new_type,
                payload: self.payload,
            },
        };
    }

    /// Convert to `new_type` by truncation rather than saturation.
    ///
    /// Integers keep their low bits and are reinterpreted under the target
    /// signedness, so `0xFFFF` becomes `0xFF` as a `uint8` and `-1` as an
    /// `int8`. Everything else behaves like [`morph`](Self::morph).
    pub fn truncate_to(mut self, new_type: Type) -> Self {
        if self.kind() == ValueKind::Integer
            && new_type.kind() == ValueKind::Integer
            && self.ty != new_type
        {
            let bits = new_type.size_class().bits();
            let raw = mask(self.integer_wide() as u64, bits);
            return if new_type.is_signed() {
                Self::signed(new_type, sign_extend(raw, bits))
            } else {
                Self::unsigned(new_type, raw)
            };
        }
        self.morph(new_type);
        self
    }
}

/// Inclusive representable range of an integer type.
fn integer_range(ty: Type) -> (i128, i128) {
    let bits = ty.size_class().bits();
    if ty.is_signed() {
        let half = 1i128 << (bits - 1);
        (-half, half - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

fn mask(v: u64, bits: u32) -> u64 {
    if bits >= 64 {
        v
    } else {
        v & ((1u64 << bits) - 1)
    }
}

fn sign_extend(v: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((v << shift) as i64) >> shift
}

impl Default for ValueRef<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.ty.is_dynamic() || other.ty.is_dynamic() {
            return true;
        }
        if self.kind() != other.kind() {
            return false;
        }
        match self.kind() {
            ValueKind::Null | ValueKind::Dynamic => true,
            ValueKind::Integer => self.integer_wide() == other.integer_wide(),
            ValueKind::Decimal => (self.decimal() - other.decimal()).abs() <= DECIMAL_EPSILON,
            ValueKind::ObjectId => self.object() == other.object(),
            ValueKind::String => self.as_bytes() == other.as_bytes(),
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ValueKind::String => write!(f, "{}({:?})", self.ty, String::from_utf8_lossy(self.as_bytes())),
            _ => write!(f, "{}({self})", self.ty),
        }
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload {
            Payload::None if self.ty.is_dynamic() => write!(f, "dynamic"),
            Payload::None => write!(f, "null"),
            Payload::Signed(v) => write!(f, "{v}"),
            Payload::Unsigned(v) => write!(f, "{v}"),
            Payload::Decimal(v) => write!(f, "{v}"),
            Payload::Object(id) => write!(f, "{id}"),
            Payload::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}
