//! Byte layout of records and fields.
//!
//! ```text
//! record := total_size: u32 | field_0 | ... | field_{n-1} | slack
//! field  := scalar bytes                            (fixed-size types)
//!         | len: u8/u16/u32 | payload               (string)
//!         | tag: u32 | field encoded under tag      (dynamic column)
//! ```
//!
//! `total_size` counts the header, the fields and any trailing growth slack.
//! Fields have no fixed offsets: column `i` starts after the encoded bytes of
//! columns `0..i`, so locating it means decoding every preceding field.

use hive_schema::TableSchema;
use hive_types::{ObjectId, SizeClass, Type, ValueKind, ValueRef};

/// Size of the record length header.
pub const RECORD_HEADER: usize = 4;

/// Size of the type tag in front of a dynamic field.
pub const TAG_SIZE: usize = 4;

/// Type a value is stored under in a dynamic column.
fn resolve(value: &ValueRef<'_>) -> Type {
    if value.ty().is_dynamic() {
        Type::null()
    } else {
        value.ty()
    }
}

fn read_len(prefix: &[u8]) -> usize {
    let mut buf = [0u8; 4];
    buf[..prefix.len()].copy_from_slice(prefix);
    u32::from_le_bytes(buf) as usize
}

/// Bytes a zero value of `ty` occupies.
pub fn min_size(ty: Type) -> usize {
    match ty.kind() {
        ValueKind::String => ty.size_class().length_prefix(),
        ValueKind::Dynamic => TAG_SIZE,
        _ => ty.fixed_size().unwrap_or(0),
    }
}

/// Bytes needed to write `value` into a field of type `ty`.
///
/// `value` must already be morphed to `ty`.
pub fn encoded_size(ty: Type, value: &ValueRef<'_>) -> usize {
    match ty.kind() {
        ValueKind::Dynamic => TAG_SIZE + encoded_size(resolve(value), value),
        ValueKind::String => ty.size_class().length_prefix() + value.size(),
        _ => ty.fixed_size().unwrap_or(0),
    }
}

/// Bytes to reserve for `value` on insert, leaving room for it to grow.
///
/// Variable-length payloads are rounded up to the next power of two (at
/// least `floor`), capped at the size class maximum.
pub fn reserve_size(ty: Type, value: &ValueRef<'_>, floor: usize) -> usize {
    fn grown(size: SizeClass, len: usize, floor: usize) -> usize {
        let room = len.max(floor);
        let room = room.checked_next_power_of_two().unwrap_or(room);
        size.length_prefix() + room.min(size.max_length())
    }
    match ty.kind() {
        ValueKind::String => grown(ty.size_class(), value.size(), floor),
        ValueKind::Dynamic => {
            let inner = resolve(value);
            let room = match inner.kind() {
                ValueKind::String => grown(inner.size_class(), value.size(), floor),
                _ => 8,
            };
            TAG_SIZE + room
        }
        _ => ty.fixed_size().unwrap_or(0),
    }
}

/// Encoded size of the field of type `ty` at the start of `bytes`, or
/// `None` if the bytes are malformed or truncated.
pub fn read_size(ty: Type, bytes: &[u8]) -> Option<usize> {
    let size = match ty.kind() {
        ValueKind::String => {
            let prefix = ty.size_class().length_prefix();
            prefix.checked_add(read_len(bytes.get(..prefix)?))?
        }
        ValueKind::Dynamic => {
            let tag = u32::from_le_bytes(bytes.get(..TAG_SIZE)?.try_into().ok()?);
            let inner = Type::from_bits(tag).ok()?;
            if inner.is_dynamic() {
                return None;
            }
            TAG_SIZE + read_size(inner, &bytes[TAG_SIZE..])?
        }
        _ => ty.fixed_size()?,
    };
    (size <= bytes.len()).then_some(size)
}

/// Encoded size of a field known to be well-formed.
///
/// # Panics
///
/// Panics if the bytes are malformed: table storage is corrupt.
pub fn field_size(ty: Type, bytes: &[u8]) -> usize {
    match read_size(ty, bytes) {
        Some(size) => size,
        None => panic!("corrupt {ty} field in table storage"),
    }
}

/// Byte offset of `column` within `record`, counted from the record start
/// (so the first field is at [`RECORD_HEADER`]).
pub fn field_offset(record: &[u8], schema: &TableSchema, column: usize) -> usize {
    let mut offset = RECORD_HEADER;
    for c in schema.iter().take(column) {
        offset += field_size(c.ty, &record[offset..]);
    }
    offset
}

/// Bytes `record` actually occupies: header plus every field, without slack.
pub fn record_data_size(record: &[u8], schema: &TableSchema) -> usize {
    field_offset(record, schema, schema.len())
}

/// Checked variant of [`record_data_size`] for untrusted bytes.
pub fn checked_record_data_size(record: &[u8], schema: &TableSchema) -> Option<usize> {
    let mut offset = RECORD_HEADER;
    for c in schema {
        offset += read_size(c.ty, record.get(offset..)?)?;
    }
    (offset <= record.len()).then_some(offset)
}

/// Total size stored in a record header.
pub fn record_size(bytes: &[u8]) -> usize {
    read_len(&bytes[..RECORD_HEADER])
}

/// Overwrite a record header.
pub fn write_record_size(bytes: &mut [u8], size: usize) {
    let size = u32::try_from(size).unwrap_or_else(|_| panic!("record of {size} bytes exceeds u32"));
    bytes[..RECORD_HEADER].copy_from_slice(&size.to_le_bytes());
}

/// Write `value` as a field of type `ty` at the start of `out`.
///
/// Returns the number of bytes written, equal to [`encoded_size`]. `value`
/// must already be morphed to `ty`.
pub fn write_value(ty: Type, value: &ValueRef<'_>, out: &mut [u8]) -> usize {
    match ty.kind() {
        ValueKind::Null => 0,
        ValueKind::Dynamic => {
            let inner = resolve(value);
            out[..TAG_SIZE].copy_from_slice(&inner.to_bits().to_le_bytes());
            TAG_SIZE + write_value(inner, value, &mut out[TAG_SIZE..])
        }
        ValueKind::Integer => {
            let n = ty.size_class().bytes();
            out[..n].copy_from_slice(&value.integer_unsigned().to_le_bytes()[..n]);
            n
        }
        ValueKind::Decimal if ty.size_class() == SizeClass::Bits64 => {
            out[..8].copy_from_slice(&value.decimal().to_le_bytes());
            8
        }
        ValueKind::Decimal => {
            out[..4].copy_from_slice(&(value.decimal() as f32).to_le_bytes());
            4
        }
        ValueKind::ObjectId => {
            out[..8].copy_from_slice(&value.object().to_le_bytes());
            8
        }
        ValueKind::String => {
            let prefix = ty.size_class().length_prefix();
            let payload = value.as_bytes();
            out[..prefix].copy_from_slice(&(payload.len() as u32).to_le_bytes()[..prefix]);
            out[prefix..prefix + payload.len()].copy_from_slice(payload);
            prefix + payload.len()
        }
    }
}

/// Decode the field of type `ty` at the start of `bytes`.
///
/// Strings borrow `bytes`. A dynamic field with an unreadable tag decodes
/// as null.
pub fn read_value(ty: Type, bytes: &[u8]) -> ValueRef<'_> {
    match ty.kind() {
        ValueKind::Null => ValueRef::null(),
        ValueKind::Dynamic => {
            let tag = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            match Type::from_bits(tag) {
                Ok(inner) if !inner.is_dynamic() => read_value(inner, &bytes[TAG_SIZE..]),
                _ => ValueRef::null(),
            }
        }
        ValueKind::Integer => {
            let n = ty.size_class().bytes();
            let mut buf = [0u8; 8];
            buf[..n].copy_from_slice(&bytes[..n]);
            let raw = u64::from_le_bytes(buf);
            let wide = if ty.is_signed() {
                let shift = 64 - ty.size_class().bits();
                (((raw << shift) as i64) >> shift) as i128
            } else {
                raw as i128
            };
            ValueRef::integer(ty, wide)
        }
        ValueKind::Decimal if ty.size_class() == SizeClass::Bits64 => {
            let v = f64::from_le_bytes(bytes[..8].try_into().unwrap_or([0; 8]));
            ValueRef::decimal_of(ty, v)
        }
        ValueKind::Decimal => {
            let v = f32::from_le_bytes(bytes[..4].try_into().unwrap_or([0; 4]));
            ValueRef::decimal_of(ty, v as f64)
        }
        ValueKind::ObjectId => {
            let id = ObjectId::from_le_bytes(bytes[..8].try_into().unwrap_or([0; 8]));
            let mut value = ValueRef::object_id(id);
            value.morph(ty);
            value
        }
        ValueKind::String => {
            let prefix = ty.size_class().length_prefix();
            let len = read_len(&bytes[..prefix]);
            ValueRef::string_in(ty.size_class(), &bytes[prefix..prefix + len])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(ty: Type, value: ValueRef<'_>) -> Vec<u8> {
        let mut value = value;
        value.morph(ty);
        let mut buf = vec![0u8; encoded_size(ty, &value)];
        assert_eq!(write_value(ty, &value, &mut buf), buf.len());
        buf
    }

    #[test]
    fn integers_are_little_endian_and_exact_width() {
        assert_eq!(encode(Type::uint16(), ValueRef::u16(0x1234)), [0x34, 0x12]);
        assert_eq!(encode(Type::int8(), ValueRef::i8(-1)), [0xFF]);
        let bytes = encode(Type::int32(), ValueRef::i32(-2));
        assert_eq!(read_value(Type::int32(), &bytes).integer_signed(), -2);
    }

    #[test]
    fn strings_carry_size_class_prefix() {
        assert_eq!(
            encode(Type::string(SizeClass::Bits8), ValueRef::string("ab")),
            [2, b'a', b'b']
        );
        assert_eq!(
            encode(Type::string(SizeClass::Bits16), ValueRef::string("ab")),
            [2, 0, b'a', b'b']
        );
        let bytes = encode(Type::string(SizeClass::Bits64), ValueRef::string("ab"));
        assert_eq!(bytes, [2, 0, 0, 0, b'a', b'b']);
        assert_eq!(read_size(Type::string(SizeClass::Bits64), &bytes), Some(6));
    }

    #[test]
    fn dynamic_fields_embed_a_tag() {
        let bytes = encode(Type::dynamic(), ValueRef::u8(7));
        assert_eq!(bytes.len(), TAG_SIZE + 1);
        assert_eq!(&bytes[..4], &Type::uint8().to_bits().to_le_bytes());
        let value = read_value(Type::dynamic(), &bytes);
        assert_eq!(value.ty(), Type::uint8());
        assert_eq!(value.integer_unsigned(), 7);
    }

    #[test]
    fn dynamic_placeholder_is_stored_as_null() {
        let bytes = encode(Type::dynamic(), ValueRef::dynamic());
        assert_eq!(bytes, [0, 0, 0, 0]);
        assert!(read_value(Type::dynamic(), &bytes).is_null());
        assert_eq!(min_size(Type::dynamic()), bytes.len());
    }

    #[test]
    fn zeroed_bytes_decode_as_zero_values() {
        let zeros = [0u8; 16];
        for ty in [
            Type::int64(),
            Type::float32(),
            Type::object_id(),
            Type::string(SizeClass::Bits16),
            Type::dynamic(),
        ] {
            assert_eq!(read_size(ty, &zeros), Some(min_size(ty)), "{ty}");
            assert_eq!(read_value(ty, &zeros), ValueRef::zero(ty), "{ty}");
        }
    }

    #[test]
    fn decimals_roundtrip_at_width() {
        let bytes = encode(Type::float64(), ValueRef::f64(1.25));
        assert_eq!(read_value(Type::float64(), &bytes).decimal(), 1.25);
        let bytes = encode(Type::float32(), ValueRef::f64(0.1));
        assert_eq!(bytes.len(), 4);
        assert_eq!(read_value(Type::float32(), &bytes).decimal(), 0.1f32 as f64);
    }

    #[test]
    fn read_size_rejects_truncation() {
        assert_eq!(read_size(Type::int32(), &[1, 2]), None);
        assert_eq!(read_size(Type::string(SizeClass::Bits8), &[5, b'a']), None);
        assert_eq!(read_size(Type::dynamic(), &[0xFF, 0, 0, 0]), None);
        let nested = Type::dynamic().to_bits().to_le_bytes();
        assert_eq!(read_size(Type::dynamic(), &nested), None);
    }

    #[test]
    fn reserve_rounds_strings_up() {
        let ty = Type::string(SizeClass::Bits8);
        assert_eq!(reserve_size(ty, &ValueRef::string("abc"), 8), 1 + 8);
        assert_eq!(reserve_size(ty, &ValueRef::string(&"x".repeat(9)), 8), 1 + 16);
        let long = "x".repeat(200);
        assert_eq!(reserve_size(ty, &ValueRef::string(&long), 8), 1 + 255);
        assert_eq!(reserve_size(Type::int16(), &ValueRef::i16(1), 8), 2);
        assert_eq!(reserve_size(Type::dynamic(), &ValueRef::i16(1), 8), TAG_SIZE + 8);
    }

    #[test]
    fn offsets_follow_variable_fields() {
        let schema = TableSchema::from_columns([
            ("a", Type::string(SizeClass::Bits8)),
            ("b", Type::uint16()),
            ("c", Type::dynamic()),
        ])
        .unwrap();
        let mut record = vec![0u8; RECORD_HEADER];
        record.extend(encode(Type::string(SizeClass::Bits8), ValueRef::string("hey")));
        record.extend(encode(Type::uint16(), ValueRef::u16(9)));
        record.extend(encode(Type::dynamic(), ValueRef::string("z")));
        record.extend([0u8; 5]);
        let len = record.len();
        write_record_size(&mut record, len);

        assert_eq!(record_size(&record), len);
        assert_eq!(field_offset(&record, &schema, 0), 4);
        assert_eq!(field_offset(&record, &schema, 1), 8);
        assert_eq!(field_offset(&record, &schema, 2), 10);
        assert_eq!(record_data_size(&record, &schema), 10 + 4 + 2);
        assert_eq!(checked_record_data_size(&record, &schema), Some(16));
        assert_eq!(checked_record_data_size(&record[..12], &schema), None);
    }
}
