//! Type inference for textual input.
//!
//! A single pass classifies the text as `null`, an integer, a decimal, or
//! (on any deviation from those shapes) a string. A second pass parses the
//! value under the inferred type.

use crate::data_type::{SizeClass, Type, ValueKind};
use crate::value::ValueRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Null,
    Integer,
    Decimal,
    Text,
}

/// Classify `text` in one pass over its bytes.
///
/// Integers are an optional leading sign followed by numerals. Decimals may
/// additionally carry at most one `.` and at most one exponent marker
/// (`e`/`E`, optionally followed by a sign); numerals are required on both
/// sides of each marker.
fn classify(text: &str) -> Shape {
    if text == "null" {
        return Shape::Null;
    }
    let mut point: Option<usize> = None;
    let mut exponent: Option<usize> = None;
    // numerals seen since the start or the last marker
    let mut run = 0usize;

    for (i, &c) in text.as_bytes().iter().enumerate() {
        match c {
            b'0'..=b'9' => run += 1,
            b'+' | b'-' => {
                let after_exponent = i > 0 && exponent == Some(i - 1);
                if i != 0 && !after_exponent {
                    return Shape::Text;
                }
            }
            b'.' => {
                if point.is_some() || exponent.is_some() || run == 0 {
                    return Shape::Text;
                }
                point = Some(i);
                run = 0;
            }
            b'e' | b'E' => {
                if exponent.is_some() || run == 0 {
                    return Shape::Text;
                }
                exponent = Some(i);
                run = 0;
            }
            _ => return Shape::Text,
        }
    }

    if run == 0 {
        Shape::Text
    } else if point.is_some() || exponent.is_some() {
        Shape::Decimal
    } else {
        Shape::Integer
    }
}

/// Infer the type `text` would be stored as.
///
/// Integers prefer `int64`, then `uint64`, then fall back to `decimal64`
/// when they fit neither. Strings get the smallest size class holding them.
pub fn infer_type(text: &str) -> Type {
    match classify(text) {
        Shape::Null => Type::null(),
        Shape::Integer => {
            if text.parse::<i64>().is_ok() {
                Type::int64()
            } else if text.parse::<u64>().is_ok() {
                Type::uint64()
            } else {
                Type::float64()
            }
        }
        Shape::Decimal => Type::float64(),
        Shape::Text => Type::string(SizeClass::fitting(text.len())),
    }
}

impl<'a> ValueRef<'a> {
    /// Infer a type for `text` and parse it. Strings borrow `text`.
    pub fn read_from_string(text: &'a str) -> Self {
        let ty = infer_type(text);
        match ty.kind() {
            ValueKind::Null => ValueRef::null(),
            ValueKind::Integer if ty.is_signed() => {
                text.parse::<i64>().map(ValueRef::i64).unwrap_or_default()
            }
            ValueKind::Integer => text.parse::<u64>().map(ValueRef::u64).unwrap_or_default(),
            ValueKind::Decimal => text.parse::<f64>().map(ValueRef::f64).unwrap_or_default(),
            _ => ValueRef::string_in(ty.size_class(), text.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_literal() {
        assert_eq!(infer_type("null"), Type::null());
        assert!(ValueRef::read_from_string("null").is_null());
        assert_eq!(infer_type("NULL"), Type::string(SizeClass::Bits8));
    }

    #[test]
    fn integers() {
        assert_eq!(infer_type("0"), Type::int64());
        assert_eq!(infer_type("-12"), Type::int64());
        assert_eq!(infer_type("+12"), Type::int64());
        assert_eq!(ValueRef::read_from_string("-12").integer_signed(), -12);
    }

    #[test]
    fn integers_beyond_i64() {
        assert_eq!(infer_type("18446744073709551615"), Type::uint64());
        assert_eq!(
            ValueRef::read_from_string("18446744073709551615").integer_unsigned(),
            u64::MAX
        );
        assert_eq!(infer_type("99999999999999999999999"), Type::float64());
    }

    #[test]
    fn decimals() {
        for text in ["1.5", "-0.25", "1e5", "1E-3", "2.5e+10", "+3.0"] {
            assert_eq!(infer_type(text), Type::float64(), "{text}");
        }
        assert_eq!(ValueRef::read_from_string("2.5e2").decimal(), 250.0);
    }

    #[test]
    fn malformed_numbers_are_strings() {
        for text in [
            "", "-", "+", ".5", "5.", "1.2.3", "1e", "e5", "1e5e2", "1.5e2.1", "1-2", "12a",
            "--1", "1e+", " 1",
        ] {
            assert_eq!(infer_type(text), Type::string(SizeClass::Bits8), "{text:?}");
        }
    }

    #[test]
    fn strings_borrow_input() {
        let text = String::from("hello world");
        let v = ValueRef::read_from_string(&text);
        assert_eq!(v.as_str(), Some("hello world"));
        assert_eq!(v.as_bytes().as_ptr(), text.as_ptr());
    }

    #[test]
    fn long_strings_pick_wider_class() {
        let text = "x".repeat(300);
        assert_eq!(infer_type(&text), Type::string(SizeClass::Bits16));
        assert_eq!(ValueRef::read_from_string(&text).size(), 300);
    }
}
