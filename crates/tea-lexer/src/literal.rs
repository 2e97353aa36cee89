// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Decoding of number and string literal text.

use tea_ast::token::NumberLit;

/// Why a number literal could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    Invalid,
    OutOfRange,
}

/// Decode the text of a number literal.
///
/// Decimal and hex integers without a suffix are `int` when they fit in 32
/// bits and `long` otherwise. `L` forces long, `f` float, `d` double. A
/// decimal point or exponent without a suffix yields a double.
pub fn decode_number(text: &str) -> Result<NumberLit, NumberError> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return decode_hex(hex);
    }

    let (body, suffix) = match text.as_bytes().last() {
        Some(&b) if matches!(b, b'l' | b'L' | b'f' | b'F' | b'd' | b'D') => {
            (&text[..text.len() - 1], Some(b.to_ascii_lowercase()))
        }
        _ => (text, None),
    };
    if body.is_empty() {
        return Err(NumberError::Invalid);
    }

    let int_len = digits_len(body);
    let is_integer = int_len == body.len();
    if !is_integer && decimal_len(body) != body.len() {
        return Err(NumberError::Invalid);
    }

    match suffix {
        Some(b'l') if !is_integer => Err(NumberError::Invalid),
        Some(b'l') => body.parse::<i64>().map(NumberLit::Long).map_err(|_| NumberError::OutOfRange),
        Some(b'f') => {
            let v: f32 = body.parse().map_err(|_| NumberError::Invalid)?;
            if v.is_finite() {
                Ok(NumberLit::Float(v))
            } else {
                Err(NumberError::OutOfRange)
            }
        }
        Some(_) => decode_double(body),
        None if is_integer => {
            let v: i64 = body.parse().map_err(|_| NumberError::OutOfRange)?;
            Ok(match i32::try_from(v) {
                Ok(small) => NumberLit::Int(small),
                Err(_) => NumberLit::Long(v),
            })
        }
        None => decode_double(body),
    }
}

fn decode_hex(hex: &str) -> Result<NumberLit, NumberError> {
    let (digits, long) = match hex.strip_suffix(['l', 'L']) {
        Some(d) => (d, true),
        None => (hex, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(NumberError::Invalid);
    }
    let value = u64::from_str_radix(digits, 16).map_err(|_| NumberError::OutOfRange)?;
    if long {
        return Ok(NumberLit::Long(value as i64));
    }
    // Hex int literals may set the sign bit: 0xFFFFFFFF is -1.
    Ok(match u32::try_from(value) {
        Ok(v) => NumberLit::Int(v as i32),
        Err(_) => NumberLit::Long(value as i64),
    })
}

fn decode_double(body: &str) -> Result<NumberLit, NumberError> {
    let v: f64 = body.parse().map_err(|_| NumberError::Invalid)?;
    if v.is_finite() {
        Ok(NumberLit::Double(v))
    } else {
        Err(NumberError::OutOfRange)
    }
}

fn digits_len(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// Length of the `digits [. digits] [e [+-] digits]` prefix of `s`.
fn decimal_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = digits_len(s);
    if i == 0 {
        return 0;
    }
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1 + digits_len(&s[i + 1..]);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp = digits_len(&s[j..]);
        if exp > 0 {
            i = j + exp;
        }
    }
    i
}

/// Length of the longest well-formed number literal at the start of `text`.
///
/// Used to point at the first offending character of a malformed literal.
pub(crate) fn valid_number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X') {
        let digits = text[2..].bytes().take_while(u8::is_ascii_hexdigit).count();
        if digits == 0 {
            return 1;
        }
        let end = 2 + digits;
        return if matches!(bytes.get(end), Some(b'l' | b'L')) { end + 1 } else { end };
    }
    let int_len = digits_len(text);
    let end = decimal_len(text);
    match bytes.get(end) {
        Some(b'l' | b'L') if end == int_len => end + 1,
        Some(b'f' | b'F' | b'd' | b'D') => end + 1,
        _ => end,
    }
}

/// Decode one escape character following a backslash.
pub(crate) fn unescape(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\0',
        'b' => '\u{8}',
        't' => '\t',
        'n' => '\n',
        'f' => '\u{c}',
        'r' => '\r',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_subtypes_round_trip() {
        let cases = [
            ("123", NumberLit::Int(123)),
            ("123L", NumberLit::Long(123)),
            ("1.5f", NumberLit::Float(1.5)),
            ("1.5d", NumberLit::Double(1.5)),
            ("1.5", NumberLit::Double(1.5)),
            ("0x7B", NumberLit::Int(123)),
            ("1e10", NumberLit::Double(1e10)),
        ];
        for (text, expected) in cases {
            assert_eq!(decode_number(text), Ok(expected), "decoding {}", text);
        }
    }

    #[test]
    fn oversized_int_becomes_long() {
        assert_eq!(decode_number("2147483647"), Ok(NumberLit::Int(i32::MAX)));
        assert_eq!(decode_number("2147483648"), Ok(NumberLit::Long(2147483648)));
        assert_eq!(decode_number("0x1FFFFFFFF"), Ok(NumberLit::Long(0x1_FFFF_FFFF)));
    }

    #[test]
    fn hex_int_may_set_sign_bit() {
        assert_eq!(decode_number("0xFFFFFFFF"), Ok(NumberLit::Int(-1)));
        assert_eq!(decode_number("0xFFFFFFFFFFFFFFFFL"), Ok(NumberLit::Long(-1)));
    }

    #[test]
    fn range_errors() {
        assert_eq!(decode_number("99999999999999999999"), Err(NumberError::OutOfRange));
        assert_eq!(decode_number("9223372036854775808L"), Err(NumberError::OutOfRange));
        assert_eq!(decode_number("1e999"), Err(NumberError::OutOfRange));
        assert_eq!(decode_number("1e99f"), Err(NumberError::OutOfRange));
    }

    #[test]
    fn malformed_literals() {
        assert_eq!(decode_number("1.5L"), Err(NumberError::Invalid));
        assert_eq!(decode_number("0x"), Err(NumberError::Invalid));
        assert_eq!(decode_number("12ab"), Err(NumberError::Invalid));
        assert_eq!(decode_number("inf"), Err(NumberError::Invalid));
    }

    #[test]
    fn valid_prefix_points_at_culprit() {
        assert_eq!(valid_number_len("123abc"), 3);
        assert_eq!(valid_number_len("1.5e"), 3);
        assert_eq!(valid_number_len("1.5fx"), 4);
        assert_eq!(valid_number_len("0xZ"), 1);
        assert_eq!(valid_number_len("1e+5q"), 4);
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape('n'), Some('\n'));
        assert_eq!(unescape('0'), Some('\0'));
        assert_eq!(unescape('q'), None);
    }
}
