//! Numeric and character conversion of decoded content
//!
//! scanf-like: leading whitespace is skipped, the longest valid prefix is
//! used, and `None` means nothing parseable was found.

use super::lexer::Radix;
use crate::core::cursor::is_whitespace;

fn skip_spaces(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_whitespace(b))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn has_hex_prefix(bytes: &[u8]) -> bool {
    matches!(bytes, [b'0', b'x' | b'X', d, ..] if d.is_ascii_hexdigit())
}

/// Parse an integer. Out-of-range values saturate at the `i128` bounds.
pub fn parse_int(bytes: &[u8], radix: Radix) -> Option<i128> {
    let mut rest = skip_spaces(bytes);
    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let base = match radix {
        Radix::Decimal => 10,
        Radix::Octal => 8,
        Radix::Hex | Radix::Auto if has_hex_prefix(rest) => {
            rest = &rest[2..];
            16
        }
        Radix::Hex => 16,
        Radix::Auto if rest.first() == Some(&b'0') => 8,
        Radix::Auto => 10,
    };

    let mut value: i128 = 0;
    let mut digits = 0usize;
    for digit in rest.iter().map_while(|&b| (b as char).to_digit(base)) {
        value = value
            .saturating_mul(i128::from(base))
            .saturating_add(i128::from(digit));
        digits += 1;
    }
    (digits > 0).then_some(if negative { -value } else { value })
}

/// Parse a floating point number, including `inf` and `nan`.
pub fn parse_float(bytes: &[u8]) -> Option<f64> {
    let rest = skip_spaces(bytes);
    let mut end = usize::from(matches!(rest.first(), Some(b'+' | b'-')));

    for word in [&b"infinity"[..], b"inf", b"nan"] {
        if rest
            .get(end..end + word.len())
            .is_some_and(|w| w.eq_ignore_ascii_case(word))
        {
            return parse_prefix(rest, end + word.len());
        }
    }

    let count = |from: usize| rest[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let int_digits = count(end);
    end += int_digits;
    let mut frac_digits = 0;
    if rest.get(end) == Some(&b'.') {
        frac_digits = count(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(rest.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(rest.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = count((end + 1 + sign).min(rest.len()));
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }
    parse_prefix(rest, end)
}

fn parse_prefix(bytes: &[u8], end: usize) -> Option<f64> {
    std::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
}

/// First character of the content; a lone byte if it is not valid UTF-8.
pub fn parse_char(bytes: &[u8]) -> Option<char> {
    let first = *bytes.first()?;
    let len = match first {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    bytes
        .get(..len)
        .and_then(|head| std::str::from_utf8(head).ok())
        .and_then(|s| s.chars().next())
        .or(Some(char::from(first)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_decimal() {
        assert_eq!(parse_int(b"  42abc", Radix::Decimal), Some(42));
        assert_eq!(parse_int(b"-17", Radix::Decimal), Some(-17));
        assert_eq!(parse_int(b"+0,0,10", Radix::Decimal), Some(0));
        assert_eq!(parse_int(b"", Radix::Decimal), None);
        assert_eq!(parse_int(b" - 1", Radix::Decimal), None);
    }

    #[test]
    fn test_parse_int_radix() {
        assert_eq!(parse_int(b"0x1F", Radix::Auto), Some(31));
        assert_eq!(parse_int(b"017", Radix::Auto), Some(15));
        assert_eq!(parse_int(b"0", Radix::Auto), Some(0));
        assert_eq!(parse_int(b"ff", Radix::Hex), Some(255));
        assert_eq!(parse_int(b"0Xff", Radix::Hex), Some(255));
        assert_eq!(parse_int(b"0xg", Radix::Hex), Some(0));
        assert_eq!(parse_int(b"789", Radix::Octal), Some(7));
    }

    #[test]
    fn test_parse_int_saturates() {
        let huge = b"999999999999999999999999999999999999999999999";
        assert_eq!(parse_int(huge, Radix::Decimal), Some(i128::MAX));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(b"1.5"), Some(1.5));
        assert_eq!(parse_float(b" -2.5e3xyz"), Some(-2500.0));
        assert_eq!(parse_float(b".25"), Some(0.25));
        assert_eq!(parse_float(b"3e"), Some(3.0));
        assert_eq!(parse_float(b"7."), Some(7.0));
        assert_eq!(parse_float(b"INF"), Some(f64::INFINITY));
        assert!(parse_float(b"nan").is_some_and(f64::is_nan));
        assert_eq!(parse_float(b"."), None);
        assert_eq!(parse_float(b"abc"), None);
    }

    #[test]
    fn test_parse_char() {
        assert_eq!(parse_char(b"xy"), Some('x'));
        assert_eq!(parse_char("évé".as_bytes()), Some('é'));
        assert_eq!(parse_char(&[0xE9]), Some('é'));
        assert_eq!(parse_char(b""), None);
    }
}
