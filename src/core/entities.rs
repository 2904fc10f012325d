//! XML Content Decoding
//!
//! Turns a raw content or attribute-value byte range into text:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B; (1 to 4 UTF-8 bytes)
//! - CR and CRLF become LF, tab becomes space
//! - CDATA sections are copied verbatim
//! - Optional UTF-8 to ISO-8859-1 down-conversion
//!
//! Uses Cow for zero-copy when nothing needs rewriting.

use crate::error::{ErrorCode, Result};
use memchr::{memchr, memchr3, memmem};
use std::borrow::Cow;

/// Decode a content range.
///
/// `decode` enables entity, CDATA and whitespace handling (element content and
/// attribute values). Comment and PI text is passed with `decode == false` and
/// only subject to `latin1` conversion.
pub fn decode(input: &[u8], decode: bool, latin1: bool) -> Result<Cow<'_, [u8]>> {
    let plain = !decode
        || (memchr3(b'&', b'\r', b'\t', input).is_none() && memchr(b'<', input).is_none());
    if plain && (!latin1 || input.is_ascii()) {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if decode {
            match input[i] {
                b'&' => {
                    i = decode_entity(input, i, &mut out, latin1)?;
                    continue;
                }
                b'<' if input[i..].starts_with(b"<![CDATA[") => {
                    let body = i + 9;
                    let close = memmem::find(&input[body..], b"]]>").map(|k| body + k);
                    push_raw(&mut out, &input[body..close.unwrap_or(input.len())], latin1);
                    i = close.map_or(input.len(), |c| c + 3);
                    continue;
                }
                b'\r' => {
                    out.push(b'\n');
                    i += 1;
                    continue;
                }
                b'\n' if i > 0 && input[i - 1] == b'\r' => {
                    i += 1;
                    continue;
                }
                b'\t' => {
                    out.push(b' ');
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }
        i += push_char(&mut out, &input[i..], latin1);
    }
    Ok(Cow::Owned(out))
}

/// Decode the entity starting at `input[start] == b'&'`, returning the index after its `;`.
fn decode_entity(input: &[u8], start: usize, out: &mut Vec<u8>, latin1: bool) -> Result<usize> {
    let semi = memchr(b';', &input[start..]).ok_or(ErrorCode::DataIncomplete)?;
    match &input[start + 1..start + semi] {
        b"lt" => out.push(b'<'),
        b"gt" => out.push(b'>'),
        b"amp" => out.push(b'&'),
        b"apos" => out.push(b'\''),
        b"quot" => out.push(b'"'),
        [b'#', b'x' | b'X', hex @ ..] => push_code_point(out, parse_digits(hex, 16)?, latin1),
        [b'#', dec @ ..] => push_code_point(out, parse_digits(dec, 10)?, latin1),
        _ => return Err(ErrorCode::TagInvalid),
    }
    Ok(start + semi + 1)
}

fn parse_digits(digits: &[u8], radix: u32) -> Result<u32> {
    if digits.is_empty() {
        return Err(ErrorCode::TagInvalid);
    }
    let mut value: u32 = 0;
    for &d in digits {
        let digit = (d as char).to_digit(radix).ok_or(ErrorCode::TagInvalid)?;
        value = value
            .checked_mul(radix)
            .and_then(|v| v.checked_add(digit))
            .filter(|&v| v <= 0x10FFFF)
            .ok_or(ErrorCode::TagInvalid)?;
    }
    Ok(value)
}

/// Append a code point as UTF-8, or as one ISO-8859-1 byte in `latin1` mode.
fn push_code_point(out: &mut Vec<u8>, cp: u32, latin1: bool) {
    if latin1 {
        out.push(if cp <= 0xFF { cp as u8 } else { b'?' });
        return;
    }
    match cp {
        0..=0x7F => out.push(cp as u8),
        0x80..=0x7FF => out.extend_from_slice(&[0xC0 | (cp >> 6) as u8, 0x80 | (cp & 0x3F) as u8]),
        0x800..=0xFFFF => out.extend_from_slice(&[
            0xE0 | (cp >> 12) as u8,
            0x80 | ((cp >> 6) & 0x3F) as u8,
            0x80 | (cp & 0x3F) as u8,
        ]),
        _ => out.extend_from_slice(&[
            0xF0 | (cp >> 18) as u8,
            0x80 | ((cp >> 12) & 0x3F) as u8,
            0x80 | ((cp >> 6) & 0x3F) as u8,
            0x80 | (cp & 0x3F) as u8,
        ]),
    }
}

/// Copy one character, converting to ISO-8859-1 if asked. Returns bytes consumed.
fn push_char(out: &mut Vec<u8>, rest: &[u8], latin1: bool) -> usize {
    let b = rest[0];
    if !latin1 || b < 0x80 {
        out.push(b);
        return 1;
    }
    match (b, rest.get(1)) {
        (0xC2, Some(&next)) => {
            out.push(next);
            2
        }
        (0xC3, Some(&next)) => {
            out.push(next.wrapping_add(0x40));
            2
        }
        _ => {
            out.push(b'?');
            let len = match b {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => 1,
            };
            len.min(rest.len())
        }
    }
}

fn push_raw(out: &mut Vec<u8>, mut raw: &[u8], latin1: bool) {
    if !latin1 {
        out.extend_from_slice(raw);
        return;
    }
    while !raw.is_empty() {
        let used = push_char(out, raw, true);
        raw = &raw[used..];
    }
}

/// Escape text for XML content (inverse of [`decode`] for the predefined entities)
pub fn escape(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\'')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(input: &[u8]) -> Vec<u8> {
        decode(input, true, false).unwrap().into_owned()
    }

    #[test]
    fn test_no_entities() {
        let result = decode(b"Hello, World!", true, false).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(
            decoded(b"&lt;hello&gt; &amp; &quot;world&quot; &apos;"),
            b"<hello> & \"world\" '"
        );
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decoded(b"&#65;&#x42;&#X43;"), b"ABC");
        assert_eq!(decoded(b"&#233;"), "é".as_bytes());
        assert_eq!(decoded(b"&#x20AC;"), "€".as_bytes());
        assert_eq!(decoded(b"&#x1F600;"), "😀".as_bytes());
    }

    #[test]
    fn test_malformed_entities() {
        assert_eq!(decode(b"&unknown;", true, false), Err(ErrorCode::TagInvalid));
        assert_eq!(decode(b"&#;", true, false), Err(ErrorCode::TagInvalid));
        assert_eq!(decode(b"&#x110000;", true, false), Err(ErrorCode::TagInvalid));
        assert_eq!(decode(b"&#12a;", true, false), Err(ErrorCode::TagInvalid));
        assert_eq!(decode(b"x &#1", true, false), Err(ErrorCode::DataIncomplete));
    }

    #[test]
    fn test_line_endings_and_tabs() {
        assert_eq!(decoded(b"a\r\nb\rc\nd\te"), b"a\nb\nc\nd e");
    }

    #[test]
    fn test_cdata_verbatim() {
        assert_eq!(decoded(b"x<![CDATA[&lt;<b>]]>&lt;"), b"x&lt;<b><");
        assert_eq!(decoded(b"<![CDATA[cut"), b"cut");
    }

    #[test]
    fn test_raw_mode_untouched() {
        let result = decode(b" a &amp; b\t", false, false).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b" a &amp; b\t");
    }

    #[test]
    fn test_latin1_conversion() {
        let input = "Aé\u{a0}€".as_bytes();
        let result = decode(input, true, true).unwrap();
        assert_eq!(result.as_ref(), &[b'A', 0xE9, 0xA0, b'?']);
        assert_eq!(decode(b"&#233;&#x20AC;", true, true).unwrap().as_ref(), &[0xE9, b'?']);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<hello> & \"world\" 'x'"), "&lt;hello&gt; &amp; &quot;world&quot; &apos;x&apos;");
        assert!(matches!(escape("plain é"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_round_trip() {
        let xml = "&lt;&gt;&amp;&apos;&quot; ü";
        let text = decoded(xml.as_bytes());
        let text = std::str::from_utf8(&text).unwrap();
        assert_eq!(escape(text), xml);
    }
}
