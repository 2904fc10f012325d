//! Lexical skippers
//!
//! Fast-forward primitives over [`Text`]. Each returns the position just past
//! the construct it skipped, so skipping costs the size of the skipped region
//! and never builds a tree:
//! - whitespace, with line counting
//! - DOCTYPE blocks, comments, processing instructions, CDATA sections
//! - start tags, element content and end tags

use super::cursor::{is_whitespace, Text};
use crate::error::{ErrorCode, Result};

/// Skip whitespace, counting CR, LF and CRLF as one line break each.
pub fn whitespace(text: &Text, pos: &mut usize, line: &mut u32) {
    let mut prev = 0u8;
    while let Some(b) = text.get(*pos) {
        match b {
            b'\r' => *line += 1,
            b'\n' if prev != b'\r' => *line += 1,
            b'\n' | b' ' | b'\t' => {}
            _ => break,
        }
        prev = b;
        *pos += 1;
    }
}

/// Skip whitespace without line accounting.
#[inline]
pub fn spaces(text: &Text, mut pos: usize) -> usize {
    while text.get(pos).is_some_and(is_whitespace) {
        pos += 1;
    }
    pos
}

/// Skip `<!DOCTYPE ...>` starting at its `<`.
///
/// The internal subset and quoted literals may contain `>`; only the `>`
/// outside both ends the block.
pub fn doctype(text: &Text, pos: usize) -> Result<usize> {
    let mut p = pos + 2;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    loop {
        let b = text.at(p)?;
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(p + 1),
                _ => {}
            },
        }
        p += 1;
    }
}

/// Skip `<!-- ... -->` starting at its `<`.
pub fn comment(text: &Text, pos: usize) -> Result<usize> {
    text.find_seq(b"-->", pos + 4)
        .map(|p| p + 3)
        .ok_or(ErrorCode::DataIncomplete)
}

/// Skip `<? ... ?>` starting at its `<`.
pub fn instruction(text: &Text, pos: usize) -> Result<usize> {
    text.find_seq(b"?>", pos + 2)
        .map(|p| p + 2)
        .ok_or(ErrorCode::DataIncomplete)
}

/// Skip `<![CDATA[ ... ]]>` starting at its `<`.
pub fn cdata(text: &Text, pos: usize) -> Result<usize> {
    text.find_seq(b"]]>", pos + 9)
        .map(|p| p + 3)
        .ok_or(ErrorCode::DataIncomplete)
}

/// Find the `>` closing a start tag, ignoring `>` inside quoted values.
///
/// Returns its position and whether the tag was empty (`/>`).
pub fn start_tag_end(text: &Text, from: usize) -> Result<(usize, bool)> {
    let mut p = from;
    loop {
        let hit = text
            .find3(b'>', b'"', b'\'', p)
            .ok_or(ErrorCode::DataIncomplete)?;
        let b = text.at(hit)?;
        if b == b'>' {
            let empty = hit > 0 && text.get(hit - 1) == Some(b'/');
            return Ok((hit, empty));
        }
        p = text.find(b, hit + 1).ok_or(ErrorCode::DataIncomplete)? + 1;
    }
}

/// Skip an element's content starting just after its start tag.
///
/// Nested elements are tracked by depth; comments, CDATA sections and PIs are
/// stepped over whole, so an end tag inside them is never seen. Returns the
/// position of the `</` that closes the element. That end tag must carry
/// `name`.
pub fn content(text: &Text, from: usize, name: &[u8]) -> Result<usize> {
    let mut depth = 0usize;
    let mut p = from;
    loop {
        let lt = text.find(b'<', p).ok_or(ErrorCode::DataIncomplete)?;
        if text.starts_with(lt, b"</") {
            if depth == 0 {
                if !name_at(text, lt + 2, name) {
                    return Err(ErrorCode::TagInvalid);
                }
                return Ok(lt);
            }
            depth -= 1;
            p = lt + 2;
        } else if text.starts_with(lt, b"<!--") {
            p = comment(text, lt)?;
        } else if text.starts_with(lt, b"<![CDATA[") {
            p = cdata(text, lt)?;
        } else if text.starts_with(lt, b"<?") {
            p = instruction(text, lt)?;
        } else {
            let (gt, empty) = start_tag_end(text, lt + 1)?;
            if !empty && text.get(lt + 1) != Some(b'!') {
                depth += 1;
            }
            p = gt + 1;
        }
    }
}

/// Consume `</name>` or `/>` at `pos`.
pub fn end_tag(text: &Text, pos: usize) -> Result<usize> {
    if text.starts_with(pos, b"/>") {
        return Ok(pos + 2);
    }
    if !text.starts_with(pos, b"</") {
        return Err(ErrorCode::TagInvalid);
    }
    let mut p = pos + 2;
    while is_name_byte(text.at(p)?) {
        p += 1;
    }
    p = spaces(text, p);
    if text.at(p)? != b'>' {
        return Err(ErrorCode::TagInvalid);
    }
    Ok(p + 1)
}

/// Check whether the name at `pos` is exactly `name`.
fn name_at(text: &Text, pos: usize, name: &[u8]) -> bool {
    text.starts_with(pos, name) && !text.get(pos + name.len()).is_some_and(is_name_byte)
}

/// Bytes that may continue a name; multi-byte sequences are accepted wholesale.
#[inline]
fn is_name_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
