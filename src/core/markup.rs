//! Markup classification and name extraction
//!
//! A [`Markup`] records where a child construct's name sits in the buffer and
//! what kind of construct it is. Nothing is copied; names are byte ranges into
//! the document. This module answers three questions about a markup:
//! - where does its name end (`scan_name`)
//! - where does the whole construct end (`markup_end`)
//! - where does its readable content start and stop (`content_start`, [`Stop`])

use super::cursor::{is_whitespace, Text};
use super::skip;
use super::unicode::{is_name_char, is_name_start_char};
use crate::error::{ErrorCode, Result};

/// Kind of markup a frame or cache entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupKind {
    /// The document itself
    Root,
    Element,
    Attribute,
    Comment,
    /// Processing instruction
    Instruction,
}

/// A scanned markup: kind plus the byte range of its name.
///
/// For comments `name` is the offset of `<!--` and `len` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markup {
    pub kind: MarkupKind,
    pub name: usize,
    pub len: usize,
}

impl Markup {
    #[inline]
    pub fn new(kind: MarkupKind, name: usize, len: usize) -> Self {
        Markup { kind, name, len }
    }

    /// Offset just past the name
    #[inline]
    pub fn name_end(&self) -> usize {
        self.name + self.len
    }

    /// The name bytes
    #[inline]
    pub fn name<'t>(&self, text: &'t Text) -> &'t [u8] {
        text.slice(self.name, self.name_end())
    }
}

/// Scan an XML name starting at `start` and return the offset just past it.
///
/// With `utf8` set, multi-byte sequences are decoded before classification;
/// otherwise each byte is its own code point (ISO-8859-1 view).
pub fn scan_name(text: &Text, start: usize, utf8: bool) -> Result<usize> {
    let mut p = start;
    loop {
        let (cp, width) = decode_char(text, p, utf8)?;
        let ok = if p == start {
            is_name_start_char(cp)
        } else {
            is_name_char(cp)
        };
        if !ok {
            break;
        }
        p += width;
    }
    if p == start {
        return Err(ErrorCode::TagInvalid);
    }
    Ok(p)
}

/// A name must be followed by whitespace, `>`, `=`, `/>` or `?>`.
pub fn check_name_end(text: &Text, end: usize) -> Result<()> {
    match text.at(end)? {
        b'>' | b'=' => Ok(()),
        b if is_whitespace(b) => Ok(()),
        b'/' | b'?' if text.at(end + 1)? == b'>' => Ok(()),
        _ => Err(ErrorCode::TagInvalid),
    }
}

fn decode_char(text: &Text, pos: usize, utf8: bool) -> Result<(u32, usize)> {
    let lead = text.at(pos)?;
    if lead < 0x80 || !utf8 {
        return Ok((lead as u32, 1));
    }
    let (width, init) = match lead {
        0xC0..=0xDF => (2, (lead & 0x1F) as u32),
        0xE0..=0xEF => (3, (lead & 0x0F) as u32),
        0xF0..=0xF7 => (4, (lead & 0x07) as u32),
        _ => return Ok((lead as u32, 1)),
    };
    let mut cp = init;
    for i in 1..width {
        match text.get(pos + i) {
            Some(b) if b & 0xC0 == 0x80 => cp = (cp << 6) | (b & 0x3F) as u32,
            _ => return Ok((lead as u32, 1)),
        }
    }
    Ok((cp, width))
}

/// Position just past the whole construct `markup` names.
pub fn markup_end(text: &Text, markup: Markup) -> Result<usize> {
    match markup.kind {
        MarkupKind::Attribute => Ok(attribute_value(text, markup)?.end + 1),
        MarkupKind::Element => {
            let (gt, empty) = skip::start_tag_end(text, markup.name_end())?;
            if empty {
                return Ok(gt + 1);
            }
            let close = skip::content(text, gt + 1, markup.name(text))?;
            skip::end_tag(text, close)
        }
        MarkupKind::Comment => skip::comment(text, markup.name),
        MarkupKind::Instruction => skip::instruction(text, markup.name - 2),
        MarkupKind::Root => Ok(text.len()),
    }
}

/// Location of a quoted attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeValue {
    /// First byte of the value
    pub start: usize,
    /// Offset of the closing quote
    pub end: usize,
    pub quote: u8,
}

/// Locate `="value"` after an attribute name.
pub fn attribute_value(text: &Text, markup: Markup) -> Result<AttributeValue> {
    let mut p = skip::spaces(text, markup.name_end());
    if text.at(p)? != b'=' {
        return Err(ErrorCode::TagInvalid);
    }
    p = skip::spaces(text, p + 1);
    let quote = text.at(p)?;
    if quote != b'"' && quote != b'\'' {
        return Err(ErrorCode::TagInvalid);
    }
    let end = text.find(quote, p + 1).ok_or(ErrorCode::DataIncomplete)?;
    Ok(AttributeValue {
        start: p + 1,
        end,
        quote,
    })
}

/// What ends a run of readable content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Closing quote of an attribute value
    Quote(u8),
    /// Any `<` other than a CDATA section
    Markup,
    /// `-->`
    Comment,
    /// `?>`
    Instruction,
}

impl Stop {
    /// Whether entities and whitespace are decoded in this content
    #[inline]
    pub fn decodes(self) -> bool {
        matches!(self, Stop::Quote(_) | Stop::Markup)
    }

    /// Check whether content ends at `pos`.
    pub fn hit(self, text: &Text, pos: usize) -> Result<bool> {
        let b = text.at(pos)?;
        Ok(match self {
            Stop::Quote(q) => b == q,
            Stop::Markup => b == b'<' && !text.starts_with(pos, b"<![CDATA["),
            Stop::Comment => text.starts_with(pos, b"-->"),
            Stop::Instruction => text.starts_with(pos, b"?>"),
        })
    }
}

/// Where the readable content of `markup` begins, and what ends it.
///
/// Returns `None` for an empty element (`<x/>`).
pub fn content_start(text: &Text, markup: Markup) -> Result<Option<(usize, Stop)>> {
    Ok(Some(match markup.kind {
        MarkupKind::Attribute => {
            let value = attribute_value(text, markup)?;
            (value.start, Stop::Quote(value.quote))
        }
        MarkupKind::Element => {
            let (gt, empty) = skip::start_tag_end(text, markup.name_end())?;
            if empty {
                return Ok(None);
            }
            (gt + 1, Stop::Markup)
        }
        MarkupKind::Root => (markup.name, Stop::Markup),
        MarkupKind::Comment => (markup.name + 4, Stop::Comment),
        MarkupKind::Instruction => (skip::spaces(text, markup.name_end()), Stop::Instruction),
    }))
}
