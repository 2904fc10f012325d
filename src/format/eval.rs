//! Format Evaluator
//!
//! Runs a compiled [`Format`] against a frame. Selects locate markup through
//! the frame's lookahead cache, conversions decode the selected markup's
//! content into the caller's arguments, and `%F` drives a callback over a
//! descended frame until it stops producing data.

use log::trace;

use super::args::Arg;
use super::compiler::{Descend, Directive, Format};
use super::convert::{parse_char, parse_float, parse_int};
use super::lexer::{Conversion, Spec, Target};
use crate::core::cursor::{is_whitespace, Text};
use crate::core::entities;
use crate::core::markup::{content_start, Markup, MarkupKind, Stop};
use crate::core::skip;
use crate::document::Document;
use crate::error::{ErrorCode, Result};
use crate::frame::FrameRef;
use crate::options::Options;

/// Per-query interpreter state
struct State {
    /// A select matched and its data has not been read yet
    wanted: bool,
    /// The last select was optional
    optional: bool,
    /// The next conversion starts at the beginning of the content
    advance: bool,
    /// Something matched, descended or was read
    result: bool,
}

/// Run `format` on frame `target`.
pub(crate) fn run(
    doc: &mut Document,
    target: FrameRef,
    format: &Format,
    args: &mut [Arg<'_>],
) -> Result<Option<FrameRef>> {
    if args.len() != format.slots.len()
        || !args.iter().zip(&format.slots).all(|(arg, &slot)| arg.fits(slot))
    {
        return Err(ErrorCode::ArgumentMismatch);
    }
    if doc.frames.position(target).is_none() {
        return Err(ErrorCode::ElementInvalid);
    }
    doc.frames.unwind_to(target, &doc.text)?;
    // Matches left by an earlier query were either read or descended into
    doc.frames.top_mut().consume();

    let utf8 = doc.encoding.utf8_names();
    let latin1 = doc.options.contains(Options::CONVERT_UTF8_TO_ISO_8859_1);
    let mut state = State {
        wanted: false,
        optional: false,
        advance: true,
        result: false,
    };

    let directives = &format.directives;
    let mut i = 0;
    let mut a = 0;
    while i < directives.len() {
        match &directives[i] {
            Directive::Select {
                target: select,
                optional,
                descend,
            } => {
                state.advance = true;
                if !state.wanted {
                    doc.frames.top_mut().consume();
                }
                let name = if select.takes_name() {
                    a += 1;
                    Some(args[a - 1].name()?)
                } else {
                    None
                };
                state.wanted = true;
                state.optional = *optional;

                let text = &doc.text;
                let top = doc.frames.top_mut();
                let found = top.find_markup(text, utf8, |m| selects(text, m, *select, name))?;
                let Some(index) = found else {
                    top.data_unavailable = true;
                    if !optional && top.new && *select != Target::Any {
                        return Err(ErrorCode::TagMissing);
                    }
                    let (next, skipped) = skip_bound(directives, i + 1);
                    trace!(
                        "select {:?} {:?} not found, skipping {} directives",
                        select,
                        name,
                        next - i - 1
                    );
                    i = next;
                    a += skipped;
                    continue;
                };

                top.matched = Some(index);
                state.result = true;
                let markup = top.cache[index];
                let push = match descend {
                    Descend::Always => true,
                    Descend::IfElement => markup.kind == MarkupKind::Element || *select == Target::Any,
                    Descend::Never => false,
                };
                if push {
                    top.data_used = true;
                    doc.frames.push(markup)?;
                }
            }

            Directive::Close => {
                state.advance = true;
                let top = doc.frames.top_mut();
                if top.matched.is_some() {
                    top.consume();
                } else {
                    if top.id != target {
                        doc.frames.pop(&doc.text)?;
                    }
                    doc.frames.top_mut().data_used = true;
                    state.result = true;
                }
                state.wanted = false;
            }

            Directive::Convert {
                spec,
                prefix,
                suffix,
            } => {
                let arg = &mut args[a];
                a += 1;
                match spec.conversion {
                    Conversion::Callback => {
                        if let Arg::Callback(callback) = arg {
                            call_repeatedly(doc, target, &mut **callback)?;
                        }
                    }
                    Conversion::Path => {
                        let path = doc.frames.path_to(&doc.text);
                        let path = match spec.width {
                            Some(width) => path.chars().take(width).collect(),
                            None => path,
                        };
                        arg.put_text(path.as_bytes());
                    }
                    _ => {
                        let read = ContentRead {
                            advance: state.advance,
                            prefix,
                            suffix,
                            width: spec.width,
                            latin1,
                        };
                        state.advance = false;
                        let Some(content) = read_content(doc, spec, &read)? else {
                            doc.frames.top_mut().data_unavailable = true;
                            let (next, skipped) = skip_bound(directives, i + 1);
                            i = next;
                            a += skipped;
                            continue;
                        };
                        store(doc, spec, &state, arg, &content)?;
                    }
                }
                state.wanted = false;
                state.result = true;
            }
        }
        i += 1;
    }

    let top = doc.frames.top_mut();
    if !state.wanted {
        top.consume();
    }
    Ok(state.result.then_some(top.id))
}

/// Match test for a select directive
fn selects(text: &Text, markup: &Markup, target: Target, name: Option<&str>) -> bool {
    let kind = match target {
        Target::Any => return true,
        Target::Comment => return markup.kind == MarkupKind::Comment,
        Target::Element => MarkupKind::Element,
        Target::Attribute => MarkupKind::Attribute,
        Target::Instruction => MarkupKind::Instruction,
    };
    markup.kind == kind && name.is_some_and(|name| markup.name(text) == name.as_bytes())
}

/// Index after the conversions bound to the current select, and their argument count.
fn skip_bound(directives: &[Directive], from: usize) -> (usize, usize) {
    let mut i = from;
    let mut slots = 0;
    while let Some(directive) = directives
        .get(i)
        .filter(|d| matches!(d, Directive::Convert { .. }))
    {
        slots += directive.slots();
        i += 1;
    }
    (i, slots)
}

/// Drive a `%F` callback over the top frame until it reports done.
fn call_repeatedly(
    doc: &mut Document,
    target: FrameRef,
    callback: &mut dyn FnMut(&mut Document, FrameRef) -> Result<()>,
) -> Result<()> {
    let frame = doc.frames.top().id;
    loop {
        {
            let current = doc.frames.get_mut(frame).ok_or(ErrorCode::ElementInvalid)?;
            current.data_used = false;
            current.data_unavailable = false;
        }
        callback(doc, frame)?;
        if let Some(code) = doc.error {
            return Err(code);
        }
        if doc.frames.position(frame).is_none() {
            return Err(ErrorCode::ElementInvalid);
        }
        doc.frames.unwind_to(frame, &doc.text)?;
        doc.frames.top_mut().new = false;
        if doc.is_done(frame) {
            break;
        }
    }
    if let Some(code) = doc.error {
        return Err(code);
    }

    if frame != target {
        doc.frames.pop(&doc.text)?;
        doc.frames.top_mut().data_used = true;
    }
    Ok(())
}

/// How a conversion reads content
struct ContentRead<'f> {
    advance: bool,
    prefix: &'f [u8],
    suffix: &'f [u8],
    width: Option<usize>,
    latin1: bool,
}

/// Decode the content of the matched markup, or of the top frame's own markup.
///
/// Returns `None` when the literal prefix or suffix does not match.
fn read_content(doc: &mut Document, spec: &Spec, read: &ContentRead<'_>) -> Result<Option<Vec<u8>>> {
    let text = &doc.text;
    let frame = doc.frames.top_mut();
    let source = frame.matched_markup().unwrap_or(frame.markup);
    let Some((start, stop)) = content_start(text, source)? else {
        return Ok(Some(Vec::new()));
    };

    let from = if read.advance {
        start
    } else {
        frame.content_pos.max(start)
    };
    let Some(begin) = match_prefix(text, from, read.prefix) else {
        return Ok(None);
    };

    let default_width = (spec.conversion == Conversion::Char).then_some(1);
    let mut remaining = read.width.or(default_width).unwrap_or(usize::MAX);
    let mut p = begin;
    let mut in_cdata = false;
    let mut after_suffix = None;
    while remaining > 0 {
        if in_cdata {
            if text.starts_with(p, b"]]>") {
                in_cdata = false;
                p += 3;
            } else {
                p += text.char_len(p)?;
                remaining -= 1;
            }
            continue;
        }
        if stop.hit(text, p)? {
            break;
        }
        if !read.suffix.is_empty() {
            if let Some(end) = match_suffix(text, p, read.suffix) {
                after_suffix = Some(end);
                break;
            }
        }
        if stop == Stop::Markup && text.starts_with(p, b"<![CDATA[") {
            in_cdata = true;
            p += 9;
            continue;
        }
        if stop.decodes() && text.at(p)? == b'&' {
            p = text.find(b';', p).ok_or(ErrorCode::DataIncomplete)? + 1;
        } else if text.starts_with(p, b"\r\n") {
            p += 2;
        } else {
            p += text.char_len(p)?;
        }
        remaining -= 1;
    }
    let end = p;

    if !read.suffix.is_empty() {
        match after_suffix.or_else(|| match_suffix(text, p, read.suffix)) {
            Some(next) => p = next,
            None => return Ok(None),
        }
    }
    frame.content_pos = p;

    let decoded = entities::decode(text.slice(begin, end), stop.decodes(), read.latin1)?;
    Ok(Some(decoded.into_owned()))
}

/// Match a literal prefix; format whitespace matches zero or more spaces.
fn match_prefix(text: &Text, mut p: usize, prefix: &[u8]) -> Option<usize> {
    for &b in prefix {
        if is_whitespace(b) {
            p = skip::spaces(text, p);
        } else if text.get(p) == Some(b) {
            p += 1;
        } else {
            return None;
        }
    }
    Some(p)
}

/// Match a literal suffix; a run of format whitespace matches one or more spaces.
fn match_suffix(text: &Text, mut p: usize, suffix: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < suffix.len() {
        let b = suffix[i];
        if is_whitespace(b) {
            if !text.get(p).is_some_and(is_whitespace) {
                return None;
            }
            p = skip::spaces(text, p);
            while suffix.get(i + 1).copied().is_some_and(is_whitespace) {
                i += 1;
            }
        } else if text.get(p) == Some(b) {
            p += 1;
        } else {
            return None;
        }
        i += 1;
    }
    Some(p)
}

/// Convert decoded content into `arg`.
///
/// Only reads of a matched child count as data used. A frame's own content
/// reads the same on every `%F` pass, so it never keeps the loop going.
fn store(doc: &mut Document, spec: &Spec, state: &State, arg: &mut Arg<'_>, content: &[u8]) -> Result<()> {
    let frame = doc.frames.top_mut();
    if frame.matched.is_some() {
        frame.data_used = true;
    }
    if spec.conversion == Conversion::Str {
        arg.put_text(content);
        return Ok(());
    }

    if content.iter().all(|&b| is_whitespace(b)) {
        if !state.optional && frame.new {
            return Err(ErrorCode::ContentMissing);
        }
        return Ok(());
    }
    match spec.conversion {
        Conversion::Int(radix) | Conversion::Unsigned(radix) => {
            if let Some(value) = parse_int(content, radix) {
                arg.put_int(value);
            }
        }
        Conversion::Float => {
            if let Some(value) = parse_float(content) {
                arg.put_float(value);
            }
        }
        Conversion::Char => {
            if let Some(value) = parse_char(content) {
                arg.put_char(value);
            }
        }
        Conversion::Str | Conversion::Path | Conversion::Callback => {}
    }
    Ok(())
}
