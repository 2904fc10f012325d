//! Frame: scan state for one open markup
//!
//! A frame exists for every markup on the current access path. It owns the
//! scan cursor inside that markup and a lookahead cache of children that were
//! scanned but not consumed yet, which is what lets queries ask for fields in
//! a different order than the document stores them.
//!
//! Layout of a frame's view of an element:
//!
//! ```text
//! <name  attr="v" ...>  content with <child/> markup  </name>
//!      ^ pos starts here; attributes are children until the start tag closes
//! ```

use std::num::NonZeroU32;

use log::{debug, trace};

use crate::core::cursor::Text;
use crate::core::markup::{check_name_end, markup_end, scan_name, Markup, MarkupKind};
use crate::core::skip;
use crate::error::{ErrorCode, Result};

/// Initial capacity of a frame's lookahead cache
pub const LOOKAHEAD_CAPACITY: usize = 16;

/// Identifier of an open frame.
///
/// Ids increase for every frame pushed on a document and are never reused,
/// so a stale reference is detected instead of silently naming a new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRef(NonZeroU32);

impl FrameRef {
    /// The document's root frame
    pub const ROOT: FrameRef = FrameRef(NonZeroU32::MIN.saturating_add(1));

    /// Raw id
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    pub(crate) fn next(self) -> Option<FrameRef> {
        self.0.checked_add(1).map(FrameRef)
    }
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub id: FrameRef,
    pub parent: Option<FrameRef>,
    /// The frame's own markup
    pub markup: Markup,
    /// Scan cursor within the frame's content
    pub pos: usize,
    /// Approximate line of `pos`
    pub line: u32,
    /// Where the last conversion of the current query stopped
    pub content_pos: usize,
    pub start_tag_closed: bool,
    /// Scanned but unconsumed children, in document order
    pub cache: Vec<Markup>,
    /// Last scanned child whose extent has not been skipped yet
    pub pending: Option<Markup>,
    /// Cache index selected by the running query
    pub matched: Option<usize>,
    /// Every child has been scanned
    pub exhausted: bool,
    /// First visit
    pub new: bool,
    pub data_used: bool,
    pub data_unavailable: bool,
}

impl Frame {
    fn with_markup(id: FrameRef, parent: Option<FrameRef>, markup: Markup) -> Result<Self> {
        let mut cache = Vec::new();
        cache
            .try_reserve(LOOKAHEAD_CAPACITY)
            .map_err(|_| ErrorCode::MemoryFailure)?;
        Ok(Frame {
            id,
            parent,
            markup,
            pos: markup.name_end(),
            line: 1,
            content_pos: 0,
            start_tag_closed: markup.kind != MarkupKind::Element,
            cache,
            pending: None,
            matched: None,
            exhausted: false,
            new: true,
            data_used: false,
            data_unavailable: false,
        })
    }

    /// Root frame scanning from `start`
    pub fn root(start: usize) -> Result<Self> {
        Frame::with_markup(FrameRef::ROOT, None, Markup::new(MarkupKind::Root, start, 0))
    }

    /// Frame for a child markup of `parent`
    pub fn child(id: FrameRef, parent: &Frame, markup: Markup) -> Result<Self> {
        let mut frame = Frame::with_markup(id, Some(parent.id), markup)?;
        frame.line = parent.line;
        Ok(frame)
    }

    /// Scan the next child markup.
    ///
    /// Finishes the pending child first, then steps over whitespace, character
    /// data, CDATA sections and DOCTYPE blocks until a child markup starts.
    /// Returns `None` once the frame is exhausted.
    pub fn next_markup(&mut self, text: &Text, utf8: bool) -> Result<Option<Markup>> {
        if self.exhausted || !matches!(self.markup.kind, MarkupKind::Element | MarkupKind::Root) {
            return Ok(None);
        }
        if let Some(pending) = self.pending.take() {
            self.pos = markup_end(text, pending)?;
        }

        loop {
            skip::whitespace(text, &mut self.pos, &mut self.line);
            let p = self.pos;
            let Some(b) = text.get(p) else {
                if self.markup.kind == MarkupKind::Root {
                    self.exhausted = true;
                    return Ok(None);
                }
                return Err(ErrorCode::DataIncomplete);
            };

            let markup = if !self.start_tag_closed {
                if b == b'>' {
                    self.start_tag_closed = true;
                    self.pos = p + 1;
                    continue;
                } else if text.starts_with(p, b"/>") {
                    self.exhausted = true;
                    return Ok(None);
                }
                self.named(text, MarkupKind::Attribute, p, utf8)?
            } else if b != b'<' {
                self.pos = text.find(b'<', p).unwrap_or(text.len());
                continue;
            } else if text.starts_with(p, b"</") {
                self.exhausted = true;
                return Ok(None);
            } else if text.starts_with(p, b"<!--") {
                self.pos = p + 4;
                Markup::new(MarkupKind::Comment, p, 0)
            } else if text.starts_with(p, b"<![CDATA[") {
                self.pos = skip::cdata(text, p)?;
                continue;
            } else if text.starts_with(p, b"<!DOCTYPE") {
                self.pos = skip::doctype(text, p)?;
                continue;
            } else if text.starts_with(p, b"<!") {
                return Err(ErrorCode::TagInvalid);
            } else if text.starts_with(p, b"<?") {
                self.named(text, MarkupKind::Instruction, p + 2, utf8)?
            } else {
                self.named(text, MarkupKind::Element, p + 1, utf8)?
            };

            trace!(
                "frame {} scanned {:?} at line {}",
                self.id.get(),
                markup.kind,
                self.line
            );
            self.remember(markup)?;
            self.pending = Some(markup);
            return Ok(Some(markup));
        }
    }

    fn named(&mut self, text: &Text, kind: MarkupKind, start: usize, utf8: bool) -> Result<Markup> {
        let end = scan_name(text, start, utf8)?;
        check_name_end(text, end)?;
        self.pos = end;
        Ok(Markup::new(kind, start, end - start))
    }

    fn remember(&mut self, markup: Markup) -> Result<()> {
        if self.cache.len() == self.cache.capacity() {
            debug!(
                "frame {} lookahead cache full at {} entries, growing",
                self.id.get(),
                self.cache.len()
            );
            self.cache
                .try_reserve(self.cache.len().max(1))
                .map_err(|_| ErrorCode::MemoryFailure)?;
        }
        self.cache.push(markup);
        Ok(())
    }

    /// Find a child satisfying `matches`, searching the cache before scanning on.
    pub fn find_markup(
        &mut self,
        text: &Text,
        utf8: bool,
        mut matches: impl FnMut(&Markup) -> bool,
    ) -> Result<Option<usize>> {
        if let Some(index) = self.cache.iter().position(&mut matches) {
            return Ok(Some(index));
        }
        while let Some(markup) = self.next_markup(text, utf8)? {
            if matches(&markup) {
                return Ok(Some(self.cache.len() - 1));
            }
        }
        Ok(None)
    }

    /// The cache entry selected by the running query
    #[inline]
    pub fn matched_markup(&self) -> Option<Markup> {
        self.matched.and_then(|index| self.cache.get(index).copied())
    }

    /// Drop the matched entry from the cache.
    pub fn consume(&mut self) -> Option<Markup> {
        let index = self.matched.take()?;
        (index < self.cache.len()).then(|| self.cache.remove(index))
    }

    /// Position just past this frame's markup, skipping whatever is unread.
    pub fn end(&self, text: &Text) -> Result<usize> {
        if self.markup.kind != MarkupKind::Element {
            return markup_end(text, self.markup);
        }
        let mut pos = match self.pending {
            Some(pending) => markup_end(text, pending)?,
            None => self.pos,
        };
        if !self.start_tag_closed {
            let (gt, empty) = skip::start_tag_end(text, pos)?;
            if empty {
                return Ok(gt + 1);
            }
            pos = gt + 1;
        }
        let close = skip::content(text, pos, self.markup.name(text))?;
        skip::end_tag(text, close)
    }
}
