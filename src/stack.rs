//! The frame stack
//!
//! Frames form a single ancestor chain: the root at the bottom, the frame the
//! last query descended into at the top. Popping a frame skips whatever of its
//! markup was left unread and moves the parent's cursor past it.

use log::trace;

use crate::core::cursor::Text;
use crate::core::markup::{Markup, MarkupKind};
use crate::error::{ErrorCode, Result};
use crate::frame::{Frame, FrameRef};

/// Initial stack capacity; grows by doubling.
const INITIAL_DEPTH: usize = 8;

#[derive(Debug)]
pub(crate) struct FrameStack {
    /// Never empty: `frames[0]` is the root.
    frames: Vec<Frame>,
    last_id: FrameRef,
}

impl FrameStack {
    pub fn new(root: Frame) -> Result<Self> {
        let mut frames = Vec::new();
        frames
            .try_reserve(INITIAL_DEPTH)
            .map_err(|_| ErrorCode::MemoryFailure)?;
        let last_id = root.id;
        frames.push(root);
        Ok(FrameStack { frames, last_id })
    }

    /// Descend into `markup`, a child of the top frame.
    pub fn push(&mut self, markup: Markup) -> Result<FrameRef> {
        let id = self.last_id.next().ok_or(ErrorCode::MemoryFailure)?;
        let frame = Frame::child(id, self.top(), markup)?;
        if self.frames.len() == self.frames.capacity() {
            self.frames
                .try_reserve(self.frames.len())
                .map_err(|_| ErrorCode::MemoryFailure)?;
        }
        trace!("push frame {} ({:?}) depth {}", id.get(), markup.kind, self.frames.len());
        self.frames.push(frame);
        self.last_id = id;
        Ok(id)
    }

    /// Stack index of frame `id`, most recent first
    #[inline]
    pub fn position(&self, id: FrameRef) -> Option<usize> {
        self.frames.iter().rposition(|frame| frame.id == id)
    }

    pub fn get(&self, id: FrameRef) -> Option<&Frame> {
        self.position(id).map(|index| &self.frames[index])
    }

    pub fn get_mut(&mut self, id: FrameRef) -> Option<&mut Frame> {
        let index = self.position(id)?;
        Some(&mut self.frames[index])
    }

    #[inline]
    pub fn top(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Pop the top frame and return its parent's id.
    ///
    /// The root cannot be popped.
    pub fn pop(&mut self, text: &Text) -> Result<FrameRef> {
        if self.frames.len() <= 1 {
            return Err(ErrorCode::ElementInvalid);
        }
        let end = self.top().end(text)?;
        let frame = self.frames.pop().ok_or(ErrorCode::ElementInvalid)?;
        let parent = self.top_mut();
        if parent.pending == Some(frame.markup) {
            parent.pending = None;
            parent.pos = end;
        } else if parent.pos < end {
            parent.pos = end;
        }
        trace!("pop frame {} -> {}", frame.id.get(), parent.id.get());
        Ok(parent.id)
    }

    /// Pop frames until `id` is on top.
    pub fn unwind_to(&mut self, id: FrameRef, text: &Text) -> Result<()> {
        while self.top().id > id {
            self.pop(text)?;
        }
        Ok(())
    }

    /// Path from the root to the top frame's matched markup, as `/a/b[@c]`.
    pub fn path_to(&self, text: &Text) -> String {
        let mut path = String::new();
        for frame in &self.frames[1..] {
            push_segment(&mut path, text, frame.markup);
        }
        if let Some(markup) = self.top().matched_markup() {
            push_segment(&mut path, text, markup);
        }
        path
    }
}

fn push_segment(path: &mut String, text: &Text, markup: Markup) {
    let name = String::from_utf8_lossy(markup.name(text));
    match markup.kind {
        MarkupKind::Root => {}
        MarkupKind::Element => {
            path.push('/');
            path.push_str(&name);
        }
        MarkupKind::Attribute => {
            path.push_str("[@");
            path.push_str(&name);
            path.push(']');
        }
        MarkupKind::Comment => path.push_str("/comment()"),
        MarkupKind::Instruction => {
            path.push_str("/processing-instruction(");
            path.push_str(&name);
            path.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(s: &str) -> (Text, FrameStack) {
        let text = Text::new(s.as_bytes().to_vec());
        let stack = FrameStack::new(Frame::root(0).unwrap()).unwrap();
        (text, stack)
    }

    fn descend(stack: &mut FrameStack, text: &Text, name: &[u8]) -> FrameRef {
        let top = stack.top_mut();
        let index = top
            .find_markup(text, true, |m| m.name(text) == name)
            .unwrap()
            .unwrap();
        let markup = top.cache[index];
        stack.push(markup).unwrap()
    }

    #[test]
    fn test_push_assigns_increasing_ids() {
        let (text, mut stack) = setup("<a><b><c/></b></a>");
        let a = descend(&mut stack, &text, b"a");
        let b = descend(&mut stack, &text, b"b");
        assert_eq!(a.get(), 3);
        assert_eq!(b.get(), 4);
        assert_eq!(stack.get(a).and_then(|f| f.parent), Some(FrameRef::ROOT));
        assert_eq!(stack.position(b), Some(2));
    }

    #[test]
    fn test_pop_moves_parent_past_child() {
        let (text, mut stack) = setup("<a><b>x</b><c/></a>");
        let a = descend(&mut stack, &text, b"a");
        descend(&mut stack, &text, b"b");
        assert_eq!(stack.pop(&text), Ok(a));
        let top = stack.top();
        assert_eq!(top.pos, 11);
        assert_eq!(top.pending, None);
    }

    #[test]
    fn test_unwind_and_pop_root() {
        let (text, mut stack) = setup("<a><b><c/></b></a>");
        descend(&mut stack, &text, b"a");
        descend(&mut stack, &text, b"b");
        descend(&mut stack, &text, b"c");
        stack.unwind_to(FrameRef::ROOT, &text).unwrap();
        assert_eq!(stack.top().id, FrameRef::ROOT);
        assert_eq!(stack.top().pos, text.len());
        assert_eq!(stack.pop(&text), Err(ErrorCode::ElementInvalid));
    }

    #[test]
    fn test_ids_not_reused() {
        let (text, mut stack) = setup("<a/>");
        let first = descend(&mut stack, &text, b"a");
        stack.pop(&text).unwrap();
        let second = descend(&mut stack, &text, b"a");
        assert!(second > first);
        assert_eq!(stack.get(first).map(|f| f.id), None);
    }

    #[test]
    fn test_path() {
        let (text, mut stack) = setup("<a><b k='1'><!--c--><?pi x?></b></a>");
        descend(&mut stack, &text, b"a");
        descend(&mut stack, &text, b"b");
        assert_eq!(stack.path_to(&text), "/a/b");

        let top = stack.top_mut();
        top.matched = top.find_markup(&text, true, |m| m.kind == MarkupKind::Attribute).unwrap();
        assert_eq!(stack.path_to(&text), "/a/b[@k]");

        let top = stack.top_mut();
        top.matched = top.find_markup(&text, true, |m| m.kind == MarkupKind::Comment).unwrap();
        assert_eq!(stack.path_to(&text), "/a/b/comment()");

        let top = stack.top_mut();
        top.matched = top.find_markup(&text, true, |m| m.kind == MarkupKind::Instruction).unwrap();
        assert_eq!(stack.path_to(&text), "/a/b/processing-instruction(pi)");
    }
}
