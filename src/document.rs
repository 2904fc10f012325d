//! Document handle
//!
//! Owns the loaded bytes, the frame stack and the sticky error. All reading
//! goes through [`Document::query`].
//!
//! ```no_run
//! use xmlscanf::{Arg, Document, Options};
//!
//! let mut doc = Document::open("animations.xml", Options::REQUIRE_XML_DECLARATION)?;
//! let types = doc.query(doc.root(), "^e", &mut [Arg::Name("types")])?;
//! let mut name = String::new();
//! if let Some(types) = types {
//!     while let Some(object) = doc.query(types, "^oe", &mut [Arg::Name("animatedobjecttype")])? {
//!         doc.query(object, "^oa%s", &mut [Arg::Name("name"), Arg::Str(&mut name)])?;
//!     }
//! }
//! # Ok::<(), xmlscanf::ErrorCode>(())
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use lru::LruCache;

use crate::core::cursor::Text;
use crate::core::declaration;
use crate::core::encoding::Encoding;
use crate::error::{ErrorCode, Result};
use crate::format::{eval, Arg, Format};
use crate::frame::{Frame, FrameRef};
use crate::options::Options;
use crate::stack::FrameStack;

/// A loaded XML document
pub struct Document {
    pub(crate) text: Text,
    pub(crate) encoding: Encoding,
    standalone: Option<bool>,
    pub(crate) options: Options,
    /// Sticky: once set, never cleared
    pub(crate) error: Option<ErrorCode>,
    pub(crate) frames: FrameStack,
    formats: LruCache<String, Arc<Format>>,
}

impl Document {
    /// Number of compiled format strings kept per document
    pub const FORMAT_CACHE_CAPACITY: usize = 64;

    /// Read and open a file.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            debug!("cannot read {}: {}", path.display(), e);
            ErrorCode::FileMissing
        })?;
        Document::from_bytes(bytes, options)
    }

    /// Open an in-memory document.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, options: Options) -> Result<Self> {
        let text = Text::new(bytes.into());
        let prolog = declaration::detect(&text, options).inspect_err(|e| {
            debug!("open failed: {} (code {})", e, e.code());
        })?;
        debug!(
            "opened {} bytes, encoding {:?}, standalone {:?}",
            text.len(),
            prolog.encoding,
            prolog.standalone
        );

        let capacity =
            NonZeroUsize::new(Self::FORMAT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Ok(Document {
            frames: FrameStack::new(Frame::root(prolog.start)?)?,
            text,
            encoding: prolog.encoding,
            standalone: prolog.standalone,
            options,
            error: None,
            formats: LruCache::new(capacity),
        })
    }

    /// The root frame, parent of the document element
    #[inline]
    pub fn root(&self) -> FrameRef {
        FrameRef::ROOT
    }

    /// Run a query on `frame`.
    ///
    /// Returns the frame the query ended on when anything matched, descended
    /// or was read, `Ok(None)` when nothing was found. Any error becomes the
    /// document's sticky error and is returned by every later query.
    pub fn query(
        &mut self,
        frame: FrameRef,
        format: &str,
        args: &mut [Arg<'_>],
    ) -> Result<Option<FrameRef>> {
        if let Some(code) = self.error {
            return Err(code);
        }
        let compiled = self.compiled(format).map_err(|e| self.fail(e))?;
        eval::run(self, frame, &compiled, args).map_err(|e| self.fail(e))
    }

    fn compiled(&mut self, format: &str) -> Result<Arc<Format>> {
        if let Some(compiled) = self.formats.get(format) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(Format::compile(format)?);
        self.formats.put(format.to_owned(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Record `code` unless an earlier error is already set; returns the sticky error.
    fn fail(&mut self, code: ErrorCode) -> ErrorCode {
        if self.error.is_none() {
            debug!(
                "query failed: {} (code {}) near line {}",
                code,
                code.code(),
                self.frames.top().line
            );
        }
        *self.error.get_or_insert(code)
    }

    /// True until the frame has been passed through a `%F` loop once.
    pub fn is_new(&self, frame: FrameRef) -> bool {
        match self.frames.get(frame) {
            Some(frame) => frame.new,
            None => {
                warn!("is_new on unknown frame {}", frame.get());
                false
            }
        }
    }

    /// True when the frame has nothing more to give in the current pass.
    ///
    /// May scan one child markup to find out; calling it again gives the same
    /// answer.
    pub fn is_done(&mut self, frame: FrameRef) -> bool {
        if self.error.is_some() {
            return true;
        }
        let utf8 = self.encoding.utf8_names();
        let Some(current) = self.frames.get_mut(frame) else {
            warn!("is_done on unknown frame {}", frame.get());
            return true;
        };
        let scanned = if current.cache.is_empty() && !current.exhausted {
            current.next_markup(&self.text, utf8).map(|_| ())
        } else {
            Ok(())
        };
        match scanned {
            Ok(()) => current.cache.is_empty() || !current.data_used,
            Err(code) => {
                self.fail(code);
                true
            }
        }
    }

    /// The sticky error, if any
    #[inline]
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    /// Force the sticky error, e.g. from a callback that hit its own failure.
    pub fn set_error(&mut self, code: ErrorCode) {
        debug!("error set by caller: {} (code {})", code, code.code());
        self.error = Some(code);
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// `standalone` from the XML declaration
    #[inline]
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// Release the document.
    pub fn close(self) {
        debug!("closing document, error {:?}", self.error);
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.text.len())
            .field("encoding", &self.encoding)
            .field("standalone", &self.standalone)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
