//! xmlscanf - scanf-style pull reading of XML documents
//!
//! A single-pass, non-validating reader. Callers ask for markup by name with
//! a small format language and get decoded values written into their own
//! variables:
//!
//! ```
//! use xmlscanf::{Arg, Document, Options};
//!
//! let mut doc = Document::from_bytes(
//!     r#"<?xml version="1.0"?><size w="10" h="20"/>"#,
//!     Options::NONE,
//! )?;
//! let size = doc.query(doc.root(), "^e", &mut [Arg::Name("size")])?.unwrap();
//! let (mut w, mut h) = (0i32, 0i32);
//! // Attributes can be read in any order
//! doc.query(size, "^a%d", &mut [Arg::Name("h"), Arg::I32(&mut h)])?;
//! doc.query(size, "^a%d", &mut [Arg::Name("w"), Arg::I32(&mut w)])?;
//! assert_eq!((w, h), (10, 20));
//! # Ok::<(), xmlscanf::ErrorCode>(())
//! ```
//!
//! Memory use is proportional to nesting depth plus the number of scanned but
//! unconsumed siblings, never to document size.

pub mod core;
pub mod document;
pub mod error;
pub mod format;
pub mod frame;
pub mod memory;
pub mod options;
mod stack;

pub use crate::core::encoding::Encoding;
pub use crate::core::entities::escape;
pub use document::Document;
pub use error::{ErrorCode, Result};
pub use format::{Arg, Callback};
pub use frame::FrameRef;
pub use options::Options;
