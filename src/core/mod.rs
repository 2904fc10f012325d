//! Core XML scanning primitives
//!
//! This module contains the fundamental building blocks the query engine
//! drives:
//! - Cursor: bounds-checked buffer access and memchr-accelerated searches
//! - Skip: fast-forward over whitespace, comments, PIs, CDATA and whole elements
//! - Unicode: XML 1.0 name character classes
//! - Markup: markup kinds, name scanning, content ranges
//! - Entities: content decoding with Cow (zero-copy when possible)
//! - Encoding / Declaration: BOM, signature and `<?xml ... ?>` detection

pub mod cursor;
pub mod declaration;
pub mod encoding;
pub mod entities;
pub mod markup;
pub mod skip;
pub mod unicode;
