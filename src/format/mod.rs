//! Query format strings
//!
//! A format is a scanf-like string with XML-specific directives:
//! - `^e` `^a` `^C` `^P` `^*` select markup, `^o` makes a select optional
//! - `^` alone closes the current selection or frame
//! - `%s` `%d` `%f` ... read content, `%p` writes the path, `%F` runs a callback
//!
//! Formats are compiled once and cached per document.

pub mod args;
pub mod compiler;
pub mod convert;
pub mod eval;
pub mod lexer;

pub use args::{Arg, Callback};
pub use compiler::Format;
