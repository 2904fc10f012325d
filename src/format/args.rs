//! Query arguments
//!
//! Each select with a name and each conversion takes one [`Arg`], in format
//! order. Outputs are mutable borrows, so a query writes straight into the
//! caller's variables.

use std::fmt;

use super::compiler::Slot;
use super::lexer::Size;
use crate::document::Document;
use crate::error::{ErrorCode, Result};
use crate::frame::FrameRef;

/// Callback run by `%F` for each pass over a descended frame
pub type Callback<'a> = &'a mut dyn FnMut(&mut Document, FrameRef) -> Result<()>;

/// One query argument
pub enum Arg<'a> {
    /// Markup name for `^e`, `^a`, `^P`
    Name(&'a str),
    /// Namespace-qualified name; only an empty namespace is accepted
    Qualified { namespace: &'a str, local: &'a str },
    /// `%s` / `%p` into a reused string
    Str(&'a mut String),
    /// `%s` / `%p` into a reused byte buffer (needed for ISO-8859-1 output)
    Bytes(&'a mut Vec<u8>),
    /// `%as` / `%ap`
    AllocStr(&'a mut Option<String>),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Char(&'a mut char),
    /// `%F`
    Callback(Callback<'a>),
}

fn int_bits(size: Size) -> u32 {
    match size {
        Size::Default => 32,
        Size::Long | Size::LongDouble => 64,
        Size::Short => 16,
        Size::Byte => 8,
    }
}

impl Arg<'_> {
    /// Check whether this argument can receive `slot`
    pub fn fits(&self, slot: Slot) -> bool {
        match slot {
            Slot::Name => matches!(self, Arg::Name(_) | Arg::Qualified { .. }),
            Slot::Text { alloc: false } => matches!(self, Arg::Str(_) | Arg::Bytes(_)),
            Slot::Text { alloc: true } => matches!(self, Arg::AllocStr(_)),
            Slot::Signed(size) => match self {
                Arg::I8(_) => int_bits(size) == 8,
                Arg::I16(_) => int_bits(size) == 16,
                Arg::I32(_) => int_bits(size) == 32,
                Arg::I64(_) => int_bits(size) == 64,
                _ => false,
            },
            Slot::Unsigned(size) => match self {
                Arg::U8(_) => int_bits(size) == 8,
                Arg::U16(_) => int_bits(size) == 16,
                Arg::U32(_) => int_bits(size) == 32,
                Arg::U64(_) => int_bits(size) == 64,
                _ => false,
            },
            Slot::Float(size) => match self {
                Arg::F32(_) => !matches!(size, Size::Long | Size::LongDouble),
                Arg::F64(_) => matches!(size, Size::Long | Size::LongDouble),
                _ => false,
            },
            Slot::Char => matches!(self, Arg::Char(_)),
            Slot::Callback => matches!(self, Arg::Callback(_)),
        }
    }

    /// Name carried by a select argument
    pub fn name(&self) -> Result<&str> {
        let name = match self {
            Arg::Name(name) => *name,
            Arg::Qualified { namespace, local } => {
                if !namespace.is_empty() {
                    return Err(ErrorCode::NamespaceInvalid);
                }
                *local
            }
            _ => return Err(ErrorCode::ArgumentMismatch),
        };
        if name.is_empty() {
            return Err(ErrorCode::NullTag);
        }
        Ok(name)
    }

    /// Store text output. Returns false if this is not a text argument.
    pub fn put_text(&mut self, bytes: &[u8]) -> bool {
        match self {
            Arg::Str(out) => {
                out.clear();
                out.push_str(&String::from_utf8_lossy(bytes));
            }
            Arg::Bytes(out) => {
                out.clear();
                out.extend_from_slice(bytes);
            }
            Arg::AllocStr(out) => **out = Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => return false,
        }
        true
    }

    /// Store an integer, truncating to the argument's width like a C cast.
    pub fn put_int(&mut self, value: i128) -> bool {
        match self {
            Arg::I8(out) => **out = value as i8,
            Arg::I16(out) => **out = value as i16,
            Arg::I32(out) => **out = value as i32,
            Arg::I64(out) => **out = value as i64,
            Arg::U8(out) => **out = value as u8,
            Arg::U16(out) => **out = value as u16,
            Arg::U32(out) => **out = value as u32,
            Arg::U64(out) => **out = value as u64,
            _ => return false,
        }
        true
    }

    pub fn put_float(&mut self, value: f64) -> bool {
        match self {
            Arg::F32(out) => **out = value as f32,
            Arg::F64(out) => **out = value,
            _ => return false,
        }
        true
    }

    pub fn put_char(&mut self, value: char) -> bool {
        match self {
            Arg::Char(out) => **out = value,
            _ => return false,
        }
        true
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Arg::Qualified { namespace, local } => f
                .debug_struct("Qualified")
                .field("namespace", namespace)
                .field("local", local)
                .finish(),
            Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Arg::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Arg::AllocStr(s) => f.debug_tuple("AllocStr").field(s).finish(),
            Arg::I8(v) => f.debug_tuple("I8").field(v).finish(),
            Arg::I16(v) => f.debug_tuple("I16").field(v).finish(),
            Arg::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Arg::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Arg::U8(v) => f.debug_tuple("U8").field(v).finish(),
            Arg::U16(v) => f.debug_tuple("U16").field(v).finish(),
            Arg::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Arg::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Arg::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Arg::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Arg::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Arg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_sizes() {
        let mut a = 0i32;
        let mut b = 0i64;
        let mut c = 0u8;
        let mut x = 0f32;
        assert!(Arg::I32(&mut a).fits(Slot::Signed(Size::Default)));
        assert!(!Arg::I32(&mut a).fits(Slot::Signed(Size::Long)));
        assert!(Arg::I64(&mut b).fits(Slot::Signed(Size::Long)));
        assert!(Arg::U8(&mut c).fits(Slot::Unsigned(Size::Byte)));
        assert!(!Arg::U8(&mut c).fits(Slot::Signed(Size::Byte)));
        assert!(Arg::F32(&mut x).fits(Slot::Float(Size::Default)));
        assert!(!Arg::F32(&mut x).fits(Slot::Float(Size::LongDouble)));
    }

    #[test]
    fn test_fits_text() {
        let mut s = String::new();
        let mut o: Option<String> = None;
        assert!(Arg::Str(&mut s).fits(Slot::Text { alloc: false }));
        assert!(!Arg::Str(&mut s).fits(Slot::Text { alloc: true }));
        assert!(Arg::AllocStr(&mut o).fits(Slot::Text { alloc: true }));
        assert!(Arg::Name("x").fits(Slot::Name));
    }

    #[test]
    fn test_names() {
        assert_eq!(Arg::Name("slide").name(), Ok("slide"));
        assert_eq!(Arg::Name("").name(), Err(ErrorCode::NullTag));
        let qualified = Arg::Qualified {
            namespace: "",
            local: "x",
        };
        assert_eq!(qualified.name(), Ok("x"));
        let qualified = Arg::Qualified {
            namespace: "urn:a",
            local: "x",
        };
        assert_eq!(qualified.name(), Err(ErrorCode::NamespaceInvalid));
    }

    #[test]
    fn test_put_wraps_like_a_cast() {
        let mut v = 0u8;
        assert!(Arg::U8(&mut v).put_int(-1));
        assert_eq!(v, 255);
        let mut s = String::from("old");
        assert!(Arg::Str(&mut s).put_text(b"new"));
        assert_eq!(s, "new");
        let mut c = ' ';
        assert!(!Arg::Char(&mut c).put_int(1));
    }
}
