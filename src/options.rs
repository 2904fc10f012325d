//! Open-time options.

use std::ops::{BitOr, BitOrAssign};

/// Bitmask of flags accepted by [`Document::open`](crate::Document::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Options(u32);

impl Options {
    /// No options.
    pub const NONE: Options = Options(0);
    /// Reject documents without an `<?xml ... ?>` declaration or a recognizable signature.
    pub const REQUIRE_XML_DECLARATION: Options = Options(0x2);
    /// Experimental: emit ISO-8859-1 instead of UTF-8 for decoded text.
    pub const CONVERT_UTF8_TO_ISO_8859_1: Options = Options(0x8000_0000);

    /// Raw bit value.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits. Unknown bits are kept but ignored.
    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        Options(bits)
    }

    /// True if every flag in `other` is set.
    #[inline]
    pub fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Options) {
        self.0 |= rhs.0;
    }
}
