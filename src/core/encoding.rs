//! XML Encoding Detection
//!
//! Recognizes byte-order marks, the four-byte signatures of documents without
//! a declaration, and the labels used in `encoding="..."`. Only 8-bit
//! ASCII-compatible encodings are read; the wide and EBCDIC encodings are
//! detected so they can be refused instead of misparsed.

/// Character encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// No BOM and no recognized `encoding` label; treated as 8-bit ASCII-compatible.
    #[default]
    Unknown,
    Utf8,
    /// Any ISO-8859-N part
    Iso8859,
    UsAscii,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Ebcdic,
}

impl Encoding {
    /// Check if documents in this encoding can be read
    #[inline]
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Encoding::Unknown | Encoding::Utf8 | Encoding::Iso8859 | Encoding::UsAscii
        )
    }

    /// Names are decoded as UTF-8 for UTF-8 and unresolved documents.
    #[inline]
    pub fn utf8_names(self) -> bool {
        matches!(self, Encoding::Utf8 | Encoding::Unknown)
    }

    /// Detect from a byte-order mark.
    ///
    /// Returns the encoding and the number of bytes to skip. Only the UTF-8
    /// BOM is skipped; wide encodings are rejected later anyway.
    pub fn from_bom(input: &[u8]) -> Option<(Encoding, usize)> {
        match input {
            [0x00, 0x00, 0xFE, 0xFF, ..] => Some((Encoding::Utf32Be, 0)),
            [0xFF, 0xFE, 0x00, 0x00, ..] => Some((Encoding::Utf32Le, 0)),
            [0xFE, 0xFF, ..] => Some((Encoding::Utf16Be, 0)),
            [0xFF, 0xFE, ..] => Some((Encoding::Utf16Le, 0)),
            [0xEF, 0xBB, 0xBF, ..] => Some((Encoding::Utf8, 3)),
            _ => None,
        }
    }

    /// Detect from the first four bytes of a document without a declaration.
    ///
    /// These are `<?` (or `<` and NULs) as the wide encodings and EBCDIC spell them.
    pub fn from_signature(input: &[u8]) -> Option<Encoding> {
        match input.get(..4)? {
            [0x3C, 0x00, 0x3F, 0x00] => Some(Encoding::Utf16Le),
            [0x00, 0x3C, 0x00, 0x3F] => Some(Encoding::Utf16Be),
            [0x3C, 0x00, 0x00, 0x00] => Some(Encoding::Utf32Le),
            [0x00, 0x00, 0x00, 0x3C] => Some(Encoding::Utf32Be),
            [0x4C, 0x6F, 0xA7, 0x94] => Some(Encoding::Ebcdic),
            _ => None,
        }
    }

    /// Resolve an `encoding="..."` label, matched case-insensitively by prefix.
    pub fn from_label(label: &[u8]) -> Option<Encoding> {
        const LABELS: [(&[u8], Encoding); 3] = [
            (b"UTF-8", Encoding::Utf8),
            (b"ISO-8859-", Encoding::Iso8859),
            (b"US-ASCII", Encoding::UsAscii),
        ];
        LABELS.iter().find_map(|&(prefix, encoding)| {
            label
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
                .then_some(encoding)
        })
    }
}
