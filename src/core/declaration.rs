//! XML declaration and prolog detection
//!
//! Runs once when a document is opened. Settles the encoding, the declared
//! `standalone` value and the offset where the root frame starts scanning.

use super::cursor::{is_whitespace, Text};
use super::encoding::Encoding;
use super::skip;
use crate::error::{ErrorCode, Result};
use crate::options::Options;

/// What the prolog says about a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prolog {
    pub encoding: Encoding,
    /// `standalone="yes"` / `"no"`, if declared
    pub standalone: Option<bool>,
    /// First byte after the BOM and declaration
    pub start: usize,
}

/// Detect the encoding and parse an optional `<?xml ... ?>` declaration.
pub fn detect(text: &Text, options: Options) -> Result<Prolog> {
    if text.is_empty() {
        return Err(ErrorCode::NotXmlDocument);
    }
    let head = text.slice(0, 4);
    let (mut encoding, start) = Encoding::from_bom(head).unwrap_or((Encoding::Unknown, 0));
    if !encoding.is_supported() {
        return Err(ErrorCode::EncodingUnsupported);
    }

    let mut prolog = Prolog {
        encoding,
        standalone: None,
        start,
    };
    if text.starts_with(start, b"<?xml") && text.get(start + 5).is_some_and(is_whitespace) {
        parse_declaration(text, &mut prolog)?;
    } else {
        // No declaration: the bytes after any BOM must still look like XML
        match Encoding::from_signature(text.slice(start, start + 4)) {
            Some(found) => encoding = found,
            None if options.contains(Options::REQUIRE_XML_DECLARATION) => {
                return Err(ErrorCode::NotXmlDocument);
            }
            None => {}
        }
        prolog.encoding = encoding;
    }

    if !prolog.encoding.is_supported() {
        return Err(ErrorCode::EncodingUnsupported);
    }
    Ok(prolog)
}

/// Parse `version`, `encoding` and `standalone` up to the closing `?>`.
///
/// The pseudo-attributes must appear in that order, each at most once, and
/// `version` is required.
fn parse_declaration(text: &Text, prolog: &mut Prolog) -> Result<()> {
    let mut p = prolog.start + 5;
    // Rank of the last pseudo-attribute seen
    let mut last: Option<u8> = None;
    loop {
        let gap = p;
        p = skip::spaces(text, p);
        if text.starts_with(p, b"?>") {
            break;
        }
        if p == gap {
            return Err(ErrorCode::XmlDeclarationInvalid);
        }

        let name_start = p;
        while text.get(p).is_some_and(|b| b.is_ascii_alphabetic()) {
            p += 1;
        }
        let name = text.slice(name_start, p);
        p = skip::spaces(text, p);
        if text.get(p) != Some(b'=') {
            return Err(ErrorCode::XmlDeclarationInvalid);
        }
        p = skip::spaces(text, p + 1);
        let quote = match text.get(p) {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(ErrorCode::XmlDeclarationInvalid),
        };
        let close = text
            .find(quote, p + 1)
            .ok_or(ErrorCode::XmlDeclarationInvalid)?;
        let value = text.slice(p + 1, close);
        p = close + 1;

        let rank = match name {
            b"version" => 0,
            b"encoding" => 1,
            b"standalone" => 2,
            _ => return Err(ErrorCode::XmlDeclarationInvalid),
        };
        if last.map_or(rank != 0, |last| rank <= last) {
            return Err(ErrorCode::XmlDeclarationInvalid);
        }
        last = Some(rank);

        match rank {
            0 => {}
            1 => {
                if let Some(encoding) = Encoding::from_label(value) {
                    prolog.encoding = encoding;
                }
            }
            _ => {
                prolog.standalone = Some(match value {
                    b"yes" => true,
                    b"no" => false,
                    _ => return Err(ErrorCode::XmlDeclarationInvalid),
                });
            }
        }
    }

    if last.is_none() {
        return Err(ErrorCode::XmlDeclarationInvalid);
    }
    prolog.start = p + 2;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_str(s: &str, options: Options) -> Result<Prolog> {
        detect(&Text::new(s.as_bytes().to_vec()), options)
    }

    #[test]
    fn test_full_declaration() {
        let input = "<?xml version=\"1.0\" encoding='ISO-8859-1' standalone = \"yes\"?><r/>";
        let prolog = detect_str(input, Options::NONE).unwrap();
        assert_eq!(prolog.encoding, Encoding::Iso8859);
        assert_eq!(prolog.standalone, Some(true));
        assert_eq!(&input[prolog.start..], "<r/>");
    }

    #[test]
    fn test_unknown_label_keeps_guess() {
        let prolog = detect_str("<?xml version='1.0' encoding='koi8-r'?><r/>", Options::NONE).unwrap();
        assert_eq!(prolog.encoding, Encoding::Unknown);

        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<?xml version='1.0' encoding='latin-9'?><r/>");
        let prolog = detect(&Text::new(bytes), Options::NONE).unwrap();
        assert_eq!(prolog.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_malformed_declarations() {
        let bad = [
            "<?xml encoding='UTF-8'?><r/>",
            "<?xml version='1.0' standalone='maybe'?><r/>",
            "<?xml version='1.0'",
            "<?xml version=1.0?><r/>",
            "<?xml version='1.0'encoding='UTF-8'?><r/>",
            "<?xml version='1.0' flavor='x'?><r/>",
            "<?xml encoding='UTF-8' version='1.0'?><r/>",
            "<?xml version='1.0' standalone='yes' encoding='UTF-8'?><r/>",
            "<?xml version='1.0' version='1.0'?><r/>",
            "<?xml version='1.0' encoding='UTF-8' encoding='UTF-8'?><r/>",
        ];
        for input in bad {
            assert_eq!(
                detect_str(input, Options::NONE),
                Err(ErrorCode::XmlDeclarationInvalid),
                "{input}"
            );
        }
    }

    #[test]
    fn test_missing_declaration() {
        let prolog = detect_str("<r/>", Options::NONE).unwrap();
        assert_eq!(prolog.encoding, Encoding::Unknown);
        assert_eq!(prolog.start, 0);
        assert_eq!(
            detect_str("<r/>", Options::REQUIRE_XML_DECLARATION),
            Err(ErrorCode::NotXmlDocument)
        );
    }

    #[test]
    fn test_bom_without_declaration() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<r/>");
        let text = Text::new(bytes);
        assert_eq!(
            detect(&text, Options::REQUIRE_XML_DECLARATION),
            Err(ErrorCode::NotXmlDocument)
        );
        let prolog = detect(&text, Options::NONE).unwrap();
        assert_eq!(prolog.encoding, Encoding::Utf8);
        assert_eq!(prolog.start, 3);
    }

    #[test]
    fn test_unsupported_encodings() {
        let utf16 = Text::new(vec![0xFF, 0xFE, b'<', 0, b'r', 0]);
        assert_eq!(detect(&utf16, Options::NONE), Err(ErrorCode::EncodingUnsupported));
        let ebcdic = Text::new(vec![0x4C, 0x6F, 0xA7, 0x94]);
        assert_eq!(
            detect(&ebcdic, Options::REQUIRE_XML_DECLARATION),
            Err(ErrorCode::EncodingUnsupported)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(detect_str("", Options::NONE), Err(ErrorCode::NotXmlDocument));
    }
}
