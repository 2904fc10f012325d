//! Error codes for document loading and queries.
//!
//! A document carries at most one sticky error. Once a query or the open step
//! records an [`ErrorCode`], every later query on the same document returns it
//! until the document is dropped.

use thiserror::Error;

/// Reasons a document refused to open or a query was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorCode {
    /// A required element or attribute was not present on the first visit.
    #[error("required tag missing")]
    TagMissing,

    /// A required numeric field had no content on the first visit.
    #[error("required content missing")]
    ContentMissing,

    /// The input file could not be read.
    #[error("file missing or unreadable")]
    FileMissing,

    /// An allocation failed, or the caller reported its own resource failure.
    #[error("out of memory")]
    MemoryFailure,

    /// The frame reference does not name an open frame.
    #[error("invalid frame reference")]
    ElementInvalid,

    /// A markup name, entity or end tag is malformed.
    #[error("malformed tag")]
    TagInvalid,

    /// A namespace was supplied; namespaces are not resolved.
    #[error("namespaces are not supported")]
    NamespaceInvalid,

    /// The input ended in the middle of a structure.
    #[error("input truncated")]
    DataIncomplete,

    /// The document is in an encoding other than UTF-8, ISO-8859-N or US-ASCII.
    #[error("unsupported encoding")]
    EncodingUnsupported,

    /// The `<?xml ... ?>` declaration is malformed.
    #[error("malformed XML declaration")]
    XmlDeclarationInvalid,

    /// The input does not look like XML.
    #[error("not an XML document")]
    NotXmlDocument,

    /// The format string has an unknown directive or conversion.
    #[error("unknown query directive")]
    UnknownXmlInstruction,

    /// A select directive was given an empty name.
    #[error("empty name passed to query")]
    NullTag,

    /// The argument list does not match the format string.
    #[error("query arguments do not match the format")]
    ArgumentMismatch,
}

impl ErrorCode {
    /// Numeric code, stable across releases. Zero is reserved for "no error".
    pub fn code(self) -> u32 {
        match self {
            ErrorCode::TagMissing => 1,
            ErrorCode::ContentMissing => 2,
            ErrorCode::FileMissing => 3,
            ErrorCode::MemoryFailure => 4,
            ErrorCode::ElementInvalid => 5,
            ErrorCode::TagInvalid => 6,
            ErrorCode::NamespaceInvalid => 7,
            ErrorCode::DataIncomplete => 8,
            ErrorCode::EncodingUnsupported => 9,
            ErrorCode::XmlDeclarationInvalid => 10,
            ErrorCode::NotXmlDocument => 11,
            ErrorCode::UnknownXmlInstruction => 12,
            ErrorCode::NullTag => 13,
            ErrorCode::ArgumentMismatch => 14,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ErrorCode>;
