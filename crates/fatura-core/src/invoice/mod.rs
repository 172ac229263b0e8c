//! Invoice field extraction, normalization and validation.

mod normalize;
pub mod rules;
mod structured;
mod text;
mod validate;
pub mod xml;

pub use normalize::{Normalized, RecordNormalizer};
pub use structured::StructuredExtractor;
pub use text::{flatten_text, TextExtractor};
pub use validate::{check_completeness, Completeness};

use std::path::Path;

use crate::error::ExtractionError;
use crate::models::record::RawFields;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice field extractors.
///
/// Both variants turn one document into the same sparse map of raw values so
/// that normalization, validation, dedup and archival are shared.
pub trait FieldExtractor {
    /// Extract raw field values from the document contents.
    fn extract(&self, document: &str) -> Result<RawFields>;
}

/// Supported input encodings, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// PDF invoice; fields come from its text.
    Pdf,
    /// NF-e XML invoice; fields come from the element tree.
    Xml,
}

impl SourceKind {
    /// Detect the kind from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "xml" => Some(SourceKind::Xml),
            _ => None,
        }
    }

    /// Lowercase file extension of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Xml => "xml",
        }
    }

    /// The kind whose same-named file is archived alongside this one.
    pub fn companion(&self) -> Option<SourceKind> {
        match self {
            SourceKind::Xml => Some(SourceKind::Pdf),
            SourceKind::Pdf => None,
        }
    }
}
