//! Error types for the fatura-core library.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::models::record::{Field, NaturalKey};

/// Main error type for the fatura library.
///
/// Returned when setting a pipeline up. Per-file problems are
/// [`IngestError`]s and never abort a batch.
#[derive(Error, Debug)]
pub enum FaturaError {
    /// The ledger could not be opened.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a source document into raw fields.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document produced no usable text.
    #[error("no usable text in document")]
    NoText,

    /// Text was present but no field matched.
    #[error("no invoice data found")]
    NoData,

    /// The XML document could not be read.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// A node required by the structured layout is absent.
    #[error("missing node {0}")]
    MissingNode(String),

    /// The file extension is not one of the supported kinds.
    #[error("unsupported file kind: {0}")]
    Unsupported(String),

    /// Text decoding of the PDF failed.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// A structured value could not be interpreted.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Reading the source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A captured value that is not a valid number or date.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("failed to parse {field}: {value:?}")]
pub struct ParseError {
    pub field: Field,
    pub value: String,
}

impl ParseError {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Errors reading or writing the ledger spreadsheet.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Filesystem error on the backing store.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing workbook could not be read.
    #[error("failed to read workbook {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The workbook could not be serialized.
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// The header row does not carry the ledger columns.
    #[error("unexpected ledger header in {path}: found {found:?}")]
    Schema { path: PathBuf, found: Vec<String> },

    /// A decimal value has no spreadsheet number representation.
    #[error("{field} value {value} cannot be stored as a number")]
    Number { field: Field, value: String },
}

/// Errors moving processed files out of the inbox.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Creating the processed directory failed.
    #[error("cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source path has no file name.
    #[error("not a file path: {0}")]
    NotAFile(PathBuf),

    /// A move step failed; the original file is left in place.
    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cross-device copy did not match the original.
    #[error("copy of {from} at {to} is incomplete ({copied} of {expected} bytes)")]
    Verify {
        from: PathBuf,
        to: PathBuf,
        copied: u64,
        expected: u64,
    },
}

/// Why a single source file was not ingested.
///
/// Every variant is local to one file; a batch keeps going after any of them.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No usable text/tree, or a required structured node is absent.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// A captured value is not a valid number/date.
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    /// Required fields are missing after extraction.
    #[error("missing required fields: {}", join_fields(.missing))]
    Incomplete { missing: Vec<Field> },

    /// The natural key is already in the ledger.
    #[error("duplicate record {0}")]
    Duplicate(NaturalKey),

    /// The ledger could not be read or written.
    #[error("persist failed: {0}")]
    Persist(#[from] LedgerError),

    /// The record was persisted but the file could not be moved.
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for the fatura library.
pub type Result<T> = std::result::Result<T, FaturaError>;
