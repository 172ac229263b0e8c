//! Core library for utility invoice ingestion.
//!
//! This crate provides:
//! - Field extraction from PDF text (pattern rules) and NF-e XML (tree paths)
//! - Normalization of locale-formatted amounts and dates
//! - A spreadsheet ledger with natural-key deduplication
//! - Archival of accepted files and their companions

pub mod archive;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use archive::{ArchiveReport, Archiver, CompanionStatus};
pub use error::{FaturaError, IngestError, Result};
pub use invoice::{FieldExtractor, RecordNormalizer, SourceKind, StructuredExtractor, TextExtractor};
pub use ledger::{Ledger, MemoryLedger, XlsxLedger};
pub use models::config::FaturaConfig;
pub use models::record::{Field, InvoiceRecord, NaturalKey, PartialRecord, RawFields};
pub use pdf::{PdfExtractor, PdfProcessor, PdfTextSource, TextSource};
pub use pipeline::{BatchReport, FileReport, IngestOutcome, IngestionPipeline, Inspection};
