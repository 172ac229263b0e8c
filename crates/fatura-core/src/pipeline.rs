//! Per-file ingestion: extract, normalize, validate, dedup, append, archive.
//!
//! Each step can reject the file. Only a record that was appended to the
//! ledger gets its source file archived; every earlier rejection leaves the
//! file in the inbox for a later run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive::{ArchiveReport, Archiver};
use crate::error::{ExtractionError, IngestError};
use crate::invoice::{
    check_completeness, flatten_text, Completeness, FieldExtractor, Normalized, RecordNormalizer,
    SourceKind, StructuredExtractor, TextExtractor,
};
use crate::ledger::{Ledger, XlsxLedger};
use crate::models::config::FaturaConfig;
use crate::models::record::{InvoiceRecord, RawFields};
use crate::pdf::{PdfTextSource, TextSource};

/// A file that made it all the way into the ledger.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub kind: SourceKind,
    pub record: InvoiceRecord,
    pub archive: ArchiveReport,
}

/// Result of one file in a batch.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<IngestOutcome, IngestError>,
}

impl FileReport {
    pub fn is_accepted(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a batch run, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.files.iter().filter(|f| f.is_accepted()).count()
    }

    pub fn duplicates(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.result, Err(IngestError::Duplicate(_))))
            .count()
    }

    /// Files rejected for any reason other than being a duplicate.
    pub fn failed(&self) -> usize {
        self.files.len() - self.accepted() - self.duplicates()
    }
}

/// Dry-run view of one document, without ledger or filesystem changes.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub kind: SourceKind,
    pub raw: RawFields,
    pub normalized: Normalized,
    pub completeness: Completeness,
}

/// Runs documents through the full ingestion sequence.
pub struct IngestionPipeline<L: Ledger> {
    distributor: String,
    ledger: L,
    archiver: Archiver,
    text_extractor: TextExtractor,
    structured_extractor: StructuredExtractor,
    normalizer: RecordNormalizer,
    text_source: Box<dyn TextSource>,
    min_text_length: usize,
}

impl IngestionPipeline<XlsxLedger> {
    /// Build a pipeline backed by the spreadsheet ledger named in `config`.
    pub fn from_config(config: &FaturaConfig) -> crate::Result<Self> {
        let ledger = XlsxLedger::open(&config.pipeline.ledger_path, &config.pipeline.sheet_name)?;
        let text_extractor = TextExtractor::new().with_overrides(&config.extraction.patterns)?;

        Ok(
            Self::new(
                &config.pipeline.distributor,
                ledger,
                Archiver::new(&config.pipeline.processed_dir),
            )
            .with_text_extractor(text_extractor)
            .with_structured_extractor(StructuredExtractor::with_namespace(
                &config.extraction.namespace,
            ))
            .with_min_text_length(config.pdf.min_text_length),
        )
    }
}

impl<L: Ledger> IngestionPipeline<L> {
    pub fn new(distributor: &str, ledger: L, archiver: Archiver) -> Self {
        Self {
            distributor: distributor.to_string(),
            ledger,
            archiver,
            text_extractor: TextExtractor::new(),
            structured_extractor: StructuredExtractor::new(),
            normalizer: RecordNormalizer::new(),
            text_source: Box::new(PdfTextSource),
            min_text_length: 1,
        }
    }

    pub fn with_text_extractor(mut self, extractor: TextExtractor) -> Self {
        self.text_extractor = extractor;
        self
    }

    pub fn with_structured_extractor(mut self, extractor: StructuredExtractor) -> Self {
        self.structured_extractor = extractor;
        self
    }

    /// Read PDF text through another source.
    pub fn with_text_source(mut self, source: impl TextSource + 'static) -> Self {
        self.text_source = Box::new(source);
        self
    }

    pub fn with_min_text_length(mut self, min: usize) -> Self {
        self.min_text_length = min.max(1);
        self
    }

    pub fn distributor(&self) -> &str {
        &self.distributor
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Ingest one file.
    pub fn process_file(&mut self, path: &Path) -> Result<IngestOutcome, IngestError> {
        let kind = detect_kind(path)?;
        let raw = self.extract(path, kind)?;

        let Normalized { record, errors } = self.normalizer.normalize(&raw);
        if let Some(error) = errors.into_iter().next() {
            return Err(IngestError::Parse(error));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = record
            .complete(&self.distributor, &file_name)
            .map_err(|missing| IngestError::Incomplete { missing })?;

        let key = record.natural_key();
        if self.ledger.exists(&key) {
            return Err(IngestError::Duplicate(key));
        }

        self.ledger.append(&record)?;
        let archive = self.archiver.archive(path, kind)?;

        info!(
            "Accepted {} (document {}, total {})",
            file_name,
            record.document_number,
            record.total_amount.normalize()
        );
        Ok(IngestOutcome {
            kind,
            record,
            archive,
        })
    }

    /// Ingest files in order. A rejected file never stops the batch.
    pub fn run<I>(&mut self, files: I) -> BatchReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.run_with_progress(files, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_file` after each file.
    pub fn run_with_progress<I, F>(&mut self, files: I, mut on_file: F) -> BatchReport
    where
        I: IntoIterator<Item = PathBuf>,
        F: FnMut(&FileReport),
    {
        let mut report = BatchReport::default();
        for path in files {
            debug!("Processing {}", path.display());
            let result = self.process_file(&path);
            if let Err(e) = &result {
                warn!("Skipped {}: {}", path.display(), e);
            }
            let file = FileReport { path, result };
            on_file(&file);
            report.files.push(file);
        }

        info!(
            "Batch finished: {} accepted, {} duplicates, {} failed",
            report.accepted(),
            report.duplicates(),
            report.failed()
        );
        report
    }

    /// Extract, normalize and validate without touching ledger or file.
    pub fn inspect(&self, path: &Path) -> Result<Inspection, IngestError> {
        let kind = detect_kind(path)?;
        let raw = self.extract(path, kind)?;
        let normalized = self.normalizer.normalize(&raw);
        let completeness = check_completeness(&normalized.record);
        Ok(Inspection {
            kind,
            raw,
            normalized,
            completeness,
        })
    }

    fn extract(&self, path: &Path, kind: SourceKind) -> Result<RawFields, IngestError> {
        let raw = match kind {
            SourceKind::Pdf => {
                let text = self
                    .text_source
                    .read_text(path)
                    .map_err(ExtractionError::from)?;
                let text = flatten_text(&text);
                if text.chars().count() < self.min_text_length {
                    return Err(ExtractionError::NoText.into());
                }
                self.text_extractor.extract(&text)
            }
            SourceKind::Xml => {
                let xml = fs::read_to_string(path).map_err(ExtractionError::from)?;
                if xml.trim().is_empty() {
                    return Err(ExtractionError::NoText.into());
                }
                self.structured_extractor.extract(&xml)
            }
        };

        let raw = raw.map_err(|e| match e {
            ExtractionError::Parse(parse) => IngestError::Parse(parse),
            other => IngestError::Extraction(other),
        })?;
        if raw.is_empty() {
            return Err(ExtractionError::NoData.into());
        }
        Ok(raw)
    }
}

fn detect_kind(path: &Path) -> Result<SourceKind, IngestError> {
    SourceKind::from_path(path)
        .ok_or_else(|| ExtractionError::Unsupported(path.display().to_string()).into())
}
