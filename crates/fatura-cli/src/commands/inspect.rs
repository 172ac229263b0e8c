//! Inspect command - dry-run extraction for a single file.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use fatura_core::invoice::rules::{format_dmy, format_locale_amount};
use fatura_core::pipeline::Inspection;
use fatura_core::{
    Archiver, Field, IngestionPipeline, MemoryLedger, PartialRecord, RawFields,
    StructuredExtractor, TextExtractor,
};

use super::load_config;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Invoice file (PDF or XML)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    file: String,
    kind: &'static str,
    raw: &'a RawFields,
    record: &'a PartialRecord,
    parse_errors: Vec<String>,
    missing: &'a [Field],
    complete: bool,
}

pub fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    // Nothing is appended or archived, so an in-memory ledger will do.
    let pipeline = IngestionPipeline::new(
        &config.pipeline.distributor,
        MemoryLedger::new(),
        Archiver::new(&config.pipeline.processed_dir),
    )
    .with_text_extractor(TextExtractor::new().with_overrides(&config.extraction.patterns)?)
    .with_structured_extractor(StructuredExtractor::with_namespace(
        &config.extraction.namespace,
    ))
    .with_min_text_length(config.pdf.min_text_length);

    let inspection = pipeline.inspect(&args.input)?;

    match args.format {
        OutputFormat::Json => {
            let report = InspectReport {
                file: args.input.display().to_string(),
                kind: inspection.kind.extension(),
                raw: &inspection.raw,
                record: &inspection.normalized.record,
                parse_errors: inspection
                    .normalized
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
                missing: &inspection.completeness.missing,
                complete: inspection.completeness.is_complete(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print!("{}", format_text(&args.input, &inspection)),
    }

    Ok(())
}

fn format_text(input: &std::path::Path, inspection: &Inspection) -> String {
    let mut output = String::new();
    let record = &inspection.normalized.record;

    output.push_str(&format!(
        "File: {} ({})\n\n",
        input.display(),
        inspection.kind.extension()
    ));

    output.push_str("Captured:\n");
    for (field, value) in inspection.raw.iter() {
        output.push_str(&format!("  {:<16} {}\n", field.name(), value));
    }
    output.push('\n');

    let amount = |v: Option<rust_decimal::Decimal>| v.map(format_locale_amount).unwrap_or_default();
    let date = |v: Option<chrono::NaiveDate>| v.map(format_dmy).unwrap_or_default();

    output.push_str("Record:\n");
    let rows = [
        (Field::TaxId, record.tax_id.clone().unwrap_or_default()),
        (Field::TotalAmount, amount(record.total_amount)),
        (Field::TotalVolume, amount(record.total_volume)),
        (Field::IssueDate, date(record.issue_date)),
        (Field::PeriodStart, date(record.period_start)),
        (Field::PeriodEnd, date(record.period_end)),
        (Field::DocumentNumber, record.document_number.clone().unwrap_or_default()),
        (Field::IcmsAmount, amount(record.icms_amount)),
    ];
    for (field, value) in rows {
        output.push_str(&format!("  {:<16} {}\n", field.column(), value));
    }

    for error in &inspection.normalized.errors {
        output.push_str(&format!("\n{} {}", style("✗").red(), error));
    }

    if inspection.completeness.is_complete() {
        output.push_str(&format!("\n{} Complete\n", style("✓").green()));
    } else {
        let missing: Vec<_> = inspection
            .completeness
            .missing
            .iter()
            .map(|f| f.name())
            .collect();
        output.push_str(&format!(
            "\n{} Missing: {}\n",
            style("⚠").yellow(),
            missing.join(", ")
        ));
    }

    output
}
