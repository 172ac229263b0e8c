//! Ingest command - run every invoice in the inbox through the pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fatura_core::invoice::rules::format_dmy;
use fatura_core::pipeline::{BatchReport, FileReport};
use fatura_core::{IngestError, IngestionPipeline, Ledger, SourceKind};

use super::load_config;

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Which invoice files to ingest
    #[arg(short, long, value_enum, default_value = "all")]
    kind: KindFilter,

    /// Inbox directory (overrides config)
    #[arg(long)]
    inbox: Option<PathBuf>,

    /// Processed-files directory (overrides config)
    #[arg(long)]
    processed: Option<PathBuf>,

    /// Ledger spreadsheet (overrides config)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Distributor name written on each row (overrides config)
    #[arg(long)]
    distributor: Option<String>,

    /// Write a per-file CSV summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindFilter {
    /// PDF invoices only
    Pdf,
    /// NF-e XML invoices only
    Xml,
    /// XML first, then the PDFs without a same-named XML
    All,
}

impl KindFilter {
    fn kinds(self) -> &'static [SourceKind] {
        match self {
            KindFilter::Pdf => &[SourceKind::Pdf],
            KindFilter::Xml => &[SourceKind::Xml],
            KindFilter::All => &[SourceKind::Xml, SourceKind::Pdf],
        }
    }
}

pub fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(inbox) = args.inbox {
        config.pipeline.inbox_dir = inbox;
    }
    if let Some(processed) = args.processed {
        config.pipeline.processed_dir = processed;
    }
    if let Some(ledger) = args.ledger {
        config.pipeline.ledger_path = ledger;
    }
    if let Some(distributor) = args.distributor {
        config.pipeline.distributor = distributor;
    }

    let inbox = &config.pipeline.inbox_dir;
    if !inbox.is_dir() {
        anyhow::bail!("Inbox directory not found: {}", inbox.display());
    }

    let files = collect_files(inbox, args.kind)?;
    if files.is_empty() {
        println!(
            "{} No invoices found in {}",
            style("ℹ").blue(),
            inbox.display()
        );
        return Ok(());
    }

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        files.len()
    );

    let mut pipeline = IngestionPipeline::from_config(&config)?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let report = pipeline.run_with_progress(files, |_| progress.inc(1));

    progress.finish_and_clear();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &report)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    print_report(&report, pipeline.ledger().len(), start);
    Ok(())
}

/// Inbox files of the requested kinds, one kind after the other, each sorted
/// by path.
///
/// With both kinds selected, a PDF sharing its stem with an XML is that XML's
/// companion and is left out: it is archived along with an accepted XML and
/// stays in the inbox next to a rejected one.
fn collect_files(inbox: &Path, filter: KindFilter) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*",
        Pattern::escape(&inbox.to_string_lossy())
    );

    let mut candidates: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    candidates.sort();

    let mut files: Vec<PathBuf> = Vec::with_capacity(candidates.len());
    for kind in filter.kinds() {
        for path in candidates
            .iter()
            .filter(|p| SourceKind::from_path(p) == Some(*kind))
        {
            if *kind == SourceKind::Pdf && filter == KindFilter::All {
                let stem = path.with_extension("");
                if let Some(xml) = files.iter().find(|other| {
                    SourceKind::from_path(other) == Some(SourceKind::Xml)
                        && other.with_extension("") == stem
                }) {
                    debug!("Skipping {}, companion of {}", path.display(), xml.display());
                    continue;
                }
            }
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn status(file: &FileReport) -> &'static str {
    match &file.result {
        Ok(_) => "accepted",
        Err(IngestError::Duplicate(_)) => "duplicate",
        Err(_) => "rejected",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_summary(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_number",
        "issue_date",
        "total_amount",
        "archived_to",
        "error",
    ])?;

    for file in &report.files {
        let name = file_name(&file.path);
        match &file.result {
            Ok(outcome) => wtr.write_record([
                name.as_str(),
                status(file),
                &outcome.record.document_number,
                &format_dmy(outcome.record.issue_date),
                &outcome.record.total_amount.normalize().to_string(),
                &outcome.archive.archived.display().to_string(),
                "",
            ])?,
            Err(e) => wtr.write_record([
                name.as_str(),
                status(file),
                "",
                "",
                "",
                "",
                &e.to_string(),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

fn print_report(report: &BatchReport, ledger_rows: usize, start: Instant) {
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        report.files.len(),
        start.elapsed()
    );
    println!(
        "   {} accepted, {} duplicates, {} failed ({} rows in ledger)",
        style(report.accepted()).green(),
        style(report.duplicates()).yellow(),
        style(report.failed()).red(),
        ledger_rows
    );

    let rejected: Vec<_> = report.files.iter().filter(|f| !f.is_accepted()).collect();
    if !rejected.is_empty() {
        println!();
        println!("{}", style("Not ingested:").red());
        for file in rejected {
            if let Err(e) = &file.result {
                println!("  - {}: {}", file_name(&file.path), e);
            }
        }
    }
}
