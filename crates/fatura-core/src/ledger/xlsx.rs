//! Spreadsheet-backed ledger.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{key_from_row, record_to_row, Ledger, LedgerCell, Result, COLUMNS};
use crate::error::LedgerError;
use crate::invoice::rules::format_dmy;
use crate::models::record::{InvoiceRecord, NaturalKey};

/// Ledger stored as an `.xlsx` workbook.
///
/// The table stays resident after [`XlsxLedger::open`]. Each append rewrites
/// the whole workbook into a temporary file next to the ledger and renames it
/// into place, so a failed write leaves the previous file untouched.
#[derive(Debug)]
pub struct XlsxLedger {
    path: PathBuf,
    sheet_name: String,
    header: Vec<String>,
    rows: Vec<Vec<LedgerCell>>,
    keys: HashSet<NaturalKey>,
}

impl XlsxLedger {
    /// Open the ledger at `path`. A missing file is not an error; it is
    /// created with the column header on the first append.
    pub fn open(path: impl Into<PathBuf>, sheet_name: &str) -> Result<Self> {
        let path = path.into();
        let mut ledger = Self {
            path,
            sheet_name: sheet_name.to_string(),
            header: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            keys: HashSet::new(),
        };

        if !ledger.path.exists() {
            info!("Ledger {} not found, it will be created", ledger.path.display());
            return Ok(ledger);
        }

        ledger.load()?;
        debug!(
            "Loaded ledger {} with {} rows ({} keys)",
            ledger.path.display(),
            ledger.rows.len(),
            ledger.keys.len()
        );
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored rows, header excluded.
    pub fn rows(&self) -> &[Vec<LedgerCell>] {
        &self.rows
    }

    fn read_error(&self, reason: impl ToString) -> LedgerError {
        LedgerError::Read {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn load(&mut self) -> Result<()> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| self.read_error(e))?;

        if let Some(name) = workbook.sheet_names().first() {
            self.sheet_name = name.clone();
        }
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| self.read_error("workbook has no worksheets"))?
            .map_err(|e| self.read_error(e))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(());
        };

        let header: Vec<String> = header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect();
        let matches = header.len() >= COLUMNS.len()
            && header.iter().zip(COLUMNS.iter()).all(|(h, c)| h == c);
        if !matches {
            return Err(LedgerError::Schema {
                path: self.path.clone(),
                found: header,
            });
        }
        self.header = header;

        for (index, row) in rows.enumerate() {
            let cells: Vec<LedgerCell> = row.iter().map(cell_from_data).collect();
            if cells.iter().all(|c| *c == LedgerCell::Empty) {
                continue;
            }
            match key_from_row(&cells) {
                Some(key) => {
                    self.keys.insert(key);
                }
                None => warn!(
                    "Ledger row {} has no usable key and is ignored for dedup",
                    index + 2
                ),
            }
            self.rows.push(cells);
        }
        Ok(())
    }

    fn write(&self) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        for (col, title) in self.header.iter().enumerate() {
            worksheet.write_string(0, col as u16, title)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let row_num = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    LedgerCell::Text(s) => {
                        worksheet.write_string(row_num, col as u16, s)?;
                    }
                    LedgerCell::Number(n) => {
                        worksheet.write_number(row_num, col as u16, *n)?;
                    }
                    LedgerCell::Empty => {}
                }
            }
        }

        let buffer = workbook.save_to_buffer()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_error = |source: std::io::Error| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(io_error)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_error)?;
        tmp.write_all(&buffer).map_err(io_error)?;
        tmp.as_file().sync_all().map_err(io_error)?;
        tmp.persist(&self.path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

impl Ledger for XlsxLedger {
    fn exists(&self, key: &NaturalKey) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &InvoiceRecord) -> Result<()> {
        let row = record_to_row(record)?;
        self.rows.push(row);

        if let Err(e) = self.write() {
            self.rows.pop();
            return Err(e);
        }

        self.keys.insert(record.natural_key());
        info!(
            "Appended {} ({}) to {}",
            record.document_number,
            format_dmy(record.issue_date),
            self.path.display()
        );
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

fn cell_from_data(data: &Data) -> LedgerCell {
    match data {
        Data::Empty => LedgerCell::Empty,
        Data::String(s) => LedgerCell::Text(s.clone()),
        Data::Float(f) => LedgerCell::Number(*f),
        Data::Int(i) => LedgerCell::Number(*i as f64),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => LedgerCell::Text(format_dmy(value.date())),
            None => LedgerCell::Number(dt.as_f64()),
        },
        other => LedgerCell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::sample_record;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_on_first_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut ledger = XlsxLedger::open(&path, "Sheet1").unwrap();
        assert!(ledger.is_empty());
        assert!(!path.exists());

        let record = sample_record("12.345.678/0001-90", "1234.56");
        ledger.append(&record).unwrap();
        assert!(path.exists());
        assert!(ledger.exists(&record.natural_key()));
    }

    #[test]
    fn test_reopen_sees_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let first = sample_record("12.345.678/0001-90", "1234.56");
        let second = sample_record("98.765.432/0001-10", "99.90");
        {
            let mut ledger = XlsxLedger::open(&path, "Sheet1").unwrap();
            ledger.append(&first).unwrap();
            ledger.append(&second).unwrap();
        }

        let ledger = XlsxLedger::open(&path, "Sheet1").unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.exists(&first.natural_key()));
        assert!(ledger.exists(&second.natural_key()));
        assert_eq!(ledger.rows()[0][9], LedgerCell::Text("fatura.pdf".to_string()));
        assert_eq!(ledger.rows()[0][1], LedgerCell::Number(1234.56));
    }

    #[test]
    fn test_header_mismatch_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "NAME").unwrap();
        sheet.write_string(0, 1, "AMOUNT").unwrap();
        workbook.save(&path).unwrap();

        let err = XlsxLedger::open(&path, "Sheet1").unwrap_err();
        assert!(matches!(err, LedgerError::Schema { .. }));
    }

    #[test]
    fn test_existing_rows_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Faturas").unwrap();
        for (col, title) in COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        sheet.write_string(1, 0, "manual entry").unwrap();
        sheet.write_number(1, 1, 50.0).unwrap();
        workbook.save(&path).unwrap();

        let mut ledger = XlsxLedger::open(&path, "Sheet1").unwrap();
        assert_eq!(ledger.len(), 1);
        ledger.append(&sample_record("1", "10")).unwrap();

        let reopened = XlsxLedger::open(&path, "Sheet1").unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.sheet_name, "Faturas");
        assert_eq!(reopened.rows()[0][0], LedgerCell::Text("manual entry".to_string()));
        assert_eq!(reopened.rows()[0][1], LedgerCell::Number(50.0));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("ledger.xlsx");

        let mut ledger = XlsxLedger::open(&path, "Sheet1").unwrap();
        let record = sample_record("1", "10");
        let err = ledger.append(&record).unwrap_err();

        assert!(matches!(err, LedgerError::Io { .. }));
        assert!(ledger.is_empty());
        assert!(!ledger.exists(&record.natural_key()));
    }
}
