//! The ledger: persisted history of accepted invoices.
//!
//! The ledger is both the output table and the reference for duplicate
//! detection. Implementations must make every appended record visible to
//! `exists` immediately, so duplicates within one batch are caught too.
//! Access is single-writer; nothing here locks the backing store.

mod xlsx;

pub use xlsx::XlsxLedger;

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::LedgerError;
use crate::invoice::rules::{format_dmy, parse_canonical_amount, parse_dmy, parse_locale_amount};
use crate::models::record::{Field, InvoiceRecord, NaturalKey};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Column headers, in order.
pub const COLUMNS: [&str; 10] = [
    "CNPJ",
    "VALOR TOTAL",
    "VOLUME TOTAL",
    "DATA EMISSAO",
    "DATA INICIO",
    "DATA FIM",
    "NUMERO FATURA",
    "VALOR ICMS",
    "DISTRIBUIDORA",
    "NOME DO ARQUIVO",
];

/// Append-only record store with natural-key lookup.
pub trait Ledger {
    /// True iff a stored record has the same tax id, period and total.
    fn exists(&self, key: &NaturalKey) -> bool;

    /// Persist a new record. Either the whole row is stored or nothing is.
    fn append(&mut self, record: &InvoiceRecord) -> Result<()>;

    /// Number of stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCell {
    Text(String),
    Number(f64),
    Empty,
}

impl LedgerCell {
    /// Cell contents as text; numbers use their shortest decimal form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            LedgerCell::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            LedgerCell::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            LedgerCell::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            LedgerCell::Text(s) => parse_canonical_amount(s).or_else(|| parse_locale_amount(s)),
            LedgerCell::Empty => None,
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            LedgerCell::Text(s) => parse_dmy(s),
            LedgerCell::Number(n) => excel_serial_date(*n),
            LedgerCell::Empty => None,
        }
    }
}

/// Spreadsheet serial day number to a calendar date (1900 date system).
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.trunc() as u64))
}

fn number(field: Field, value: Decimal) -> Result<LedgerCell> {
    value
        .to_f64()
        .map(LedgerCell::Number)
        .ok_or_else(|| LedgerError::Number {
            field,
            value: value.to_string(),
        })
}

/// Encode a record as one ledger row in column order.
pub fn record_to_row(record: &InvoiceRecord) -> Result<Vec<LedgerCell>> {
    Ok(vec![
        LedgerCell::Text(record.tax_id.clone()),
        number(Field::TotalAmount, record.total_amount)?,
        number(Field::TotalVolume, record.total_volume)?,
        LedgerCell::Text(format_dmy(record.issue_date)),
        LedgerCell::Text(format_dmy(record.period_start)),
        LedgerCell::Text(format_dmy(record.period_end)),
        LedgerCell::Text(record.document_number.clone()),
        number(Field::IcmsAmount, record.icms_amount)?,
        LedgerCell::Text(record.distributor.clone()),
        LedgerCell::Text(record.source_file_name.clone()),
    ])
}

/// Read the natural key back out of a stored row.
pub fn key_from_row(row: &[LedgerCell]) -> Option<NaturalKey> {
    static EMPTY: LedgerCell = LedgerCell::Empty;
    let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);
    Some(NaturalKey {
        tax_id: cell(0).as_text()?,
        total_amount: cell(1).as_decimal()?,
        period_start: cell(4).as_date()?,
        period_end: cell(5).as_date()?,
    })
}

/// Ledger kept only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    records: Vec<InvoiceRecord>,
    keys: HashSet<NaturalKey>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[InvoiceRecord] {
        &self.records
    }
}

impl Ledger for MemoryLedger {
    fn exists(&self, key: &NaturalKey) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, record: &InvoiceRecord) -> Result<()> {
        self.keys.insert(record.natural_key());
        self.records.push(record.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
