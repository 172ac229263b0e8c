//! Invoice record model shared by both extractor paths and the ledger.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::check_completeness;
use crate::invoice::rules::dates::format_dmy;

/// The eight business fields every ledger row must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Tax identifier (CNPJ) of the billed party.
    TaxId,
    /// Monetary total.
    TotalAmount,
    /// Billed quantity.
    TotalVolume,
    /// Document issue date.
    IssueDate,
    /// Billing period start.
    PeriodStart,
    /// Billing period end.
    PeriodEnd,
    /// Invoice/document number.
    DocumentNumber,
    /// ICMS tax component.
    IcmsAmount,
}

impl Field {
    /// All required fields, in ledger column order.
    pub const REQUIRED: [Field; 8] = [
        Field::TaxId,
        Field::TotalAmount,
        Field::TotalVolume,
        Field::IssueDate,
        Field::PeriodStart,
        Field::PeriodEnd,
        Field::DocumentNumber,
        Field::IcmsAmount,
    ];

    /// Snake-case name used in diagnostics and configuration keys.
    pub fn name(&self) -> &'static str {
        match self {
            Field::TaxId => "tax_id",
            Field::TotalAmount => "total_amount",
            Field::TotalVolume => "total_volume",
            Field::IssueDate => "issue_date",
            Field::PeriodStart => "period_start",
            Field::PeriodEnd => "period_end",
            Field::DocumentNumber => "document_number",
            Field::IcmsAmount => "icms_amount",
        }
    }

    /// Ledger column header for this field.
    pub fn column(&self) -> &'static str {
        match self {
            Field::TaxId => "CNPJ",
            Field::TotalAmount => "VALOR TOTAL",
            Field::TotalVolume => "VOLUME TOTAL",
            Field::IssueDate => "DATA EMISSAO",
            Field::PeriodStart => "DATA INICIO",
            Field::PeriodEnd => "DATA FIM",
            Field::DocumentNumber => "NUMERO FATURA",
            Field::IcmsAmount => "VALOR ICMS",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How numeric captures are written in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Thousands-dot, decimal-comma ("1.234,56").
    Locale,
    /// Dot decimal without grouping ("1234.56").
    ///
    /// NF-e amounts are written this way. They skip the locale conversion
    /// even for total and ICMS amounts, which would otherwise read
    /// "1234.56" as 123456.
    Canonical,
}

/// Sparse map of raw captured strings produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFields {
    values: BTreeMap<Field, String>,
    number_format: NumberFormat,
}

impl RawFields {
    pub fn new(number_format: NumberFormat) -> Self {
        Self {
            values: BTreeMap::new(),
            number_format,
        }
    }

    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn number_format(&self) -> NumberFormat {
        self.number_format
    }

    /// True when no field was captured at all.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// A normalized record whose fields may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartialRecord {
    pub tax_id: Option<String>,
    pub total_amount: Option<Decimal>,
    pub total_volume: Option<Decimal>,
    pub issue_date: Option<NaiveDate>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub icms_amount: Option<Decimal>,
}

impl PartialRecord {
    /// Whether the field holds a non-empty value.
    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::TaxId => self.tax_id.as_deref().is_some_and(|s| !s.is_empty()),
            Field::TotalAmount => self.total_amount.is_some(),
            Field::TotalVolume => self.total_volume.is_some(),
            Field::IssueDate => self.issue_date.is_some(),
            Field::PeriodStart => self.period_start.is_some(),
            Field::PeriodEnd => self.period_end.is_some(),
            Field::DocumentNumber => self.document_number.as_deref().is_some_and(|s| !s.is_empty()),
            Field::IcmsAmount => self.icms_amount.is_some(),
        }
    }

    /// Build the full record, or return the fields that are missing.
    pub fn complete(
        self,
        distributor: &str,
        source_file_name: &str,
    ) -> Result<InvoiceRecord, Vec<Field>> {
        let missing = check_completeness(&self).missing;

        match self {
            PartialRecord {
                tax_id: Some(tax_id),
                total_amount: Some(total_amount),
                total_volume: Some(total_volume),
                issue_date: Some(issue_date),
                period_start: Some(period_start),
                period_end: Some(period_end),
                document_number: Some(document_number),
                icms_amount: Some(icms_amount),
            } if missing.is_empty() => Ok(InvoiceRecord {
                tax_id,
                total_amount,
                total_volume,
                issue_date,
                period_start,
                period_end,
                document_number,
                icms_amount,
                distributor: distributor.to_string(),
                source_file_name: source_file_name.to_string(),
            }),
            _ => Err(missing),
        }
    }
}

/// A complete, validated invoice ready for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub tax_id: String,
    pub total_amount: Decimal,
    pub total_volume: Decimal,
    pub issue_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub document_number: String,
    pub icms_amount: Decimal,
    pub distributor: String,
    pub source_file_name: String,
}

impl InvoiceRecord {
    /// The deduplication key of this record.
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            tax_id: self.tax_id.clone(),
            period_start: self.period_start,
            period_end: self.period_end,
            total_amount: self.total_amount,
        }
    }
}

/// (tax id, period start, period end, total amount) identifying one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NaturalKey {
    pub tax_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: Decimal,
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}..{} {}",
            self.tax_id,
            format_dmy(self.period_start),
            format_dmy(self.period_end),
            self.total_amount.normalize()
        )
    }
}
