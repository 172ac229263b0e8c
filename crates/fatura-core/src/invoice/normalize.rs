//! Conversion of raw captures into typed record fields.

use serde::Serialize;
use tracing::warn;

use super::rules::{parse_amount, parse_dmy};
use crate::error::ParseError;
use crate::models::record::{Field, PartialRecord, RawFields};

/// Output of normalization: the typed fields plus every capture that failed
/// to parse. A failed capture leaves its field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub record: PartialRecord,
    pub errors: Vec<ParseError>,
}

/// Converts raw captured strings into canonical decimals and dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &RawFields) -> Normalized {
        let mut out = Normalized::default();
        let format = raw.number_format();

        out.record.tax_id = text(raw, Field::TaxId);
        out.record.document_number = text(raw, Field::DocumentNumber);

        out.record.total_amount = parse(raw, Field::TotalAmount, &mut out.errors, |s| {
            parse_amount(s, format)
        });
        out.record.icms_amount = parse(raw, Field::IcmsAmount, &mut out.errors, |s| {
            parse_amount(s, format)
        });
        out.record.total_volume = parse(raw, Field::TotalVolume, &mut out.errors, |s| {
            parse_amount(s, format)
        });

        out.record.issue_date = parse(raw, Field::IssueDate, &mut out.errors, parse_dmy);
        out.record.period_start = parse(raw, Field::PeriodStart, &mut out.errors, parse_dmy);
        out.record.period_end = parse(raw, Field::PeriodEnd, &mut out.errors, parse_dmy);

        for error in &out.errors {
            warn!("{}", error);
        }
        out
    }
}

fn text(raw: &RawFields, field: Field) -> Option<String> {
    raw.get(field)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse<T>(
    raw: &RawFields,
    field: Field,
    errors: &mut Vec<ParseError>,
    parser: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let value = raw.get(field)?.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parser(value);
    if parsed.is_none() {
        errors.push(ParseError::new(field, value));
    }
    parsed
}
