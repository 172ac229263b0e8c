//! Rule tables and value parsers shared by the extractors.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{format_locale_amount, parse_amount, parse_canonical_amount, parse_locale_amount};
pub use dates::{format_dmy, month_end, parse_dmy, parse_iso_date, DATE_FORMAT};

use regex::Regex;

use crate::models::record::Field;

/// A single field-extraction rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Field the rule fills.
    pub field: Field,
    /// Pattern matched against the whole document text.
    pub regex: Regex,
}

impl PatternRule {
    pub fn new(field: Field, regex: Regex) -> Self {
        Self { field, regex }
    }

    /// First match in the text: group 1 when the pattern has a capturing
    /// group, otherwise the whole match.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.regex.captures(text)?;
        match caps.get(1) {
            Some(group) => Some(group.as_str()),
            None if self.regex.captures_len() > 1 => None,
            None => caps.get(0).map(|m| m.as_str()),
        }
    }
}

/// The default rule set, in extraction order.
pub fn default_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(Field::TaxId, patterns::TAX_ID.clone()),
        PatternRule::new(Field::TotalAmount, patterns::TOTAL_AMOUNT.clone()),
        PatternRule::new(Field::TotalVolume, patterns::TOTAL_VOLUME.clone()),
        PatternRule::new(Field::IssueDate, patterns::ISSUE_DATE.clone()),
        PatternRule::new(Field::PeriodStart, patterns::PERIOD_START.clone()),
        PatternRule::new(Field::PeriodEnd, patterns::PERIOD_END.clone()),
        PatternRule::new(Field::DocumentNumber, patterns::DOCUMENT_NUMBER.clone()),
        PatternRule::new(Field::IcmsAmount, patterns::ICMS_AMOUNT.clone()),
    ]
}
