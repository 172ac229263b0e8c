//! Tree-path extractor for NF-e XML invoices.

use rust_decimal::Decimal;
use tracing::debug;

use super::rules::{format_dmy, month_end, parse_canonical_amount, parse_iso_date};
use super::xml::XmlElement;
use super::{FieldExtractor, Result};
use crate::error::{ExtractionError, ParseError};
use crate::models::config::NFE_NAMESPACE;
use crate::models::record::{Field, NumberFormat, RawFields};

const ISSUE_TIMESTAMP: &[&str] = &["ide", "dhEmi"];
const DOCUMENT_NUMBER: &[&str] = &["ide", "nNF"];
const TAX_ID: &[&str] = &["dest", "CNPJ"];
const TOTAL_AMOUNT: &[&str] = &["total", "ICMSTot", "vNF"];
const ICMS_AMOUNT: &[&str] = &["total", "ICMSTot", "vICMS"];
const LINE_ITEM: &str = "det";
const LINE_QUANTITY: &[&str] = &["prod", "qCom"];

/// Extracts invoice fields from an NF-e document tree.
///
/// Numeric values in the tree are already dot-decimal, so the result is
/// tagged [`NumberFormat::Canonical`]. The billing period is derived from the
/// issue date: it starts on the issue date and ends on the last day of that
/// month.
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    namespace: String,
}

impl StructuredExtractor {
    pub fn new() -> Self {
        Self::with_namespace(NFE_NAMESPACE)
    }

    /// Query elements bound to a different namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Extract from an already parsed tree.
    pub fn extract_tree(&self, root: &XmlElement) -> Result<RawFields> {
        let issue_text = self.required(root, ISSUE_TIMESTAMP)?;
        let issue_date = parse_iso_date(issue_text)
            .ok_or_else(|| ParseError::new(Field::IssueDate, issue_text))?;
        let issue = format_dmy(issue_date);

        let mut fields = RawFields::new(NumberFormat::Canonical);
        fields.insert(Field::TaxId, self.required(root, TAX_ID)?.trim());
        fields.insert(Field::TotalAmount, self.required(root, TOTAL_AMOUNT)?.trim());
        fields.insert(Field::TotalVolume, self.total_volume(root)?.normalize().to_string());
        fields.insert(Field::IssueDate, issue.clone());
        fields.insert(Field::PeriodStart, issue);
        fields.insert(Field::PeriodEnd, format_dmy(month_end(issue_date)));
        fields.insert(Field::DocumentNumber, self.required(root, DOCUMENT_NUMBER)?.trim());
        fields.insert(Field::IcmsAmount, self.required(root, ICMS_AMOUNT)?.trim());

        debug!("Structured extractor read {} fields", fields.len());
        Ok(fields)
    }

    fn required<'a>(&self, root: &'a XmlElement, path: &[&str]) -> Result<&'a str> {
        root.find(&self.namespace, path)
            .map(|e| e.text.as_str())
            .ok_or_else(|| ExtractionError::MissingNode(path.join("/")))
    }

    /// Sum of the quantity of every line item; items without one add zero.
    fn total_volume(&self, root: &XmlElement) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for item in root.find_all(&self.namespace, LINE_ITEM) {
            if let Some(quantity) = item.find(&self.namespace, LINE_QUANTITY) {
                let value = parse_canonical_amount(&quantity.text)
                    .ok_or_else(|| ParseError::new(Field::TotalVolume, quantity.text.clone()))?;
                total += value;
            }
        }
        Ok(total)
    }
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for StructuredExtractor {
    fn extract(&self, document: &str) -> Result<RawFields> {
        let root = XmlElement::parse(document)?;
        self.extract_tree(&root)
    }
}
