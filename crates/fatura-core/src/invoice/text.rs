//! Pattern-based extractor for flattened PDF text.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, trace};

use super::rules::{default_rules, PatternRule};
use super::{FieldExtractor, Result};
use crate::error::FaturaError;
use crate::models::record::{Field, NumberFormat, RawFields};

/// Collapse line breaks into spaces and trim the ends.
pub fn flatten_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Applies an ordered rule table to document text.
///
/// Every rule runs independently against the whole text; the first match of
/// each rule wins and fields without a match are left out of the result.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    rules: Vec<PatternRule>,
}

impl TextExtractor {
    /// Create an extractor with the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Replace the patterns of the given fields.
    pub fn with_overrides(mut self, overrides: &BTreeMap<Field, String>) -> crate::Result<Self> {
        for (field, pattern) in overrides {
            let regex = Regex::new(pattern).map_err(|e| {
                FaturaError::Config(format!("invalid pattern for {}: {}", field, e))
            })?;
            match self.rules.iter_mut().find(|r| r.field == *field) {
                Some(rule) => rule.regex = regex,
                None => self.rules.push(PatternRule::new(*field, regex)),
            }
        }
        Ok(self)
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TextExtractor {
    fn extract(&self, document: &str) -> Result<RawFields> {
        let text = flatten_text(document);
        let mut fields = RawFields::new(NumberFormat::Locale);

        for rule in &self.rules {
            match rule.capture(&text) {
                Some(value) => {
                    trace!("{} matched {:?}", rule.field, value);
                    fields.insert(rule.field, value);
                }
                None => trace!("{} not found", rule.field),
            }
        }

        debug!("Text extractor captured {} of {} fields", fields.len(), self.rules.len());
        Ok(fields)
    }
}
