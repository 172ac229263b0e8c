//! Completeness check over the required field set.

use serde::Serialize;

use crate::models::record::{Field, PartialRecord};

/// Outcome of the completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    /// Required fields that are absent or empty, in column order.
    pub missing: Vec<Field>,
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check that every required field is present and non-empty.
pub fn check_completeness(record: &PartialRecord) -> Completeness {
    Completeness {
        missing: Field::REQUIRED
            .into_iter()
            .filter(|f| !record.is_present(*f))
            .collect(),
    }
}
