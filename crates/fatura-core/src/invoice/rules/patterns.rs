//! Regex patterns for the COPERGÁS invoice layout.
//!
//! Each pattern is matched once against the whole flattened document text.
//! When a pattern has a capturing group, group 1 is the field value.

use lazy_static::lazy_static;
use regex::Regex;

/// Locale amount: "1.234,56" or "234,56".
macro_rules! amount {
    () => {
        r"\d{1,3}(?:\.?\d{3})*,\d{2}"
    };
}

lazy_static! {
    // CNPJ printed right before the first currency amount
    pub static ref TAX_ID: Regex = Regex::new(
        r"(\d{2}\.\d+\.\d+/\d+-?\d+)\sR\$"
    ).unwrap();

    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        concat!(r"R\$\s?(", amount!(), r")")
    ).unwrap();

    // "Faturado: 1.234" / "faturada 150,5"
    pub static ref TOTAL_VOLUME: Regex = Regex::new(
        r"[Ff]aturad[oa]?:?\s?(\d+(?:\.\d{3})*(?:,\d+)?)"
    ).unwrap();

    pub static ref ISSUE_DATE: Regex = Regex::new(
        r"\d+\s(\d{1,2}/\d{1,2}/\d{4})\s\d+"
    ).unwrap();

    // "Período: 01/02/2024 a 29/02/2024"
    pub static ref PERIOD_START: Regex = Regex::new(
        r":\s?(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    pub static ref PERIOD_END: Regex = Regex::new(
        r"[Aa]\s(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    pub static ref DOCUMENT_NUMBER: Regex = Regex::new(
        r"\s(\d+)\s?S[ÉE]RIE"
    ).unwrap();

    // ICMS is the middle value of the "base / ICMS / total" amount triple
    pub static ref ICMS_AMOUNT: Regex = Regex::new(
        concat!(
            r"R\$\s", amount!(),
            r"\sR\$\s(", amount!(), r")",
            r"\sR\$\s", amount!(), r"\s"
        )
    ).unwrap();
}
