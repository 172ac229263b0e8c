//! Configuration structures for the ingestion pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::record::Field;

/// Namespace of the electronic invoice (NF-e) XML layout.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Main configuration for the fatura pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaturaConfig {
    /// Pipeline paths and identity.
    pub pipeline: PipelineConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Where documents come from and where they go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Distributor name written on every ledger row.
    pub distributor: String,

    /// Directory scanned for new invoices.
    pub inbox_dir: PathBuf,

    /// Directory receiving archived invoices.
    pub processed_dir: PathBuf,

    /// Ledger spreadsheet path.
    pub ledger_path: PathBuf,

    /// Worksheet name used when the ledger is created.
    pub sheet_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            distributor: "COPERGÁS".to_string(),
            inbox_dir: PathBuf::from("Faturas"),
            processed_dir: PathBuf::from("Lidos"),
            ledger_path: PathBuf::from("COPERGAS.xlsx"),
            sheet_name: "Sheet1".to_string(),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum trimmed text length to consider the PDF readable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 1 }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// XML namespace the structured extractor queries.
    pub namespace: String,

    /// Regex overrides for the text extractor, keyed by field.
    pub patterns: BTreeMap<Field, String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            namespace: NFE_NAMESPACE.to_string(),
            patterns: BTreeMap::new(),
        }
    }
}

impl FaturaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"pipeline": {"distributor": "GASMIG"},
                       "extraction": {"patterns": {"tax_id": "CNPJ (\\S+)"}}}"#;
        let config: FaturaConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.pipeline.distributor, "GASMIG");
        assert_eq!(config.pipeline.sheet_name, "Sheet1");
        assert_eq!(config.extraction.namespace, NFE_NAMESPACE);
        assert_eq!(
            config.extraction.patterns.get(&Field::TaxId).map(String::as_str),
            Some("CNPJ (\\S+)")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FaturaConfig::default();
        config.pdf.min_text_length = 20;
        config.save(&path).unwrap();

        let loaded = FaturaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.min_text_length, 20);
        assert_eq!(loaded.pipeline.distributor, "COPERGÁS");
    }
}
