//! Template fingerprint validation.
//!
//! A VTP letter is identified by a fixed set of metadata equalities against
//! an expected template. The expected values are carried in a
//! [`TemplateFingerprint`] rather than embedded constants, so an alternate
//! letter template is a data change (a TOML file), not a code change.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CheckSet;
use crate::backend::{BackendError, PdfDocument};

fn default_page_counts() -> Vec<usize> {
    vec![1, 4]
}

fn default_title() -> String {
    "VTL Approval Letter".to_string()
}

fn default_format() -> String {
    "PDF 1.4".to_string()
}

fn default_producer() -> String {
    "iText 2.1.7 by 1T3XT".to_string()
}

/// Expected metadata values for one letter template.
///
/// All fields default to the VTL approval-letter template, so a partial
/// TOML file overrides only what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFingerprint {
    /// Page counts accepted by `page_check`. The stock letter circulates
    /// either as the full four-page document or as its first page alone.
    #[serde(default = "default_page_counts")]
    pub allowed_page_counts: Vec<usize>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_producer")]
    pub producer: String,
}

impl Default for TemplateFingerprint {
    fn default() -> Self {
        Self {
            allowed_page_counts: default_page_counts(),
            title: default_title(),
            format: default_format(),
            producer: default_producer(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TemplateFileError {
    #[error("failed to read template file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse template file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl TemplateFingerprint {
    /// Load a fingerprint from a TOML file. Absent keys keep their
    /// stock-template defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, TemplateFileError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Run the fixed metadata check sequence against an opened document.
///
/// All five checks are computed unconditionally (evaluate-all-signals
/// policy); a failed early check never hides the state of a later one.
/// `non_tampered_check` compares the creation and modification dates as
/// raw strings, byte for byte, with no date parsing or tolerance.
///
/// A metadata key the backend cannot produce surfaces as a
/// [`BackendError`], not as a failed check.
pub fn validate(
    doc: &dyn PdfDocument,
    fingerprint: &TemplateFingerprint,
) -> Result<CheckSet, BackendError> {
    let meta = doc.metadata()?;

    let checks = CheckSet {
        page_check: fingerprint.allowed_page_counts.contains(&doc.page_count()),
        title_check: meta.title == fingerprint.title,
        format_check: meta.format == fingerprint.format,
        producer_check: meta.producer == fingerprint.producer,
        non_tampered_check: meta.creation_date == meta.mod_date,
    };

    if !checks.passed() {
        tracing::info!(failed = ?checks.failed_names(), "fingerprint checks failed");
    }

    Ok(checks)
}
