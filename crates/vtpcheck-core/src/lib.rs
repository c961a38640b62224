//! Validation and field extraction for VTP approval letters.
//!
//! A letter is processed as a linear pipeline: open the PDF through a
//! [`PdfBackend`], run the metadata fingerprint checks, then locate the
//! letter's fields by positional heuristics over the first page's text
//! blocks. The result is always a well-formed [`Verdict`]: either the
//! extracted field map or an opaque rejection value. Only load failures
//! (unparseable PDF, missing metadata keys) surface as errors.
//!
//! Each call is independent and stateless; the opened document is
//! released when the pipeline returns, on every exit path.

use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod backend;
pub mod extractor;
pub mod fingerprint;
pub mod mock;

// Re-export for convenience
pub use backend::{BackendError, DocumentMetadata, PdfBackend, PdfDocument, TextBlock};
pub use extractor::{FULL_SCHEMA_MIN_BLOCKS, extract_fields, qualifying_blocks};
pub use fingerprint::{TemplateFingerprint, validate};

/// The opaque failure message exposed at the external boundary.
pub const REJECTION_MESSAGE: &str = "Validity Checks Failed";

/// Outcome of the five metadata fingerprint checks.
///
/// Recomputed fresh for every validation call; all five entries are
/// evaluated even when an earlier one fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSet {
    pub page_check: bool,
    pub title_check: bool,
    pub format_check: bool,
    pub producer_check: bool,
    pub non_tampered_check: bool,
}

impl CheckSet {
    /// True iff every check passed.
    pub fn passed(&self) -> bool {
        self.page_check
            && self.title_check
            && self.format_check
            && self.producer_check
            && self.non_tampered_check
    }

    /// Names of the checks that failed, in check order. For diagnostics;
    /// never exposed in the external result object.
    pub fn failed_names(&self) -> Vec<&'static str> {
        [
            ("page_check", self.page_check),
            ("title_check", self.title_check),
            ("format_check", self.format_check),
            ("producer_check", self.producer_check),
            ("non_tampered_check", self.non_tampered_check),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }
}

/// The extracted field map, fixed schema.
///
/// Serde field order is the external key order. A field the positional
/// scan could not locate is the empty string; keys are never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    #[serde(rename = "VTP Type")]
    pub vtp_type: String,
    #[serde(rename = "VTL Type")]
    pub vtl_type: String,
    #[serde(rename = "VTP Issue Date")]
    pub issue_date: String,
    #[serde(rename = "VTP Reference Number")]
    pub reference_number: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "FIN Number")]
    pub fin_number: String,
    #[serde(rename = "Passport Number")]
    pub passport_number: String,
    #[serde(rename = "VTP Valid From")]
    pub valid_from: String,
    #[serde(rename = "VTP Valid To")]
    pub valid_to: String,
}

impl FieldReport {
    /// (external key, value) pairs in schema order, for tabular display.
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("VTP Type", &self.vtp_type),
            ("VTL Type", &self.vtl_type),
            ("VTP Issue Date", &self.issue_date),
            ("VTP Reference Number", &self.reference_number),
            ("Name", &self.name),
            ("FIN Number", &self.fin_number),
            ("Passport Number", &self.passport_number),
            ("VTP Valid From", &self.valid_from),
            ("VTP Valid To", &self.valid_to),
        ]
    }
}

/// Why a letter was rejected.
///
/// The cause is structured here for logging and diagnostics, but the
/// external boundary is deliberately opaque: serialization always
/// produces `{"Error": "Validity Checks Failed"}` without disclosing
/// which check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// One or more metadata fingerprint checks failed.
    Fingerprint(CheckSet),
    /// The page did not carry exactly one distinct VTL tag and one
    /// distinct VTP tag.
    TemplateTags { vtl: usize, vtp: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Fingerprint(checks) => {
                write!(f, "fingerprint checks failed: {}", checks.failed_names().join(", "))
            }
            Rejection::TemplateTags { vtl, vtp } => {
                write!(f, "expected one distinct VTL and VTP tag, found {vtl} VTL / {vtp} VTP")
            }
        }
    }
}

impl Serialize for Rejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Error", REJECTION_MESSAGE)?;
        map.end()
    }
}

/// The well-formed result of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Verdict {
    Fields(FieldReport),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected(_))
    }
}

#[derive(Error, Debug)]
pub enum VtpError {
    #[error("failed to load PDF: {0}")]
    Load(#[from] BackendError),
}

/// Open a PDF and run the full validate-then-extract pipeline.
///
/// The document handle is dropped before this returns, success or not.
pub fn check_letter(
    path: &Path,
    backend: &dyn PdfBackend,
    fingerprint: &TemplateFingerprint,
) -> Result<Verdict, VtpError> {
    let doc = backend.open(path)?;
    check_document(doc.as_ref(), fingerprint)
}

/// Run the pipeline over an already-opened document.
///
/// Pure function of the document's metadata and page-1 block sequence:
/// identical inputs always produce an identical [`Verdict`].
pub fn check_document(
    doc: &dyn PdfDocument,
    fingerprint: &TemplateFingerprint,
) -> Result<Verdict, VtpError> {
    let checks = fingerprint::validate(doc, fingerprint)?;
    if !checks.passed() {
        return Ok(Verdict::Rejected(Rejection::Fingerprint(checks)));
    }

    let blocks = doc.page_blocks(0)?;
    match extractor::extract_fields(&blocks) {
        Ok(fields) => Ok(Verdict::Fields(fields)),
        Err(rejection) => {
            tracing::info!(cause = %rejection, "letter rejected after metadata checks");
            Ok(Verdict::Rejected(rejection))
        }
    }
}
