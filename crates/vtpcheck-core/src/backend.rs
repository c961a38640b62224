use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("missing metadata key: {0}")]
    MissingMetadata(&'static str),
    #[error("page {0} out of range")]
    PageOutOfRange(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document-level metadata for an opened PDF.
///
/// Every field must be produced by the backend for any PDF it can open.
/// A backend that cannot look up one of these keys reports
/// [`BackendError::MissingMetadata`] rather than substituting an empty
/// string; an empty string is a present-but-empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub format: String,
    pub producer: String,
    pub creation_date: String,
    pub mod_date: String,
}

/// One unit of extracted text from a PDF page, in page order.
///
/// The block's index within the sequence returned by
/// [`PdfDocument::page_blocks`] is the only positional signal the
/// extraction pipeline consults; no coordinates are exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Raw block text. May carry leading/trailing whitespace.
    pub text: String,
}

/// Trait for PDF parsing backends.
///
/// Implementors provide the low-level document access step (page count,
/// metadata, positioned text blocks); the validation and field-extraction
/// pipeline lives in [`crate::check_letter`].
pub trait PdfBackend: Send + Sync {
    /// Open a PDF file, producing a document handle.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An opened PDF document.
///
/// The underlying parser resource is held for the lifetime of the handle
/// and released on drop, so every exit path of a pipeline run closes it.
pub trait PdfDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Document-level metadata.
    fn metadata(&self) -> Result<DocumentMetadata, BackendError>;

    /// Text blocks of a single page, in page order. Produced on demand;
    /// implementations are not required to cache across calls.
    fn page_blocks(&self, page_index: usize) -> Result<Vec<TextBlock>, BackendError>;
}
