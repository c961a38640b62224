//! Static PDF backend for testing.

use std::path::Path;

use crate::backend::{BackendError, DocumentMetadata, PdfBackend, PdfDocument, TextBlock};

/// A hand-rolled in-memory document implementing [`PdfDocument`] for tests.
///
/// Fields are public so a test can start from [`StaticDocument::conforming`]
/// and perturb exactly the signal under test.
#[derive(Debug, Clone)]
pub struct StaticDocument {
    pub page_count: usize,
    pub metadata: DocumentMetadata,
    /// Block lists per page, page order.
    pub pages: Vec<Vec<TextBlock>>,
    /// When set, [`PdfDocument::metadata`] fails with
    /// [`BackendError::MissingMetadata`] naming this key.
    pub missing_metadata: Option<&'static str>,
}

impl StaticDocument {
    /// A one-page document whose metadata matches the stock VTL letter
    /// fingerprint, with the given page-1 blocks.
    pub fn conforming(page1: Vec<TextBlock>) -> Self {
        Self {
            page_count: 1,
            metadata: DocumentMetadata {
                title: "VTL Approval Letter".to_string(),
                format: "PDF 1.4".to_string(),
                producer: "iText 2.1.7 by 1T3XT".to_string(),
                creation_date: "D:20211001120000+08'00'".to_string(),
                mod_date: "D:20211001120000+08'00'".to_string(),
            },
            pages: vec![page1],
            missing_metadata: None,
        }
    }

    /// Like [`conforming`](Self::conforming), building the page from plain
    /// strings.
    pub fn conforming_with_texts(texts: &[&str]) -> Self {
        Self::conforming(
            texts
                .iter()
                .map(|t| TextBlock {
                    text: t.to_string(),
                })
                .collect(),
        )
    }
}

impl PdfDocument for StaticDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn metadata(&self) -> Result<DocumentMetadata, BackendError> {
        if let Some(key) = self.missing_metadata {
            return Err(BackendError::MissingMetadata(key));
        }
        Ok(self.metadata.clone())
    }

    fn page_blocks(&self, page_index: usize) -> Result<Vec<TextBlock>, BackendError> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or(BackendError::PageOutOfRange(page_index))
    }
}

/// A [`PdfBackend`] that hands out clones of one [`StaticDocument`],
/// or fails to open when `open_error` is set.
pub struct StaticBackend {
    pub document: StaticDocument,
    pub open_error: Option<String>,
}

impl StaticBackend {
    pub fn new(document: StaticDocument) -> Self {
        Self {
            document,
            open_error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            document: StaticDocument::conforming(vec![]),
            open_error: Some(message.to_string()),
        }
    }
}

impl PdfBackend for StaticBackend {
    fn open(&self, _path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        if let Some(message) = &self.open_error {
            return Err(BackendError::OpenError(message.clone()));
        }
        Ok(Box::new(self.document.clone()))
    }
}
