use std::path::Path;

use mupdf::{Document, MetadataName, TextPageFlags};

use vtpcheck_core::{BackendError, DocumentMetadata, PdfBackend, PdfDocument, TextBlock};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
///
/// Block extraction mirrors PyMuPDF's `get_text("blocks")`: one entry per
/// text-page block, lines joined with newlines, in page order. The core
/// pipeline relies on that ordering as its only positional signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))? as usize;

        Ok(Box::new(MupdfDocument {
            document,
            page_count,
        }))
    }
}

/// An opened document. The mupdf handle is released on drop, which the
/// pipeline reaches on every exit path.
struct MupdfDocument {
    document: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn metadata_value(
        &self,
        name: MetadataName,
        key: &'static str,
    ) -> Result<String, BackendError> {
        self.document
            .metadata(name)
            .map_err(|_| BackendError::MissingMetadata(key))
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn metadata(&self) -> Result<DocumentMetadata, BackendError> {
        Ok(DocumentMetadata {
            title: self.metadata_value(MetadataName::Title, "title")?,
            format: self.metadata_value(MetadataName::Format, "format")?,
            producer: self.metadata_value(MetadataName::Producer, "producer")?,
            creation_date: self.metadata_value(MetadataName::CreationDate, "creationDate")?,
            mod_date: self.metadata_value(MetadataName::ModDate, "modDate")?,
        })
    }

    fn page_blocks(&self, page_index: usize) -> Result<Vec<TextBlock>, BackendError> {
        if page_index >= self.page_count {
            return Err(BackendError::PageOutOfRange(page_index));
        }

        let page = self
            .document
            .load_page(page_index as i32)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let mut blocks = Vec::new();
        for block in text_page.blocks() {
            let mut text = String::new();
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                text.push_str(&line_text);
                text.push('\n');
            }
            blocks.push(TextBlock { text });
        }

        Ok(blocks)
    }
}
