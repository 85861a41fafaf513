use std::path::Path;
use std::sync::Arc;

use mupdf::{Document as MuDocument, Page};

use crate::error::{Error, Result};
use super::page_index::PageIndex;

/// Thread-safe wrapper around a PDF document
pub struct PdfDocument {
    /// The raw PDF bytes; mupdf handles are reopened from these per operation
    bytes: Arc<Vec<u8>>,
    page_count: u32,
}

impl PdfDocument {
    /// Open a PDF from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        let doc = MuDocument::from_bytes(&bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        Ok(Self {
            bytes: Arc::new(bytes),
            page_count: u32::try_from(page_count).unwrap_or(0),
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            Error::PdfOpen(format!("Failed to read file {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Number of pages; valid page numbers are `1..=page_count`
    pub const fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Raw PDF bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Open the document and load one page by its 1-based number.
    ///
    /// The returned document handle must outlive the page.
    pub(crate) fn load_page(&self, page_number: u32) -> Result<(MuDocument, Page)> {
        let index = PageIndex::from_page_number(page_number, self.page_count)?;

        let doc = MuDocument::from_bytes(&self.bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to open document: {e}")))?;

        let page = doc.load_page(index.into()).map_err(|e| Error::PdfRender {
            page: page_number,
            reason: format!("Failed to load page: {e}"),
        })?;

        Ok((doc, page))
    }
}

impl Clone for PdfDocument {
    /// O(1): only the `Arc` around the bytes is cloned.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
