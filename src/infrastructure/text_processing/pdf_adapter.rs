use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use pdf_oxide::PdfDocument;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{ContentType, Document, PageText};

use super::text_sanitizer::sanitize_extracted_text;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Extracts per-page text from PDFs with pdf_oxide. Pages that are empty after
/// sanitising are dropped; page numbers keep their position in the document.
#[derive(Default)]
pub struct PdfAdapter;

impl PdfAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Runs on a blocking thread; pdf_oxide wants a path, so the bytes go to a temp file first.
    fn read_pages(data: &[u8]) -> Result<Vec<PageText>, FileLoaderError> {
        let mut scratch = tempfile::NamedTempFile::new()
            .and_then(|mut file| file.write_all(data).map(|()| file))
            .map_err(|e| extraction_error("write temp file", e))?;
        scratch.flush().map_err(|e| extraction_error("flush temp file", e))?;

        let doc =
            PdfDocument::open(scratch.path()).map_err(|e| extraction_error("parse PDF", e))?;
        let page_count = doc
            .page_count()
            .map_err(|e| extraction_error("read page count", e))?;

        let pages = (0..page_count)
            .filter_map(|index| {
                let number = (index + 1) as u32;
                match doc.extract_text(index) {
                    Ok(raw) => Some(PageText::new(number, sanitize_extracted_text(&raw))),
                    Err(e) => {
                        tracing::warn!(page = number, error = %e, "Skipping unreadable PDF page");
                        None
                    }
                }
            })
            .filter(|page| !page.text.is_empty())
            .collect();

        Ok(pages)
    }
}

fn extraction_error(stage: &str, e: impl std::fmt::Display) -> FileLoaderError {
    FileLoaderError::ExtractionFailed(format!("{stage}: {e}"))
}

#[async_trait]
impl FileLoader for PdfAdapter {
    #[tracing::instrument(
        skip(self, data),
        fields(
            document_id = %document.id.as_uuid(),
            filename = %document.filename,
        )
    )]
    async fn extract_pages(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<Vec<PageText>, FileLoaderError> {
        if document.content_type != ContentType::Pdf {
            return Err(FileLoaderError::UnsupportedContentType(
                document.content_type.as_mime().to_string(),
            ));
        }

        let data = data.to_vec();
        let pages = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::read_pages(&data)),
        )
        .await
        .map_err(|_| extraction_error("timeout", "PDF extraction exceeded 30s"))?
        .map_err(|e| extraction_error("join", e))??;

        tracing::info!(page_count = pages.len(), "PDF text extraction complete");

        if pages.is_empty() {
            return Err(FileLoaderError::NoTextFound(document.filename.clone()));
        }

        Ok(pages)
    }
}
