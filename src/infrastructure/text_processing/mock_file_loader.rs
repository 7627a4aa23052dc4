use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{Document, PageText};

/// Treats the bytes as UTF-8 text. Form feeds (`\x0c`) separate pages.
pub struct MockFileLoader;

#[async_trait::async_trait]
impl FileLoader for MockFileLoader {
    async fn extract_pages(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<Vec<PageText>, FileLoaderError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| FileLoaderError::ExtractionFailed(e.to_string()))?;

        let pages: Vec<PageText> = text
            .split('\x0c')
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(i, page)| PageText::new((i + 1) as u32, page.trim().to_string()))
            .collect();

        if pages.is_empty() {
            return Err(FileLoaderError::NoTextFound(document.filename.clone()));
        }

        Ok(pages)
    }
}
