use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::application::ports::{
    CollectionConfig, DistanceMetric, Embedder, EmbedderError, FileLoader, FileLoaderError,
    TextSplitter, TextSplitterError, VectorStore, VectorStoreError,
};
use crate::domain::{Chunk, ContentType, Document, Embedding};

use super::ErrorCategory;

#[derive(Debug, Clone, Copy)]
pub struct IngestionOptions {
    pub embedding_batch_size: usize,
    pub distance_metric: DistanceMetric,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            embedding_batch_size: 32,
            distance_metric: DistanceMetric::Cosine,
        }
    }
}

pub struct IngestionService {
    file_loader: Arc<dyn FileLoader>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    text_splitter: Arc<dyn TextSplitter>,
    options: IngestionOptions,
    run_guard: Mutex<()>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub files_indexed: Vec<String>,
    pub files_skipped: Vec<SkippedFile>,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

impl IngestionService {
    pub fn new(
        file_loader: Arc<dyn FileLoader>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        text_splitter: Arc<dyn TextSplitter>,
        options: IngestionOptions,
    ) -> Self {
        Self {
            file_loader,
            embedder,
            vector_store,
            text_splitter,
            options,
            run_guard: Mutex::new(()),
        }
    }

    /// Rebuilds the index from every PDF in `corpus_dir`. Unreadable files are skipped.
    #[tracing::instrument(skip(self, corpus_dir), fields(corpus_dir = %corpus_dir.display()))]
    pub async fn ingest_directory(
        &self,
        corpus_dir: &Path,
    ) -> Result<IngestionReport, IngestionError> {
        let _run = self.run_guard.lock().await;

        let files = list_pdf_files(corpus_dir).await?;
        if files.is_empty() {
            return Err(IngestionError::NoDocuments(corpus_dir.display().to_string()));
        }

        let mut report = IngestionReport::default();
        let mut chunks = Vec::new();

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            tracing::info!(file = %name, "Reading document");
            match self.chunk_file(&path, &name).await {
                Ok(file_chunks) => {
                    tracing::info!(file = %name, chunks = file_chunks.len(), "Document processed");
                    report.files_indexed.push(name);
                    chunks.extend(file_chunks);
                }
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Skipping unreadable document");
                    report.files_skipped.push(SkippedFile {
                        file: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if chunks.is_empty() {
            return Err(IngestionError::NoChunks);
        }

        let embeddings = self.embed_chunks(&chunks).await?;
        let dimensions = embeddings.first().map(Embedding::dimensions).unwrap_or(0);

        let config = CollectionConfig::new(dimensions, self.embedder.model_name())
            .with_distance_metric(self.options.distance_metric);

        self.vector_store
            .rebuild(&config, &chunks, &embeddings)
            .await
            .map_err(IngestionError::Storage)?;

        report.chunk_count = chunks.len();
        tracing::info!(
            files = report.files_indexed.len(),
            skipped = report.files_skipped.len(),
            chunks = report.chunk_count,
            "Vector index rebuilt"
        );

        Ok(report)
    }

    async fn chunk_file(&self, path: &Path, name: &str) -> Result<Vec<Chunk>, FileError> {
        let data = tokio::fs::read(path).await.map_err(FileError::Read)?;
        let document = Document::new(name.to_string(), ContentType::Pdf, data.len() as u64);

        let pages = self
            .file_loader
            .extract_pages(&data, &document)
            .await
            .map_err(FileError::Load)?;

        let mut chunks = Vec::new();
        for page in pages {
            let page_chunks = self
                .text_splitter
                .split(&page.text, &document, Some(page.number))
                .await
                .map_err(FileError::Split)?;
            chunks.extend(page_chunks);
        }

        Ok(chunks)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Embedding>, IngestionError> {
        let batch_size = self.options.embedding_batch_size.max(1);
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let batch_embeddings = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(IngestionError::Embedding)?;

            if batch_embeddings.len() != batch.len() {
                return Err(IngestionError::Embedding(EmbedderError::InvalidResponse(
                    format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        batch_embeddings.len()
                    ),
                )));
            }
            embeddings.extend(batch_embeddings);
        }

        tracing::debug!(count = embeddings.len(), "Chunks embedded");
        Ok(embeddings)
    }
}

async fn list_pdf_files(corpus_dir: &Path) -> Result<Vec<PathBuf>, IngestionError> {
    let mut entries = match tokio::fs::read_dir(corpus_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestionError::CorpusNotFound(
                corpus_dir.display().to_string(),
            ));
        }
        Err(e) => return Err(IngestionError::Io(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error("read: {0}")]
    Read(std::io::Error),
    #[error("{0}")]
    Load(FileLoaderError),
    #[error("split: {0}")]
    Split(TextSplitterError),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("corpus folder not found: {0}")]
    CorpusNotFound(String),
    #[error("no PDF files found in {0}")]
    NoDocuments(String),
    #[error("no document content found to index")]
    NoChunks,
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("storage: {0}")]
    Storage(VectorStoreError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestionError::CorpusNotFound(_) => ErrorCategory::NotFound,
            IngestionError::NoDocuments(_) | IngestionError::NoChunks => ErrorCategory::Validation,
            IngestionError::Embedding(EmbedderError::ModelLoadFailed(_)) => ErrorCategory::Config,
            IngestionError::Embedding(_) | IngestionError::Storage(_) | IngestionError::Io(_) => {
                ErrorCategory::Upstream
            }
        }
    }
}
