use std::sync::Arc;

use crate::application::ports::{Embedder, UploadStoreError, VectorStore};
use crate::application::services::{
    AnswerService, IngestionService, LabReportService, RetrievalService,
};
use crate::infrastructure::llm::{
    EmbedderFactory, EmbedderFactoryError, LlmClientFactory, LlmClientFactoryError,
};
use crate::infrastructure::persistence::LocalVectorIndex;
use crate::infrastructure::storage::LocalUploadStore;
use crate::infrastructure::text_processing::{PdfAdapter, RecursiveCharacterSplitter};
use crate::presentation::config::Settings;

use super::AppState;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("embedder: {0}")]
    Embedder(#[from] EmbedderFactoryError),
    #[error("llm: {0}")]
    Llm(#[from] LlmClientFactoryError),
    #[error("storage: {0}")]
    Storage(#[from] UploadStoreError),
    #[error("startup task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Loads the embedding model off the async runtime; the local provider
/// downloads weights on first use.
pub async fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>, BootstrapError> {
    let embeddings = settings.embeddings.clone();
    let embedder = tokio::task::spawn_blocking(move || EmbedderFactory::create(&embeddings)).await??;
    Ok(embedder)
}

pub fn build_vector_store(settings: &Settings) -> Arc<dyn VectorStore> {
    Arc::new(LocalVectorIndex::new(settings.index.dir.clone()))
}

pub fn build_ingestion_service(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
) -> IngestionService {
    IngestionService::new(
        Arc::new(PdfAdapter::new()),
        embedder,
        vector_store,
        Arc::new(RecursiveCharacterSplitter::new(
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        )),
        settings.ingestion_options(),
    )
}

/// Services that call the hosted model. Fails fast when credentials are missing.
pub fn build_model_services(
    settings: &Settings,
    retrieval_service: Arc<RetrievalService>,
) -> Result<(AnswerService, LabReportService), BootstrapError> {
    let clients = LlmClientFactory::create(&settings.llm)?;

    let answer_service = AnswerService::new(
        Arc::clone(&retrieval_service),
        Arc::clone(&clients.chat),
        settings.answer_options(),
    );
    let lab_report_service = LabReportService::new(
        retrieval_service,
        clients.vision,
        clients.chat,
        settings.lab_report_options(),
    );

    Ok((answer_service, lab_report_service))
}

pub async fn build_app_state(settings: &Settings) -> Result<AppState, BootstrapError> {
    let embedder = build_embedder(settings).await?;
    let vector_store = build_vector_store(settings);

    let retrieval_service = Arc::new(RetrievalService::new(
        Arc::clone(&embedder),
        Arc::clone(&vector_store),
    ));
    let (answer_service, lab_report_service) =
        build_model_services(settings, Arc::clone(&retrieval_service))?;
    let ingestion_service = build_ingestion_service(settings, embedder, vector_store);

    Ok(AppState {
        retrieval_service,
        answer_service: Arc::new(answer_service),
        lab_report_service: Arc::new(lab_report_service),
        ingestion_service: Arc::new(ingestion_service),
        corpus_store: Arc::new(LocalUploadStore::new(settings.corpus.data_dir.clone())?),
        image_store: Arc::new(LocalUploadStore::new(settings.corpus.uploads_dir.clone())?),
        corpus_dir: settings.corpus.data_dir.clone(),
        max_upload_bytes: settings.server.max_upload_bytes,
    })
}
