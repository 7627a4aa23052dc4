use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::UploadStore;
use crate::application::services::{
    AnswerService, IngestionService, LabReportService, RetrievalService,
};

/// Shared services handed to every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub retrieval_service: Arc<RetrievalService>,
    pub answer_service: Arc<AnswerService>,
    pub lab_report_service: Arc<LabReportService>,
    pub ingestion_service: Arc<IngestionService>,
    /// Destination of uploaded PDFs; the same folder ingestion reads.
    pub corpus_store: Arc<dyn UploadStore>,
    pub image_store: Arc<dyn UploadStore>,
    pub corpus_dir: PathBuf,
    pub max_upload_bytes: usize,
}
