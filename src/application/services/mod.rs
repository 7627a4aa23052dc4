mod answer_service;
mod error_category;
mod ingestion_service;
mod lab_report_service;
pub mod prompts;
mod retrieval_service;

pub use answer_service::{AnswerError, AnswerMode, AnswerOptions, AnswerResponse, AnswerService};
pub use error_category::ErrorCategory;
pub use ingestion_service::{
    IngestionError, IngestionOptions, IngestionReport, IngestionService, SkippedFile,
};
pub use lab_report_service::{
    LabReportAnalysis, LabReportError, LabReportOptions, LabReportService, SourceExcerpt,
};
pub use retrieval_service::{RetrievalError, RetrievalService, join_context};
