use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;

use crate::application::ports::{
    CompletionRequest, ImageInput, LlmClient, LlmClientError, SearchResult,
};
use crate::domain::{AnswerParseError, BiomarkerReport, StructuredAnswer};

use super::prompts::{BIOMARKER_EXTRACTION_PROMPT, LAB_REPORT_CONTEXT_SEPARATOR, lab_report_prompt};
use super::retrieval_service::join_context;
use super::{ErrorCategory, RetrievalError, RetrievalService};

#[derive(Debug, Clone, Copy)]
pub struct LabReportOptions {
    pub top_k: usize,
    pub vision_temperature: f32,
    pub reasoning_temperature: f32,
}

impl Default for LabReportOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            vision_temperature: 0.1,
            reasoning_temperature: 0.2,
        }
    }
}

pub struct LabReportService {
    retrieval: Arc<RetrievalService>,
    vision_client: Arc<dyn LlmClient>,
    reasoning_client: Arc<dyn LlmClient>,
    options: LabReportOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabReportAnalysis {
    pub biomarkers: BiomarkerReport,
    #[serde(flatten)]
    pub answer: StructuredAnswer,
    pub sources: Vec<SourceExcerpt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceExcerpt {
    pub source: String,
    pub page: Option<u32>,
    pub score: f32,
    pub text: String,
}

impl From<SearchResult> for SourceExcerpt {
    fn from(result: SearchResult) -> Self {
        Self {
            source: result.chunk.source,
            page: result.chunk.page,
            score: result.score,
            text: result.chunk.text,
        }
    }
}

impl LabReportService {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        vision_client: Arc<dyn LlmClient>,
        reasoning_client: Arc<dyn LlmClient>,
        options: LabReportOptions,
    ) -> Self {
        Self {
            retrieval,
            vision_client,
            reasoning_client,
            options,
        }
    }

    /// Reads biomarker lines from a lab-report image. The returned text is not validated.
    #[tracing::instrument(skip(self, image), fields(image_bytes = image.len()))]
    pub async fn extract_biomarkers(&self, image: &[u8]) -> Result<BiomarkerReport, LabReportError> {
        if image.is_empty() {
            return Err(LabReportError::EmptyImage);
        }
        let format = image::guess_format(image).map_err(|_| LabReportError::NotAnImage)?;

        let encoded = general_purpose::STANDARD.encode(image);
        tracing::debug!(base64_len = encoded.len(), "Image encoded");

        let request =
            CompletionRequest::text(BIOMARKER_EXTRACTION_PROMPT, self.options.vision_temperature)
                .with_image(ImageInput {
                    mime_type: format.to_mime_type().to_string(),
                    base64_data: encoded,
                });

        let text = self
            .vision_client
            .complete(&request)
            .await
            .map_err(LabReportError::Extraction)?;

        Ok(BiomarkerReport::new(text))
    }

    /// Image → biomarkers → guideline retrieval → structured reasoning.
    #[tracing::instrument(skip(self, image), fields(image_bytes = image.len()))]
    pub async fn analyze(&self, image: &[u8]) -> Result<LabReportAnalysis, LabReportError> {
        let biomarkers = self.extract_biomarkers(image).await?;
        if biomarkers.is_blank() {
            return Err(LabReportError::NoBiomarkers);
        }
        tracing::info!(lines = biomarkers.as_str().lines().count(), "Biomarkers extracted");

        let sources = self
            .retrieval
            .retrieve(biomarkers.as_str(), self.options.top_k)
            .await
            .map_err(LabReportError::Retrieval)?;

        let context = join_context(&sources, LAB_REPORT_CONTEXT_SEPARATOR);
        let request = CompletionRequest::text(
            lab_report_prompt(biomarkers.as_str(), &context),
            self.options.reasoning_temperature,
        )
        .with_json_schema(StructuredAnswer::SCHEMA_NAME, StructuredAnswer::json_schema());

        let raw = self
            .reasoning_client
            .complete(&request)
            .await
            .map_err(LabReportError::Completion)?;

        let answer = StructuredAnswer::parse(&raw).map_err(LabReportError::MalformedOutput)?;

        Ok(LabReportAnalysis {
            biomarkers,
            answer,
            sources: sources.into_iter().map(SourceExcerpt::from).collect(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LabReportError {
    #[error("image is empty")]
    EmptyImage,
    #[error("file is not a recognised image format")]
    NotAnImage,
    #[error("vision extraction: {0}")]
    Extraction(LlmClientError),
    #[error("no biomarkers could be read from the image")]
    NoBiomarkers,
    #[error("retrieval: {0}")]
    Retrieval(RetrievalError),
    #[error("completion: {0}")]
    Completion(LlmClientError),
    #[error("malformed model output: {0}")]
    MalformedOutput(AnswerParseError),
}

impl LabReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LabReportError::EmptyImage | LabReportError::NotAnImage => ErrorCategory::Validation,
            LabReportError::Retrieval(e) => e.category(),
            LabReportError::Extraction(_)
            | LabReportError::NoBiomarkers
            | LabReportError::Completion(_)
            | LabReportError::MalformedOutput(_) => ErrorCategory::Upstream,
        }
    }
}
