use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::{CompletionRequest, LlmClient, LlmClientError, SearchResult};
use crate::domain::{Answer, AnswerParseError, StructuredAnswer};

use super::prompts::{GUIDELINE_CONTEXT_SEPARATOR, guideline_answer_prompt};
use super::retrieval_service::join_context;
use super::{ErrorCategory, RetrievalError, RetrievalService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Text,
    Structured,
}

#[derive(Debug, Clone, Copy)]
pub struct AnswerOptions {
    pub mode: AnswerMode,
    pub top_k: usize,
    pub temperature: f32,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            mode: AnswerMode::Structured,
            top_k: 3,
            temperature: 0.1,
        }
    }
}

/// Retrieve, prompt, generate, parse. One model call per question; no retries.
pub struct AnswerService {
    retrieval: Arc<RetrievalService>,
    llm_client: Arc<dyn LlmClient>,
    options: AnswerOptions,
}

#[derive(Debug, Clone)]
pub struct AnswerResponse {
    pub answer: Answer,
    pub sources: Vec<SearchResult>,
}

impl AnswerService {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        llm_client: Arc<dyn LlmClient>,
        options: AnswerOptions,
    ) -> Self {
        Self {
            retrieval,
            llm_client,
            options,
        }
    }

    pub fn mode(&self) -> AnswerMode {
        self.options.mode
    }

    #[tracing::instrument(skip(self, question), fields(mode = ?self.options.mode))]
    pub async fn ask(&self, question: &str) -> Result<AnswerResponse, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let sources = self
            .retrieval
            .retrieve(question, self.options.top_k)
            .await
            .map_err(AnswerError::Retrieval)?;

        let context = join_context(&sources, GUIDELINE_CONTEXT_SEPARATOR);
        let prompt = guideline_answer_prompt(&context, question, self.options.mode);

        let mut request = CompletionRequest::text(prompt, self.options.temperature);
        if self.options.mode == AnswerMode::Structured {
            request = request
                .with_json_schema(StructuredAnswer::SCHEMA_NAME, StructuredAnswer::json_schema());
        }

        let raw = self
            .llm_client
            .complete(&request)
            .await
            .map_err(AnswerError::Completion)?;

        let answer = match self.options.mode {
            AnswerMode::Text => Answer::Text(raw.trim().to_string()),
            AnswerMode::Structured => {
                let parsed = StructuredAnswer::parse(&raw).map_err(|e| {
                    tracing::warn!(error = %e, output_len = raw.len(), "Model output failed schema");
                    AnswerError::MalformedOutput(e)
                })?;
                Answer::Structured(parsed)
            }
        };

        tracing::info!(sources = sources.len(), "Answer generated");
        Ok(AnswerResponse { answer, sources })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("retrieval: {0}")]
    Retrieval(RetrievalError),
    #[error("completion: {0}")]
    Completion(LlmClientError),
    #[error("malformed model output: {0}")]
    MalformedOutput(AnswerParseError),
}

impl AnswerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnswerError::EmptyQuestion => ErrorCategory::Validation,
            AnswerError::Retrieval(e) => e.category(),
            AnswerError::Completion(_) | AnswerError::MalformedOutput(_) => {
                ErrorCategory::Upstream
            }
        }
    }
}
