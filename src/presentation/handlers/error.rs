use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::UploadStoreError;
use crate::application::services::{AnswerError, ErrorCategory, IngestionError, LabReportError};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Handler failure rendered as `{"error", "kind"}` with a status derived from its category.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    category: ErrorCategory,
    message: String,
}

impl ApiError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            status: status_for(category),
            category,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    /// Keeps a status chosen by the framework, e.g. 413 for oversized bodies.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }
}

pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCategory::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = %self.category, error = %self.message, "Request failed");
        } else {
            tracing::warn!(kind = %self.category, error = %self.message, "Request rejected");
        }

        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                kind: self.category.as_str(),
            }),
        )
            .into_response()
    }
}

impl From<AnswerError> for ApiError {
    fn from(e: AnswerError) -> Self {
        Self::new(e.category(), e.to_string())
    }
}

impl From<LabReportError> for ApiError {
    fn from(e: LabReportError) -> Self {
        Self::new(e.category(), e.to_string())
    }
}

impl From<IngestionError> for ApiError {
    fn from(e: IngestionError) -> Self {
        Self::new(e.category(), format!("ingestion failed: {e}"))
    }
}

impl From<UploadStoreError> for ApiError {
    fn from(e: UploadStoreError) -> Self {
        Self::new(ErrorCategory::Upstream, format!("failed to save upload: {e}"))
    }
}
