use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::application::services::SourceExcerpt;
use crate::domain::Answer;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::ApiError;

#[derive(Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: Answer,
    pub sources: Vec<SourceExcerpt>,
}

#[tracing::instrument(skip(state, payload))]
pub async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::validation(format!("invalid request body: {}", e.body_text())))?;

    if request.question.trim().is_empty() {
        return Err(ApiError::validation("question must not be empty"));
    }

    tracing::debug!(question = %sanitize_prompt(&request.question), "Processing question");

    let response = state.answer_service.ask(&request.question).await?;

    tracing::info!(sources_count = response.sources.len(), "Question answered");
    Ok(Json(AskResponse {
        answer: response.answer,
        sources: response.sources.into_iter().map(SourceExcerpt::from).collect(),
    }))
}
