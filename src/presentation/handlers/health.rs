use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub index_ready: bool,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let index_ready = match state.retrieval_service.index_ready().await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::warn!(error = %e, "Index readiness check failed");
            false
        }
    };

    Json(HealthResponse {
        status: "ok",
        index_ready,
    })
}
