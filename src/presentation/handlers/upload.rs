use axum::Json;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use serde::Serialize;

use crate::application::services::LabReportAnalysis;
use crate::domain::{ContentType, StoragePath};
use crate::presentation::state::AppState;

use super::ApiError;

pub const PDF_FIELDS: [&str; 3] = ["pdfs", "pdf", "files"];
pub const IMAGE_FIELD: &str = "image";

#[derive(Serialize)]
pub struct UploadResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub analysis: Option<LabReportAnalysis>,
}

struct UploadedFile {
    path: StoragePath,
    data: Bytes,
}

#[derive(Default)]
struct UploadBatch {
    pdfs: Vec<UploadedFile>,
    image: Option<UploadedFile>,
}

/// Accepts guideline PDFs and/or one lab-report image.
///
/// Every part is read and type-checked before anything touches the disk, so a
/// rejected request leaves `data/` and `uploads/` unchanged. PDFs trigger a
/// full re-ingestion of the corpus; an image is analysed after that, against
/// the refreshed index.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let batch = read_batch(multipart).await?;

    if batch.pdfs.is_empty() && batch.image.is_none() {
        return Err(ApiError::validation("no files uploaded"));
    }

    let mut status = None;

    if !batch.pdfs.is_empty() {
        for pdf in &batch.pdfs {
            state
                .corpus_store
                .store(&pdf.path, pdf.data.clone())
                .await?;
        }
        tracing::info!(count = batch.pdfs.len(), "PDFs saved, re-ingesting corpus");

        let report = state
            .ingestion_service
            .ingest_directory(&state.corpus_dir)
            .await?;

        status = Some(format!(
            "Uploaded {} PDF(s). Indexed {} file(s) into {} chunks.",
            batch.pdfs.len(),
            report.files_indexed.len(),
            report.chunk_count
        ));
    }

    let analysis = match batch.image {
        Some(image) => {
            state
                .image_store
                .store(&image.path, image.data.clone())
                .await?;
            tracing::info!(path = %image.path, "Image saved, analysing lab report");
            Some(state.lab_report_service.analyze(&image.data).await?)
        }
        None => None,
    };

    Ok(Json(UploadResponse { status, analysis }))
}

async fn read_batch(mut multipart: Multipart) -> Result<UploadBatch, ApiError> {
    let mut batch = UploadBatch::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(
                    ApiError::validation(format!("failed to read multipart: {}", e.body_text()))
                        .with_status(e.status()),
                );
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();

        let is_pdf_field = PDF_FIELDS.contains(&name.as_str());
        if !is_pdf_field && name != IMAGE_FIELD {
            tracing::debug!(field = %name, "Ignoring unknown multipart field");
            continue;
        }

        let data = field.bytes().await.map_err(|e| {
            ApiError::validation(format!("failed to read file: {}", e.body_text()))
                .with_status(e.status())
        })?;

        // Browsers send an empty part for an untouched file input.
        if data.is_empty() && filename.is_empty() {
            continue;
        }

        let display_name: &str = if filename.is_empty() { "unnamed" } else { &filename };

        if is_pdf_field {
            if ContentType::sniff(&data) != Some(ContentType::Pdf) {
                return Err(ApiError::validation(format!(
                    "only PDF files are accepted in field `{name}`: {display_name}"
                )));
            }
            let path = StoragePath::pdf_from_filename(&filename).ok_or_else(|| {
                ApiError::validation(format!("invalid file name: {display_name}"))
            })?;
            batch.pdfs.push(UploadedFile { path, data });
        } else {
            if ContentType::sniff(&data) != Some(ContentType::Image) {
                return Err(ApiError::validation(format!(
                    "field `{IMAGE_FIELD}` must be an image: {display_name}"
                )));
            }
            if batch.image.is_some() {
                return Err(ApiError::validation("only one image can be analysed per request"));
            }
            let path = StoragePath::unique(if filename.is_empty() { "image" } else { &filename })
                .ok_or_else(|| ApiError::validation(format!("invalid file name: {display_name}")))?;
            batch.image = Some(UploadedFile { path, data });
        }
    }

    Ok(batch)
}
