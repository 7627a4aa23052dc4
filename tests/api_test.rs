mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use caregraph::application::services::{
    AnswerOptions, AnswerService, IngestionOptions, IngestionService, LabReportOptions,
    LabReportService,
};
use caregraph::infrastructure::llm::MockLlmClient;
use caregraph::infrastructure::persistence::LocalVectorIndex;
use caregraph::infrastructure::storage::LocalUploadStore;
use caregraph::infrastructure::text_processing::{MockFileLoader, RecursiveCharacterSplitter};
use caregraph::presentation::{AppState, create_router};

const BOUNDARY: &str = "caregraph-test-boundary";
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

struct TestApp {
    state: AppState,
    llm: Arc<MockLlmClient>,
    root: tempfile::TempDir,
}

impl TestApp {
    async fn seeded() -> Self {
        Self::build(true).await
    }

    async fn empty() -> Self {
        Self::build(false).await
    }

    async fn build(seed_index: bool) -> Self {
        let root = tempfile::tempdir().unwrap();
        let index_dir = root.path().join("medical_db");

        let index = if seed_index {
            common::seeded_index(&index_dir).await
        } else {
            Arc::new(LocalVectorIndex::new(&index_dir))
        };

        let retrieval = common::retrieval_over(Arc::clone(&index));
        let llm = Arc::new(MockLlmClient::replying(common::STRUCTURED_REPLY));

        let answer_service =
            AnswerService::new(Arc::clone(&retrieval), llm.clone(), AnswerOptions::default());
        let lab_report_service = LabReportService::new(
            Arc::clone(&retrieval),
            llm.clone(),
            llm.clone(),
            LabReportOptions::default(),
        );
        let ingestion_service = IngestionService::new(
            Arc::new(MockFileLoader),
            common::mock_embedder(),
            index,
            Arc::new(RecursiveCharacterSplitter::default()),
            IngestionOptions::default(),
        );

        let corpus_dir = root.path().join("data");
        let state = AppState {
            retrieval_service: retrieval,
            answer_service: Arc::new(answer_service),
            lab_report_service: Arc::new(lab_report_service),
            ingestion_service: Arc::new(ingestion_service),
            corpus_store: Arc::new(LocalUploadStore::new(&corpus_dir).unwrap()),
            image_store: Arc::new(LocalUploadStore::new(root.path().join("uploads")).unwrap()),
            corpus_dir,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };

        Self { state, llm, root }
    }

    fn corpus_dir(&self) -> PathBuf {
        self.state.corpus_dir.clone()
    }

    fn uploads_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

fn ask_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (field, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn given_seeded_index_when_checking_health_then_reports_ready() {
    let app = TestApp::seeded().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["index_ready"], true);
}

#[tokio::test]
async fn given_no_index_when_checking_health_then_reports_not_ready() {
    let app = TestApp::empty().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index_ready"], false);
}

#[tokio::test]
async fn given_question_when_asking_then_returns_structured_answer_with_sources() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(ask_request(r#"{"question":"First-line therapy for type 2 diabetes?"}"#))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"]["summary"], "Start metformin unless contraindicated.");
    assert!(body["answer"]["disclaimer"].is_string());
    assert_eq!(body["sources"].as_array().unwrap().len(), 3);
    assert_eq!(body["sources"][0]["source"], "guidelines.pdf");
}

#[tokio::test]
async fn given_blank_question_when_asking_then_returns_bad_request() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(ask_request(r#"{"question":"   "}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn given_malformed_json_when_asking_then_returns_bad_request() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(ask_request("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn given_no_index_when_asking_then_returns_not_found() {
    let app = TestApp::empty().await;

    let (status, body) = app.send(ask_request(r#"{"question":"anemia?"}"#)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn given_pdf_upload_when_posting_then_saves_and_reindexes_corpus() {
    let app = TestApp::empty().await;

    let (status, body) = app
        .send(upload_request(&[("pdfs", "new guideline.pdf", common::PDF_BYTES)]))
        .await;

    assert_eq!(status, StatusCode::OK);
    let message = body["status"].as_str().unwrap();
    assert!(message.starts_with("Uploaded 1 PDF(s). Indexed 1 file(s)"));
    assert!(body.get("summary").is_none());
    assert!(app.corpus_dir().join("new_guideline.pdf").is_file());

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, health) = app.send(health).await;
    assert_eq!(health["index_ready"], true);
}

#[tokio::test]
async fn given_pdf_upload_without_extension_when_posting_then_saves_as_pdf_and_indexes_it() {
    let app = TestApp::empty().await;

    let (status, body) = app
        .send(upload_request(&[("pdfs", "guideline", common::PDF_BYTES)]))
        .await;

    assert_eq!(status, StatusCode::OK);
    let message = body["status"].as_str().unwrap();
    assert!(message.starts_with("Uploaded 1 PDF(s). Indexed 1 file(s)"));
    assert!(app.corpus_dir().join("guideline.pdf").is_file());
    assert!(!app.corpus_dir().join("guideline").exists());
}

#[tokio::test]
async fn given_image_upload_when_posting_then_returns_lab_report_analysis() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(upload_request(&[("image", "labs.png", common::PNG_BYTES)]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("status").is_none());
    assert_eq!(body["summary"], "Start metformin unless contraindicated.");
    assert!(body["biomarkers"].is_string());
    assert_eq!(body["sources"].as_array().unwrap().len(), 4);
    assert_eq!(file_count(&app.uploads_dir()), 1);
}

#[tokio::test]
async fn given_non_pdf_in_pdf_field_when_posting_then_rejects_without_writing() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(upload_request(&[
            ("pdfs", "good.pdf", common::PDF_BYTES),
            ("pdfs", "notes.txt", b"plain text"),
        ]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(file_count(&app.corpus_dir()), 0);
}

#[tokio::test]
async fn given_pdf_in_image_field_when_posting_then_rejects() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(upload_request(&[("image", "report.pdf", common::PDF_BYTES)]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(file_count(&app.uploads_dir()), 0);
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn given_empty_file_inputs_when_posting_then_rejects_as_no_files() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(upload_request(&[("pdfs", "", b""), ("image", "", b"")]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no files uploaded");
}

#[tokio::test]
async fn given_root_path_when_requested_then_serves_html_page() {
    let app = TestApp::empty().await;

    let response = create_router(app.state.clone())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("CareGraph"));
}

#[tokio::test]
async fn given_request_id_header_when_requesting_then_echoes_it() {
    let app = TestApp::empty().await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = create_router(app.state.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn given_no_request_id_header_when_requesting_then_mints_one() {
    let app = TestApp::empty().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = create_router(app.state.clone()).oneshot(request).await.unwrap();

    let minted = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(minted).is_ok());
}
