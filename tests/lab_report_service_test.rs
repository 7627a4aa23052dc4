mod common;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose;

use caregraph::application::services::{
    ErrorCategory, LabReportError, LabReportOptions, LabReportService,
};
use caregraph::infrastructure::llm::MockLlmClient;

const BIOMARKERS: &str = "Hemoglobin: 10.1 g/dL (12.0-15.5)\nLDL cholesterol: 210 mg/dL";

struct Fixture {
    service: LabReportService,
    vision: Arc<MockLlmClient>,
    reasoning: Arc<MockLlmClient>,
    _dir: tempfile::TempDir,
}

async fn fixture(vision_reply: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let index = common::seeded_index(dir.path()).await;
    let vision = Arc::new(MockLlmClient::replying(vision_reply));
    let reasoning = Arc::new(MockLlmClient::replying(common::STRUCTURED_REPLY));

    let service = LabReportService::new(
        common::retrieval_over(index),
        Arc::clone(&vision) as Arc<_>,
        Arc::clone(&reasoning) as Arc<_>,
        LabReportOptions::default(),
    );

    Fixture {
        service,
        vision,
        reasoning,
        _dir: dir,
    }
}

#[tokio::test]
async fn given_png_when_extracting_biomarkers_then_sends_base64_image_and_returns_raw_text() {
    let fixture = fixture(BIOMARKERS).await;

    let report = fixture
        .service
        .extract_biomarkers(common::PNG_BYTES)
        .await
        .unwrap();

    assert_eq!(report.as_str(), BIOMARKERS);
    let requests = fixture.vision.requests();
    assert_eq!(requests.len(), 1);
    let image = &requests[0].images[0];
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(
        image.base64_data,
        general_purpose::STANDARD.encode(common::PNG_BYTES)
    );
    assert!((requests[0].temperature - 0.1).abs() < f32::EPSILON);
    assert!(requests[0].prompt.contains("biomarker"));
}

#[tokio::test]
async fn given_empty_bytes_when_extracting_biomarkers_then_rejects() {
    let fixture = fixture(BIOMARKERS).await;

    let error = fixture.service.extract_biomarkers(&[]).await.unwrap_err();

    assert!(matches!(error, LabReportError::EmptyImage));
    assert_eq!(error.category(), ErrorCategory::Validation);
    assert!(fixture.vision.requests().is_empty());
}

#[tokio::test]
async fn given_pdf_bytes_when_extracting_biomarkers_then_rejects_as_not_an_image() {
    let fixture = fixture(BIOMARKERS).await;

    let error = fixture
        .service
        .extract_biomarkers(common::PDF_BYTES)
        .await
        .unwrap_err();

    assert!(matches!(error, LabReportError::NotAnImage));
}

#[tokio::test]
async fn given_lab_image_when_analyzing_then_reasons_over_biomarkers_and_guidelines() {
    let fixture = fixture(BIOMARKERS).await;

    let analysis = fixture.service.analyze(common::PNG_BYTES).await.unwrap();

    assert_eq!(analysis.biomarkers.as_str(), BIOMARKERS);
    assert_eq!(analysis.answer.summary, "Start metformin unless contraindicated.");
    assert_eq!(analysis.sources.len(), 4);

    let requests = fixture.reasoning.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains(BIOMARKERS));
    assert!(prompt.contains("\n\n---\n\n"));
    assert!(prompt.contains(&analysis.sources[0].text));
    assert!((requests[0].temperature - 0.2).abs() < f32::EPSILON);
    assert!(requests[0].images.is_empty());
}

#[tokio::test]
async fn given_analysis_when_serialized_then_flattens_answer_fields() {
    let fixture = fixture(BIOMARKERS).await;

    let analysis = fixture.service.analyze(common::PNG_BYTES).await.unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    assert!(json["disclaimer"].is_string());
    assert!(json["rationale"].is_string());
    assert!(json["summary"].is_string());
    assert_eq!(json["biomarkers"], BIOMARKERS);
    assert!(json["sources"].is_array());
}

#[tokio::test]
async fn given_blank_vision_output_when_analyzing_then_reports_no_biomarkers() {
    let fixture = fixture("   ").await;

    let error = fixture.service.analyze(common::PNG_BYTES).await.unwrap_err();

    assert!(matches!(error, LabReportError::NoBiomarkers));
    assert!(fixture.reasoning.requests().is_empty());
}
