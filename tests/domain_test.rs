use caregraph::domain::{
    Answer, AnswerParseError, BiomarkerReport, ContentType, Embedding, StoragePath,
    StructuredAnswer,
};

#[test]
fn given_plain_json_when_parsing_structured_answer_then_returns_fields() {
    let raw = r#"{"disclaimer":"Not advice.","rationale":"Per guideline.","summary":"Rest."}"#;

    let answer = StructuredAnswer::parse(raw).unwrap();

    assert_eq!(answer.disclaimer, "Not advice.");
    assert_eq!(answer.rationale, "Per guideline.");
    assert_eq!(answer.summary, "Rest.");
}

#[test]
fn given_fenced_json_when_parsing_structured_answer_then_strips_fence() {
    let raw = "```json\n{\"disclaimer\":\"d\",\"rationale\":\"r\",\"summary\":\"s\"}\n```";

    let answer = StructuredAnswer::parse(raw).unwrap();

    assert_eq!(answer.summary, "s");
}

#[test]
fn given_json_wrapped_in_prose_when_parsing_structured_answer_then_extracts_object() {
    let raw = "Here you go: {\"disclaimer\":\"d\",\"rationale\":\"r\",\"summary\":\"s\"} Hope it helps.";

    let answer = StructuredAnswer::parse(raw).unwrap();

    assert_eq!(answer.disclaimer, "d");
}

#[test]
fn given_ok_report_field_when_parsing_structured_answer_then_maps_to_summary() {
    let raw = r#"{"disclaimer":"d","rationale":"r","ok_report":"legacy summary"}"#;

    let answer = StructuredAnswer::parse(raw).unwrap();

    assert_eq!(answer.summary, "legacy summary");
}

#[test]
fn given_blank_field_when_parsing_structured_answer_then_rejects() {
    let raw = r#"{"disclaimer":"d","rationale":"   ","summary":"s"}"#;

    let result = StructuredAnswer::parse(raw);

    assert_eq!(result, Err(AnswerParseError::EmptyField("rationale")));
}

#[test]
fn given_non_json_when_parsing_structured_answer_then_reports_invalid_json() {
    let result = StructuredAnswer::parse("I am not sure.");

    assert!(matches!(result, Err(AnswerParseError::InvalidJson(_))));
}

#[test]
fn given_structured_answer_schema_when_inspected_then_requires_three_string_fields() {
    let schema = StructuredAnswer::json_schema();

    assert_eq!(schema["type"], "object");
    assert_eq!(
        schema["required"],
        serde_json::json!(["disclaimer", "rationale", "summary"])
    );
    assert_eq!(schema["additionalProperties"], false);
}

#[test]
fn given_answers_when_serialized_then_text_is_string_and_structured_is_object() {
    let text = serde_json::to_value(Answer::Text("plain".to_string())).unwrap();
    let structured = serde_json::to_value(Answer::Structured(StructuredAnswer {
        disclaimer: "d".to_string(),
        rationale: "r".to_string(),
        summary: "s".to_string(),
    }))
    .unwrap();

    assert_eq!(text, serde_json::json!("plain"));
    assert_eq!(structured["summary"], "s");
}

#[test]
fn given_path_like_filename_when_creating_storage_path_then_keeps_sanitized_base_name() {
    let path = StoragePath::from_filename("../../etc/My Guide (v2).pdf").unwrap();

    assert_eq!(path.as_str(), "My_Guide__v2_.pdf");
}

#[test]
fn given_dot_only_filename_when_creating_storage_path_then_rejects() {
    assert!(StoragePath::from_filename("..").is_none());
    assert!(StoragePath::from_filename("").is_none());
}

#[test]
fn given_same_filename_when_creating_unique_paths_then_they_differ() {
    let first = StoragePath::unique("report.png").unwrap();
    let second = StoragePath::unique("report.png").unwrap();

    assert_ne!(first, second);
    assert!(first.as_str().ends_with("_report.png"));
}

#[test]
fn given_magic_bytes_when_sniffing_content_type_then_detects_pdf_and_image() {
    assert_eq!(ContentType::sniff(b"%PDF-1.7 rest"), Some(ContentType::Pdf));
    assert_eq!(
        ContentType::sniff(b"\x89PNG\r\n\x1a\nrest"),
        Some(ContentType::Image)
    );
    assert_eq!(ContentType::sniff(b"plain text"), None);
}

#[test]
fn given_identical_vectors_when_computing_cosine_similarity_then_returns_one() {
    let a = Embedding::new(vec![1.0, 2.0, 3.0]);

    assert!((a.cosine_similarity(&a) - 1.0).abs() < 1e-6);
}

#[test]
fn given_mismatched_dimensions_when_comparing_embeddings_then_returns_neutral_values() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![1.0, 0.0, 0.0]);

    assert_eq!(a.cosine_similarity(&b), 0.0);
    assert_eq!(a.euclidean_distance(&b), f32::INFINITY);
}

#[test]
fn given_whitespace_report_when_checking_biomarkers_then_is_blank() {
    assert!(BiomarkerReport::new("  \n ".to_string()).is_blank());
    assert!(!BiomarkerReport::new("Glucose: 90 mg/dL".to_string()).is_blank());
}

#[test]
fn given_name_without_pdf_extension_when_building_pdf_path_then_appends_it() {
    assert_eq!(StoragePath::pdf_from_filename("guideline").unwrap().as_str(), "guideline.pdf");
    assert_eq!(StoragePath::pdf_from_filename("Notes.PDF").unwrap().as_str(), "Notes.PDF");
    assert_eq!(
        StoragePath::pdf_from_filename("report.txt").unwrap().as_str(),
        "report.txt.pdf"
    );
    assert!(StoragePath::pdf_from_filename("..").is_none());
}
