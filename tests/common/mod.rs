#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use caregraph::application::ports::{CollectionConfig, Embedder, VectorStore};
use caregraph::application::services::RetrievalService;
use caregraph::domain::{Chunk, DocumentId};
use caregraph::infrastructure::llm::MockEmbedder;
use caregraph::infrastructure::persistence::LocalVectorIndex;

pub const EMBEDDING_DIMENSIONS: usize = 64;

pub const STRUCTURED_REPLY: &str = r#"```json
{
  "disclaimer": "This is not medical advice. Consult a clinician.",
  "rationale": "The guideline recommends metformin as first-line therapy.",
  "summary": "Start metformin unless contraindicated."
}
```"#;

/// PNG signature followed by filler; enough for format sniffing.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-image-body";

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\nMetformin is first-line therapy for type 2 diabetes.";

pub const GUIDELINES: [&str; 5] = [
    "Metformin is the first-line therapy for type 2 diabetes in adults.",
    "Hemoglobin below 12 g/dL in women indicates anemia and warrants iron studies.",
    "Hypertension is diagnosed when blood pressure exceeds 130 over 80 mmHg.",
    "LDL cholesterol above 190 mg/dL warrants high-intensity statin therapy.",
    "Vitamin D deficiency is defined as serum levels below 20 ng/mL.",
];

pub fn mock_embedder() -> Arc<MockEmbedder> {
    Arc::new(MockEmbedder::new(EMBEDDING_DIMENSIONS))
}

pub fn guideline_chunks() -> Vec<Chunk> {
    let document_id = DocumentId::new();
    GUIDELINES
        .iter()
        .enumerate()
        .map(|(i, text)| {
            Chunk::new(
                text.to_string(),
                document_id,
                "guidelines.pdf".to_string(),
                Some(i as u32 + 1),
                0,
            )
        })
        .collect()
}

/// Writes the guideline chunks into an index under `dir`.
pub async fn seeded_index(dir: &Path) -> Arc<LocalVectorIndex> {
    let embedder = mock_embedder();
    let chunks = guideline_chunks();
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await.unwrap();

    let index = Arc::new(LocalVectorIndex::new(dir));
    index
        .rebuild(
            &CollectionConfig::new(EMBEDDING_DIMENSIONS, embedder.model_name()),
            &chunks,
            &embeddings,
        )
        .await
        .unwrap();
    index
}

pub fn retrieval_over(index: Arc<LocalVectorIndex>) -> Arc<RetrievalService> {
    Arc::new(RetrievalService::new(mock_embedder(), index))
}
