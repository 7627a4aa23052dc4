mod common;

use caregraph::application::ports::{
    CollectionConfig, DistanceMetric, VectorStore, VectorStoreError,
};
use caregraph::domain::{Chunk, DocumentId, Embedding};
use caregraph::infrastructure::persistence::{INDEX_FILE_NAME, LocalVectorIndex};

fn chunk(text: &str) -> Chunk {
    Chunk::new(text.to_string(), DocumentId::new(), "doc.pdf".to_string(), Some(1), 0)
}

#[tokio::test]
async fn given_missing_directory_when_searching_then_returns_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let index = LocalVectorIndex::new(dir.path().join("medical_db"));

    let result = index.search(&Embedding::new(vec![1.0, 0.0]), 3).await;

    assert!(matches!(result, Err(VectorStoreError::NotFound(_))));
    assert!(!index.collection_exists().await.unwrap());
}

#[tokio::test]
async fn given_rebuilt_index_when_searching_then_returns_nearest_first() {
    let dir = tempfile::tempdir().unwrap();
    let index = LocalVectorIndex::new(dir.path());
    let chunks = vec![chunk("east"), chunk("north"), chunk("north-east")];
    let embeddings = vec![
        Embedding::new(vec![1.0, 0.0]),
        Embedding::new(vec![0.0, 1.0]),
        Embedding::new(vec![0.7, 0.7]),
    ];

    index
        .rebuild(&CollectionConfig::new(2, "test-model"), &chunks, &embeddings)
        .await
        .unwrap();
    let results = index.search(&Embedding::new(vec![0.1, 1.0]), 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.text, "north");
    assert_eq!(results[1].chunk.text, "north-east");
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn given_equal_scores_when_searching_then_keeps_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let index = LocalVectorIndex::new(dir.path());
    let chunks = vec![chunk("first"), chunk("second"), chunk("third")];
    let embeddings = vec![Embedding::new(vec![1.0, 0.0]); 3];

    index
        .rebuild(&CollectionConfig::new(2, "test-model"), &chunks, &embeddings)
        .await
        .unwrap();
    let results = index.search(&Embedding::new(vec![1.0, 0.0]), 3).await.unwrap();

    let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn given_top_k_larger_than_index_when_searching_then_returns_all_entries() {
    let dir = tempfile::tempdir().unwrap();
    let index = common::seeded_index(dir.path()).await;

    let results = index
        .search(&Embedding::new(vec![1.0; common::EMBEDDING_DIMENSIONS]), 50)
        .await
        .unwrap();

    assert_eq!(results.len(), common::GUIDELINES.len());
}

#[tokio::test]
async fn given_query_with_wrong_dimensions_when_searching_then_reports_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let index = common::seeded_index(dir.path()).await;

    let result = index.search(&Embedding::new(vec![1.0, 2.0, 3.0]), 3).await;

    assert!(matches!(
        result,
        Err(VectorStoreError::DimensionMismatch {
            expected: common::EMBEDDING_DIMENSIONS,
            actual: 3
        })
    ));
}

#[tokio::test]
async fn given_persisted_index_when_opened_by_new_instance_then_loads_manifest_and_entries() {
    let dir = tempfile::tempdir().unwrap();
    common::seeded_index(dir.path()).await;

    let reopened = LocalVectorIndex::new(dir.path());
    let manifest = reopened.manifest().await.unwrap();
    let results = reopened
        .search(&Embedding::new(vec![1.0; common::EMBEDDING_DIMENSIONS]), 1)
        .await
        .unwrap();

    assert!(dir.path().join(INDEX_FILE_NAME).is_file());
    assert_eq!(manifest.dimensions, common::EMBEDDING_DIMENSIONS);
    assert_eq!(manifest.embedding_model, "mock-bag-of-words");
    assert_eq!(manifest.distance_metric, DistanceMetric::Cosine);
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn given_index_created_after_failed_load_when_searching_again_then_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let reader = LocalVectorIndex::new(dir.path());
    assert!(reader.search(&Embedding::new(vec![1.0; 2]), 1).await.is_err());

    let writer = LocalVectorIndex::new(dir.path());
    writer
        .rebuild(
            &CollectionConfig::new(2, "test-model"),
            &[chunk("late")],
            &[Embedding::new(vec![1.0, 0.0])],
        )
        .await
        .unwrap();

    let results = reader.search(&Embedding::new(vec![1.0, 0.0]), 1).await.unwrap();
    assert_eq!(results[0].chunk.text, "late");
}

#[tokio::test]
async fn given_rebuild_when_searching_same_instance_then_sees_new_entries_only() {
    let dir = tempfile::tempdir().unwrap();
    let index = common::seeded_index(dir.path()).await;

    index
        .rebuild(
            &CollectionConfig::new(2, "test-model"),
            &[chunk("replacement")],
            &[Embedding::new(vec![0.0, 1.0])],
        )
        .await
        .unwrap();

    let results = index.search(&Embedding::new(vec![0.0, 1.0]), 10).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.text, "replacement");
}

#[tokio::test]
async fn given_euclidean_metric_when_searching_then_closest_point_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    let index = LocalVectorIndex::new(dir.path());
    let config =
        CollectionConfig::new(2, "test-model").with_distance_metric(DistanceMetric::Euclidean);

    index
        .rebuild(
            &config,
            &[chunk("far"), chunk("near")],
            &[Embedding::new(vec![10.0, 10.0]), Embedding::new(vec![1.0, 1.0])],
        )
        .await
        .unwrap();
    let results = index.search(&Embedding::new(vec![0.0, 0.0]), 2).await.unwrap();

    assert_eq!(results[0].chunk.text, "near");
}

#[tokio::test]
async fn given_embedding_with_wrong_dimensions_when_rebuilding_then_rejects_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let index = LocalVectorIndex::new(dir.path());

    let result = index
        .rebuild(
            &CollectionConfig::new(2, "test-model"),
            &[chunk("bad")],
            &[Embedding::new(vec![1.0, 0.0, 0.0])],
        )
        .await;

    assert!(matches!(result, Err(VectorStoreError::DimensionMismatch { .. })));
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
}

#[tokio::test]
async fn given_corrupt_index_file_when_searching_then_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(INDEX_FILE_NAME), "{not json").unwrap();
    let index = LocalVectorIndex::new(dir.path());

    let result = index.search(&Embedding::new(vec![1.0]), 1).await;

    assert!(matches!(result, Err(VectorStoreError::Corrupt(_))));
}
