#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("index not found at {0}; run ingestion first")]
    NotFound(String),
    #[error("index is corrupt: {0}")]
    Corrupt(String),
    #[error("dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("rebuild failed: {0}")]
    RebuildFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
}
