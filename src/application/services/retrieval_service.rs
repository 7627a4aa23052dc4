use std::sync::Arc;

use crate::application::ports::{
    Embedder, EmbedderError, SearchResult, VectorStore, VectorStoreError,
};

use super::ErrorCategory;

pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl RetrievalService {
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
        }
    }

    /// Returns the `top_k` chunks nearest to `query`, nearest first.
    #[tracing::instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;

        let results = self
            .vector_store
            .search(&query_embedding, top_k)
            .await
            .map_err(RetrievalError::Search)?;

        tracing::debug!(results = results.len(), "Retrieved context chunks");
        Ok(results)
    }

    pub async fn index_ready(&self) -> Result<bool, RetrievalError> {
        self.vector_store
            .collection_exists()
            .await
            .map_err(RetrievalError::Search)
    }
}

/// Concatenates chunk texts in rank order.
pub fn join_context(results: &[SearchResult], separator: &str) -> String {
    results
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("search: {0}")]
    Search(#[from] VectorStoreError),
}

impl RetrievalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RetrievalError::EmptyQuery => ErrorCategory::Validation,
            RetrievalError::Embedding(EmbedderError::ModelLoadFailed(_)) => ErrorCategory::Config,
            RetrievalError::Embedding(_) => ErrorCategory::Upstream,
            RetrievalError::Search(VectorStoreError::NotFound(_)) => ErrorCategory::NotFound,
            RetrievalError::Search(
                VectorStoreError::DimensionMismatch { .. } | VectorStoreError::Corrupt(_),
            ) => ErrorCategory::Config,
            RetrievalError::Search(_) => ErrorCategory::Upstream,
        }
    }
}
