use async_trait::async_trait;

use super::{CollectionConfig, SearchResult, VectorStoreError};
use crate::domain::{Chunk, Embedding};

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self) -> Result<bool, VectorStoreError>;

    /// Replaces the whole collection with the given chunks.
    async fn rebuild(
        &self,
        config: &CollectionConfig,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError>;

    /// Returns at most `top_k` results, nearest first.
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;
}
