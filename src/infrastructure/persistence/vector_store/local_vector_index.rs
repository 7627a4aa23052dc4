use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::application::ports::{
    CollectionConfig, DistanceMetric, SearchResult, VectorStore, VectorStoreError,
};
use crate::domain::{Chunk, Embedding};

pub const INDEX_FILE_NAME: &str = "index.json";
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub embedding_model: String,
    pub dimensions: usize,
    pub distance_metric: DistanceMetric,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Embedding,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

/// Exact nearest-neighbour index persisted as a single JSON file.
///
/// The file is read on the first query and kept in memory. A failed load is
/// not remembered, so the index becomes usable as soon as ingestion writes
/// it. `rebuild` replaces the file atomically and swaps the cached copy.
pub struct LocalVectorIndex {
    dir: PathBuf,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl LocalVectorIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            snapshot: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    /// Manifest of the loaded index, loading it if needed.
    pub async fn manifest(&self) -> Result<IndexManifest, VectorStoreError> {
        Ok(self.snapshot().await?.manifest.clone())
    }

    async fn snapshot(&self) -> Result<Arc<IndexSnapshot>, VectorStoreError> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut guard = self.snapshot.write().await;
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let dir = self.dir.clone();
        let loaded = tokio::task::spawn_blocking(move || read_snapshot(&dir))
            .await
            .map_err(|e| VectorStoreError::SearchFailed(e.to_string()))??;

        info!(
            path = %self.index_path().display(),
            entries = loaded.entries.len(),
            dimensions = loaded.manifest.dimensions,
            "vector_index_loaded"
        );

        let loaded = Arc::new(loaded);
        *guard = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

fn read_snapshot(dir: &Path) -> Result<IndexSnapshot, VectorStoreError> {
    let path = dir.join(INDEX_FILE_NAME);
    if !dir.is_dir() || !path.is_file() {
        return Err(VectorStoreError::NotFound(dir.display().to_string()));
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| VectorStoreError::Corrupt(format!("{}: {}", path.display(), e)))?;
    let snapshot: IndexSnapshot = serde_json::from_str(&contents)
        .map_err(|e| VectorStoreError::Corrupt(format!("{}: {}", path.display(), e)))?;

    if snapshot.manifest.version != INDEX_FORMAT_VERSION {
        return Err(VectorStoreError::Corrupt(format!(
            "unsupported index version {}",
            snapshot.manifest.version
        )));
    }

    let dimensions = snapshot.manifest.dimensions;
    if let Some(entry) = snapshot
        .entries
        .iter()
        .find(|entry| entry.embedding.dimensions() != dimensions)
    {
        return Err(VectorStoreError::Corrupt(format!(
            "entry {} has {} dimensions, manifest declares {}",
            entry.chunk.id.as_uuid(),
            entry.embedding.dimensions(),
            dimensions
        )));
    }

    Ok(snapshot)
}

fn write_snapshot(dir: &Path, snapshot: &IndexSnapshot) -> Result<(), VectorStoreError> {
    std::fs::create_dir_all(dir).map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))?;
    serde_json::to_writer(&mut file, snapshot)
        .map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))?;
    file.flush()
        .map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))?;
    file.persist(dir.join(INDEX_FILE_NAME))
        .map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))?;

    Ok(())
}

fn score(metric: DistanceMetric, query: &Embedding, candidate: &Embedding) -> f32 {
    match metric {
        DistanceMetric::Cosine => query.cosine_similarity(candidate),
        DistanceMetric::Euclidean => -query.euclidean_distance(candidate),
        DistanceMetric::DotProduct => query.dot_product(candidate),
    }
}

#[async_trait]
impl VectorStore for LocalVectorIndex {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        if self.snapshot.read().await.is_some() {
            return Ok(true);
        }

        tokio::fs::try_exists(self.index_path())
            .await
            .map_err(|e| VectorStoreError::SearchFailed(e.to_string()))
    }

    #[instrument(skip(self, config, chunks, embeddings), fields(dir = %self.dir.display(), count = chunks.len()))]
    async fn rebuild(
        &self,
        config: &CollectionConfig,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorStoreError::RebuildFailed(
                "chunks and embeddings count mismatch".to_string(),
            ));
        }

        if let Some(embedding) = embeddings
            .iter()
            .find(|e| e.dimensions() != config.vector_dimensions)
        {
            return Err(VectorStoreError::DimensionMismatch {
                expected: config.vector_dimensions,
                actual: embedding.dimensions(),
            });
        }

        let snapshot = IndexSnapshot {
            manifest: IndexManifest {
                version: INDEX_FORMAT_VERSION,
                embedding_model: config.embedding_model.clone(),
                dimensions: config.vector_dimensions,
                distance_metric: config.distance_metric,
                created_at: Utc::now(),
            },
            entries: chunks
                .iter()
                .cloned()
                .zip(embeddings.iter().cloned())
                .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
                .collect(),
        };

        let mut guard = self.snapshot.write().await;

        let dir = self.dir.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            write_snapshot(&dir, &snapshot).map(|()| snapshot)
        })
        .await
        .map_err(|e| VectorStoreError::RebuildFailed(e.to_string()))??;

        info!(
            path = %self.index_path().display(),
            entries = snapshot.entries.len(),
            "vector_index_rebuilt"
        );

        *guard = Some(Arc::new(snapshot));
        Ok(())
    }

    #[instrument(skip(self, embedding), fields(dir = %self.dir.display(), top_k))]
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let snapshot = self.snapshot().await?;
        let manifest = &snapshot.manifest;

        if embedding.dimensions() != manifest.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                expected: manifest.dimensions,
                actual: embedding.dimensions(),
            });
        }

        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, score(manifest.distance_metric, embedding, &entry.embedding)))
            .collect();

        // Stable sort keeps insertion order between equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                chunk: snapshot.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}
