use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{UploadStore, UploadStoreError};
use crate::domain::StoragePath;

/// Writes uploads as plain files under a base directory.
pub struct LocalUploadStore {
    base_path: PathBuf,
    inner: Arc<LocalFileSystem>,
}

impl LocalUploadStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, UploadStoreError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        let fs = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| UploadStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            base_path,
            inner: Arc::new(fs),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait::async_trait]
impl UploadStore for LocalUploadStore {
    #[tracing::instrument(skip(self, data), fields(base = %self.base_path.display(), path = %path, size = data.len()))]
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, UploadStoreError> {
        let store_path = StorePath::from(path.as_str());
        let size = data.len() as u64;

        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| UploadStoreError::UploadFailed(e.to_string()))?;

        tracing::info!("upload_stored");
        Ok(size)
    }
}
