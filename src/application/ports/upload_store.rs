use bytes::Bytes;

use crate::domain::StoragePath;

#[async_trait::async_trait]
pub trait UploadStore: Send + Sync {
    /// Writes the object, replacing any existing one at the same path. Returns bytes written.
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, UploadStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
