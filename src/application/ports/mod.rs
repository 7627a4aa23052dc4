mod collection_config;
mod distance_metric;
mod embedder;
mod file_loader;
mod llm_client;
mod search_result;
mod text_splitter;
mod upload_store;
mod vector_store;
mod vector_store_error;

pub use collection_config::CollectionConfig;
pub use distance_metric::DistanceMetric;
pub use embedder::{Embedder, EmbedderError};
pub use file_loader::{FileLoader, FileLoaderError};
pub use llm_client::{CompletionRequest, ImageInput, LlmClient, LlmClientError, ResponseFormat};
pub use search_result::SearchResult;
pub use text_splitter::{TextSplitter, TextSplitterError};
pub use upload_store::{UploadStore, UploadStoreError};
pub use vector_store::VectorStore;
pub use vector_store_error::VectorStoreError;
