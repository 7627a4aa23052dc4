mod vector_store;

pub use vector_store::{INDEX_FILE_NAME, INDEX_FORMAT_VERSION, IndexManifest, LocalVectorIndex};
