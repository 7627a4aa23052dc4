mod local_vector_index;

pub use local_vector_index::{
    INDEX_FILE_NAME, INDEX_FORMAT_VERSION, IndexManifest, LocalVectorIndex,
};
