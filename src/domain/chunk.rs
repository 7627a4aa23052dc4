use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded span of source text; the retrieval unit stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub document_id: DocumentId,
    pub source: String,
    pub page: Option<u32>,
    pub offset: usize,
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(ChunkId);
uuid_id!(
    /// Identifies one ingested file; every chunk cut from it carries the same id.
    DocumentId
);

impl Chunk {
    pub fn new(
        text: String,
        document_id: DocumentId,
        source: String,
        page: Option<u32>,
        offset: usize,
    ) -> Self {
        Self {
            id: ChunkId::new(),
            text,
            document_id,
            source,
            page,
            offset,
        }
    }
}
