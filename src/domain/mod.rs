mod answer;
mod biomarker_report;
mod chunk;
mod document;
mod embedding;
mod page_text;
mod storage_path;

pub use answer::{Answer, AnswerParseError, StructuredAnswer};
pub use biomarker_report::BiomarkerReport;
pub use chunk::{Chunk, ChunkId, DocumentId};
pub use document::{ContentType, Document};
pub use embedding::Embedding;
pub use page_text::PageText;
pub use storage_path::StoragePath;
