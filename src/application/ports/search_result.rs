use crate::domain::Chunk;

/// A retrieved chunk. Higher `score` means closer to the query, whatever the metric.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
