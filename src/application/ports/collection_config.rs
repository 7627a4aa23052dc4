use super::DistanceMetric;

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub vector_dimensions: usize,
    pub distance_metric: DistanceMetric,
    pub embedding_model: String,
}

impl CollectionConfig {
    pub fn new(vector_dimensions: usize, embedding_model: impl Into<String>) -> Self {
        Self {
            vector_dimensions,
            distance_metric: DistanceMetric::Cosine,
            embedding_model: embedding_model.into(),
        }
    }

    pub fn with_distance_metric(mut self, distance_metric: DistanceMetric) -> Self {
        self.distance_metric = distance_metric;
        self
    }
}
