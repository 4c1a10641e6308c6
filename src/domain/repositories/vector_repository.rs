use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::{VectorMatch, VectorRecord};

#[derive(Debug)]
pub enum VectorRepositoryError {
    ConnectionError(String),
    DatabaseError(String),
    ApiError(String),
    ValidationError(String),
}

impl std::fmt::Display for VectorRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorRepositoryError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            VectorRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            VectorRepositoryError::ApiError(msg) => write!(f, "API error: {}", msg),
            VectorRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for VectorRepositoryError {}

#[derive(Debug, Clone)]
pub struct VectorStoreStats {
    pub index_name: String,
    pub index_exists: bool,
    pub vector_count: i64,
}

#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Returns how many records were written.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorRepositoryError>;

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorRepositoryError>;

    /// Returns how many records were removed.
    async fn delete_all(&self) -> Result<i64, VectorRepositoryError>;

    async fn stats(&self) -> Result<VectorStoreStats, VectorRepositoryError>;

    fn index_name(&self) -> String;
}
