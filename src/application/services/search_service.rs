use std::sync::Arc;
use tracing::info;

use crate::application::services::embedding_service::EmbeddingService;
use crate::domain::entities::VectorMatch;
use crate::domain::repositories::VectorRepository;

#[derive(Debug)]
pub enum SearchServiceError {
    EmbeddingError(String),
    RepositoryError(String),
}

impl std::fmt::Display for SearchServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchServiceError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            SearchServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for SearchServiceError {}

pub struct SearchService {
    embedding_service: Arc<EmbeddingService>,
    vector_repository: Arc<dyn VectorRepository>,
}

impl SearchService {
    pub fn new(
        embedding_service: Arc<EmbeddingService>,
        vector_repository: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            embedding_service,
            vector_repository,
        }
    }

    /// Nearest chunks to `query`, best first. Chunks with blank text are dropped.
    pub async fn search_similar_text(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, SearchServiceError> {
        let query_vector = self
            .embedding_service
            .embed_query(query)
            .await
            .map_err(|e| SearchServiceError::EmbeddingError(e.to_string()))?;

        let mut matches = self
            .vector_repository
            .similarity_search(&query_vector, top_k)
            .await
            .map_err(|e| SearchServiceError::RepositoryError(e.to_string()))?;

        matches.retain(|m| !m.text.trim().is_empty());
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));

        info!("Found {} similar text chunks for query", matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{InMemoryVectorRepository, MockEmbeddingProvider};

    #[tokio::test]
    async fn test_search_returns_closest_first() {
        let repository = Arc::new(InMemoryVectorRepository::default());
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(8)),
            repository.clone(),
        ));
        embeddings
            .store_document(
                &["Registration opens at 8am in the lobby.".to_string()],
                "agenda.pdf",
                0,
            )
            .await
            .unwrap();

        let service = SearchService::new(embeddings, repository);
        let matches = service
            .search_similar_text("Registration opens at 8am in the lobby.", 5)
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].filename, "agenda.pdf");
        assert!(matches[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(8)),
            Arc::new(InMemoryVectorRepository::default()),
        ));
        let service = SearchService::new(embeddings, Arc::new(InMemoryVectorRepository::failing()));

        let result = service.search_similar_text("anything", 5).await;
        assert!(matches!(result, Err(SearchServiceError::RepositoryError(_))));
    }
}
