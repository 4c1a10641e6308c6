use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::agents::RagAgent;
use crate::domain::repositories::TableRepository;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceHealth {
    pub gemini_api: bool,
    pub vector_store_connection: bool,
    pub embeddings: bool,
    pub vector_store: bool,
    pub database: bool,
    pub overall_health: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub health: ServiceHealth,
    pub healthy: bool,
}

pub struct HealthCheckUseCase {
    rag_agent: Arc<RagAgent>,
    table_repository: Arc<dyn TableRepository>,
}

impl HealthCheckUseCase {
    pub fn new(rag_agent: Arc<RagAgent>, table_repository: Arc<dyn TableRepository>) -> Self {
        Self {
            rag_agent,
            table_repository,
        }
    }

    pub async fn execute(&self) -> HealthCheckResponse {
        let (rag, database) = futures::join!(
            self.rag_agent.health_check(),
            self.table_repository.health_check(),
        );
        let database = match database {
            Ok(ok) => ok,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        };

        let health = ServiceHealth {
            gemini_api: rag.gemini_api,
            vector_store_connection: rag.vector_store_connection,
            embeddings: rag.embeddings,
            vector_store: rag.vector_store,
            database,
            overall_health: rag.overall_health && database,
        };
        info!("Service health: {}", health.overall_health);

        HealthCheckResponse {
            status: "success",
            healthy: health.overall_health,
            health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{EmbeddingService, SearchService};
    use crate::application::testing::{
        InMemoryTableRepository, InMemoryVectorRepository, MockEmbeddingProvider,
        MockLanguageModel,
    };

    fn rag_agent(llm: MockLanguageModel) -> Arc<RagAgent> {
        let vectors = Arc::new(InMemoryVectorRepository::default());
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            vectors.clone(),
        ));
        let search = Arc::new(SearchService::new(embeddings.clone(), vectors.clone()));
        Arc::new(RagAgent::new(Arc::new(llm), search, embeddings, vectors))
    }

    #[tokio::test]
    async fn test_all_components_healthy() {
        let response = HealthCheckUseCase::new(
            rag_agent(MockLanguageModel::with_replies(vec![])),
            Arc::new(InMemoryTableRepository::default()),
        )
        .execute()
        .await;

        assert!(response.healthy);
        assert_eq!(response.status, "success");
        assert!(response.health.database);
    }

    #[tokio::test]
    async fn test_any_failure_is_unhealthy() {
        let response = HealthCheckUseCase::new(
            rag_agent(MockLanguageModel::with_replies(vec![])),
            Arc::new(InMemoryTableRepository::failing()),
        )
        .execute()
        .await;
        assert!(!response.healthy);
        assert_eq!(response.status, "success");

        let response = HealthCheckUseCase::new(
            rag_agent(MockLanguageModel::failing()),
            Arc::new(InMemoryTableRepository::default()),
        )
        .execute()
        .await;
        assert!(!response.health.gemini_api);
        assert!(!response.healthy);
    }
}
