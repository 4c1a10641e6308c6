use std::sync::Arc;

use crate::application::agents::{Orchestrator, OrchestratorReply};

#[derive(Debug)]
pub enum AnswerQueryError {
    ValidationError(String),
}

impl std::fmt::Display for AnswerQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerQueryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AnswerQueryError {}

#[derive(Debug, Clone)]
pub struct AnswerQueryRequest {
    pub query: String,
}

pub struct AnswerQueryUseCase {
    orchestrator: Arc<Orchestrator>,
}

impl AnswerQueryUseCase {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(
        &self,
        request: AnswerQueryRequest,
    ) -> Result<OrchestratorReply, AnswerQueryError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AnswerQueryError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        Ok(self.orchestrator.process_query(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agents::{CombinerAgent, ManagerAgent, RagAgent, TableAgent};
    use crate::application::services::{EmbeddingService, SearchService};
    use crate::application::testing::{
        InMemorySchemaRegistry, InMemoryTableRepository, InMemoryVectorRepository,
        MockEmbeddingProvider, MockLanguageModel,
    };

    fn use_case(llm: Arc<MockLanguageModel>) -> AnswerQueryUseCase {
        let vectors = Arc::new(InMemoryVectorRepository::default());
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            vectors.clone(),
        ));
        let search = Arc::new(SearchService::new(embeddings.clone(), vectors.clone()));
        let orchestrator = Orchestrator::new(
            Arc::new(ManagerAgent::new(llm.clone())),
            Arc::new(TableAgent::new(
                llm.clone(),
                Arc::new(InMemoryTableRepository::default()),
                Arc::new(InMemorySchemaRegistry::default()),
            )),
            Arc::new(RagAgent::new(llm.clone(), search, embeddings, vectors)),
            Arc::new(CombinerAgent::new(llm)),
        );
        AnswerQueryUseCase::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let llm = Arc::new(MockLanguageModel::with_replies(vec![]));
        let result = use_case(llm.clone())
            .execute(AnswerQueryRequest {
                query: "   ".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AnswerQueryError::ValidationError(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_query_is_trimmed_and_answered() {
        let llm = Arc::new(MockLanguageModel::with_replies(vec!["rag", "Hello from Event Bot"]));
        let reply = use_case(llm.clone())
            .execute(AnswerQueryRequest {
                query: "  hi there \n".to_string(),
            })
            .await
            .unwrap();

        assert!(reply.success);
        assert_eq!(reply.answer, "Hello from Event Bot");
        assert_eq!(llm.requests()[0].prompt, "Query: hi there");
    }
}
