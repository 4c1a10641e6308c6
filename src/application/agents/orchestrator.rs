use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::agents::combiner_agent::CombinerAgent;
use crate::application::agents::manager_agent::ManagerAgent;
use crate::application::agents::rag_agent::{DEFAULT_TOP_K, RagAgent};
use crate::application::agents::table_agent::TableAgent;
use crate::domain::entities::AgentState;

const WORKFLOW_APOLOGY: &str =
    "I encountered an error while processing your question. Please try again.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryMetadata {
    pub used_table: bool,
    pub used_rag: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrchestratorReply {
    pub answer: String,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: Option<QueryMetadata>,
}

/// Runs the manager → table/rag → combiner workflow for one query.
pub struct Orchestrator {
    manager: Arc<ManagerAgent>,
    table_agent: Arc<TableAgent>,
    rag_agent: Arc<RagAgent>,
    combiner: Arc<CombinerAgent>,
}

impl Orchestrator {
    pub fn new(
        manager: Arc<ManagerAgent>,
        table_agent: Arc<TableAgent>,
        rag_agent: Arc<RagAgent>,
        combiner: Arc<CombinerAgent>,
    ) -> Self {
        Self {
            manager,
            table_agent,
            rag_agent,
            combiner,
        }
    }

    pub async fn process_query(&self, query: &str) -> OrchestratorReply {
        info!("Orchestrating query: {}", query);
        let mut state = AgentState::new(query);

        let route = self.manager.route(query).await;
        state.set_route(route);

        if state.needs_table() {
            let answer = self.table_agent.process_query(query).await;
            state.set_table_response(answer);
        }

        let mut rag_error = None;
        if state.needs_rag() {
            let answer = self.rag_agent.answer_question(query, DEFAULT_TOP_K).await;
            if answer.success {
                state.set_rag_response(answer.answer);
            } else {
                rag_error = answer.error;
            }
        }

        // A failed retrieval only sinks the request when nothing else answered.
        if let Some(e) = rag_error.filter(|_| state.table_response().is_none()) {
            error!("Workflow failed for query: {}", e);
            return OrchestratorReply {
                answer: WORKFLOW_APOLOGY.to_string(),
                success: false,
                error: Some(e),
                metadata: None,
            };
        }

        let combined = self
            .combiner
            .combine(query, state.table_response(), state.rag_response())
            .await;
        state.set_response(combined);

        let metadata = QueryMetadata {
            used_table: state.needs_table(),
            used_rag: state.needs_rag(),
        };
        OrchestratorReply {
            answer: state.into_response().unwrap_or_default(),
            success: true,
            error: None,
            metadata: Some(metadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{EmbeddingService, SearchService};
    use crate::application::testing::{
        InMemorySchemaRegistry, InMemoryTableRepository, InMemoryVectorRepository,
        MockEmbeddingProvider, MockLanguageModel,
    };
    use crate::domain::repositories::table_repository::QueryRows;
    use serde_json::json;

    /// One model shared by every agent; replies are picked by looking at the request.
    fn scripted_model(route: &'static str) -> Arc<MockLanguageModel> {
        Arc::new(MockLanguageModel::responding(move |request| {
            let system = request.system_prompt.as_deref().unwrap_or_default();
            if system.starts_with("You are a query analyzer") {
                Ok(route.to_string())
            } else if system.starts_with("You are an expert SQL") {
                Ok("SELECT COUNT(*) AS talks FROM \"pdf_ab12cd34_talks\"".to_string())
            } else if system.starts_with("You are a response combiner") {
                Ok("There are 12 talks, opening with the keynote.".to_string())
            } else {
                Ok("The keynote opens the event.".to_string())
            }
        }))
    }

    fn orchestrator(
        llm: Arc<MockLanguageModel>,
        vectors: Arc<InMemoryVectorRepository>,
    ) -> Orchestrator {
        let registry = Arc::new(InMemorySchemaRegistry::default());
        registry.data.lock().unwrap().insert(
            "pdf_ab12cd34_talks".to_string(),
            json!({
                "schema": {"title": "string"},
                "description": "Talks",
                "pdf_uuid": "ab12cd34",
                "created_at": "2026-01-01T00:00:00Z",
                "status": "complete"
            }),
        );
        let tables = Arc::new(InMemoryTableRepository::with_select_result(Ok(QueryRows {
            rows: vec![json!({"talks": 12}).as_object().unwrap().clone()],
        })));

        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(8)),
            vectors.clone(),
        ));
        let search = Arc::new(SearchService::new(embeddings.clone(), vectors.clone()));

        Orchestrator::new(
            Arc::new(ManagerAgent::new(llm.clone())),
            Arc::new(TableAgent::new(llm.clone(), tables, registry)),
            Arc::new(RagAgent::new(llm.clone(), search, embeddings, vectors)),
            Arc::new(CombinerAgent::new(llm)),
        )
    }

    #[tokio::test]
    async fn test_rag_only_route() {
        let llm = scripted_model("rag");
        let reply = orchestrator(llm.clone(), Arc::new(InMemoryVectorRepository::default()))
            .process_query("What opens the event?")
            .await;

        assert!(reply.success);
        assert_eq!(reply.answer, "The keynote opens the event.");
        assert_eq!(
            reply.metadata,
            Some(QueryMetadata {
                used_table: false,
                used_rag: true
            })
        );
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_table_only_route() {
        let reply = orchestrator(scripted_model("table"), Arc::new(InMemoryVectorRepository::default()))
            .process_query("How many talks are there?")
            .await;

        assert!(reply.success);
        assert_eq!(reply.answer, "Result for 'How many talks are there?': talks = 12");
        assert!(reply.metadata.unwrap().used_table);
    }

    #[tokio::test]
    async fn test_both_routes_are_combined() {
        let llm = scripted_model("both");
        let reply = orchestrator(llm.clone(), Arc::new(InMemoryVectorRepository::default()))
            .process_query("How many talks, and what opens the event?")
            .await;

        assert_eq!(reply.answer, "There are 12 talks, opening with the keynote.");
        let metadata = reply.metadata.unwrap();
        assert!(metadata.used_table && metadata.used_rag);
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_retrieval_failure_without_table_answer() {
        let reply = orchestrator(scripted_model("rag"), Arc::new(InMemoryVectorRepository::failing()))
            .process_query("What opens the event?")
            .await;

        assert!(!reply.success);
        assert_eq!(reply.answer, WORKFLOW_APOLOGY);
        assert!(reply.error.is_some());
        assert!(reply.metadata.is_none());
    }

    #[tokio::test]
    async fn test_retrieval_failure_keeps_table_answer() {
        let reply = orchestrator(scripted_model("both"), Arc::new(InMemoryVectorRepository::failing()))
            .process_query("How many talks are there?")
            .await;

        assert!(reply.success);
        assert_eq!(reply.answer, "Result for 'How many talks are there?': talks = 12");
        assert!(reply.metadata.unwrap().used_rag);
    }
}
