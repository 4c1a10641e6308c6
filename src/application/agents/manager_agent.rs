use std::sync::Arc;
use tracing::{error, info};

use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::GenerationRequest;
use crate::domain::value_objects::RouteDecision;

const ROUTER_PROMPT: &str = r#"You are a query analyzer. Analyze the user query and determine if it needs:
1. "table" - for data queries about statistics, numbers, calculations from structured data
2. "rag" - for general knowledge questions about people, facts, descriptions
3. "both" - for queries that need both data analysis and general knowledge

Keywords that suggest table queries: "how many", "statistics", "count", "total", "average", "goals scored", "data", "numbers"
Keywords that suggest RAG queries: "tell me about", "who is", "biography", "background", "describe"

Respond with only one word: "table", "rag", or "both""#;

/// Classifies a query as needing table data, document retrieval, or both.
pub struct ManagerAgent {
    llm: Arc<dyn LanguageModel>,
}

impl ManagerAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn route(&self, query: &str) -> RouteDecision {
        let request = GenerationRequest::new(format!("Query: {}", query))
            .with_system(ROUTER_PROMPT)
            .with_temperature(0.1);

        match self.llm.generate(request).await {
            Ok(reply) => {
                let decision = RouteDecision::from_reply(&reply);
                info!(
                    "Manager decision: {:?} (table: {}, rag: {})",
                    decision,
                    decision.needs_table(),
                    decision.needs_rag()
                );
                decision
            }
            Err(e) => {
                error!("Error in manager routing, defaulting to rag: {}", e);
                RouteDecision::Rag
            }
        }
    }
}
