use std::sync::Arc;
use tracing::{error, info};

use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::GenerationRequest;

const COMBINER_PROMPT: &str = r#"You are a response combiner that creates coherent, well-structured answers by intelligently merging information from two sources:
1. RAG Response: General knowledge and contextual information
2. Table Response: Data analysis and statistical information

Your task is to:
- Combine both responses into a single, coherent answer
- Prioritize the most relevant information for the user's query
- Maintain a natural, conversational tone
- Structure the response logically (usually context first, then data)
- Remove any redundant information
- If one response contains an error or is irrelevant, focus on the useful one
- Keep the response concise but comprehensive

Do not mention "RAG response" or "Table response" in your answer. Just provide a natural, unified response."#;

const NOTHING_TO_COMBINE: &str = "I apologize, but I wasn't able to generate a response to your query. Please try rephrasing your question.";

/// Merges the table and retrieval answers into one reply.
pub struct CombinerAgent {
    llm: Arc<dyn LanguageModel>,
}

impl CombinerAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn combine(
        &self,
        query: &str,
        table_response: Option<&str>,
        rag_response: Option<&str>,
    ) -> String {
        let table = table_response.filter(|r| !r.is_empty());
        let rag = rag_response.filter(|r| !r.is_empty());

        match (table, rag) {
            (Some(table), None) => single_response(table, "data analysis"),
            (None, Some(rag)) => single_response(rag, "knowledge base"),
            (Some(table), Some(rag)) => self.merge(query, table, rag).await,
            (None, None) => NOTHING_TO_COMBINE.to_string(),
        }
    }

    async fn merge(&self, query: &str, table: &str, rag: &str) -> String {
        let prompt = format!(
            "Original Query: {}\n\nGeneral Knowledge Response: {}\n\nData Analysis Response: {}\n\nPlease combine these responses into a single, coherent answer that best addresses the user's query.",
            query, rag, table
        );
        let request = GenerationRequest::new(prompt)
            .with_system(COMBINER_PROMPT)
            .with_temperature(0.3);

        match self.llm.generate(request).await {
            Ok(combined) if !combined.trim().is_empty() => {
                info!("Combined table and retrieval responses");
                combined.trim().to_string()
            }
            Ok(_) => simple_combination(table, rag),
            Err(e) => {
                error!("Error combining responses, joining them instead: {}", e);
                simple_combination(table, rag)
            }
        }
    }
}

fn single_response(response: &str, source: &str) -> String {
    if response.trim().is_empty() {
        format!("No information available from {} for your query.", source)
    } else {
        response.to_string()
    }
}

fn simple_combination(table: &str, rag: &str) -> String {
    let parts: Vec<&str> = [rag, table]
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        "No response could be generated for your query.".to_string()
    } else {
        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MockLanguageModel;

    #[tokio::test]
    async fn test_single_side_is_returned_without_model_call() {
        let llm = Arc::new(MockLanguageModel::with_replies(vec![]));
        let combiner = CombinerAgent::new(llm.clone());

        assert_eq!(combiner.combine("q", Some("42 goals"), None).await, "42 goals");
        assert_eq!(combiner.combine("q", None, Some("Ada is a striker")).await, "Ada is a striker");
        assert_eq!(
            combiner.combine("q", Some("   "), None).await,
            "No information available from data analysis for your query."
        );
        assert_eq!(combiner.combine("q", None, None).await, NOTHING_TO_COMBINE);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_both_sides_are_merged_by_model() {
        let llm = Arc::new(MockLanguageModel::with_replies(vec!["Ada, a striker, scored 42."]));
        let combiner = CombinerAgent::new(llm.clone());

        let combined = combiner
            .combine("Tell me about Ada", Some("goals = 42"), Some("Ada is a striker"))
            .await;

        assert_eq!(combined, "Ada, a striker, scored 42.");
        let request = &llm.requests()[0];
        assert_eq!(request.temperature, 0.3);
        assert!(request.prompt.starts_with("Original Query: Tell me about Ada"));
        assert!(request.prompt.contains("General Knowledge Response: Ada is a striker"));
        assert!(request.prompt.contains("Data Analysis Response: goals = 42"));
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_join() {
        let combiner = CombinerAgent::new(Arc::new(MockLanguageModel::failing()));

        assert_eq!(
            combiner.combine("q", Some("goals = 42"), Some("Ada is a striker")).await,
            "Ada is a striker\n\ngoals = 42"
        );
        assert_eq!(
            combiner.combine("q", Some(" "), Some("\n")).await,
            "No response could be generated for your query."
        );
    }
}
