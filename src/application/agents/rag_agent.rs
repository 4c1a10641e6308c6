use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::GenerationRequest;
use crate::application::services::{EmbeddingService, SearchService};
use crate::domain::repositories::VectorRepository;

pub const DEFAULT_TOP_K: usize = 5;

const CONTEXT_SEPARATOR: &str = "\n\n --- \n\n";
const EMPTY_CONTEXT: &str = "No specific details found in the documents for your query.";
const NO_CONTEXT: &str = "No information found in the knowledge base for your query.";
const APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your question. Please try again.";

fn event_bot_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a friendly Event Information Assistant named "Event Bot". Your primary purpose is to answer questions about the event described in the provided context. You can also answer questions based on user-submitted resumes if they have been provided. Follow these guidelines:

1. You can respond to basic greetings like "hi", "hello", or "how are you" in a warm, welcoming manner
2. For event information or resume content, only provide details that are present in the context
3. If information is not in the context, politely say "I'm sorry, I don't have that specific information" (for event) or "I'm sorry, I don't have that information from the resume" (for resume).
4. Keep responses concise but conversational
5. Do not make assumptions beyond what's explicitly stated in the context
6. Always prioritize factual accuracy while maintaining a helpful tone
7. Do not introduce information that isn't in the context
8. If unsure about any information, acknowledge uncertainty rather than guess
9. You may suggest a few general questions users might want to ask about the event
10. Remember to maintain a warm, friendly tone in all interactions
11. You should refer to yourself as "Event Bot"
12. You should not greet if the user has not greeted to you
13. Format and structure the answer properly.

Remember: While you can be conversational, your primary role is providing accurate information based on the context provided (event details and/or resume content).

Context information (event details and/or resume content):
{context}
--------

Now, please answer this question: {question}
"#
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RagAnswer {
    pub answer: String,
    pub context_found: bool,
    pub num_sources: usize,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RagHealth {
    pub gemini_api: bool,
    pub vector_store_connection: bool,
    pub embeddings: bool,
    pub vector_store: bool,
    pub overall_health: bool,
}

/// Retrieval-augmented answers over the embedded PDF text.
pub struct RagAgent {
    llm: Arc<dyn LanguageModel>,
    search_service: Arc<SearchService>,
    embedding_service: Arc<EmbeddingService>,
    vector_repository: Arc<dyn VectorRepository>,
}

impl RagAgent {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search_service: Arc<SearchService>,
        embedding_service: Arc<EmbeddingService>,
        vector_repository: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            llm,
            search_service,
            embedding_service,
            vector_repository,
        }
    }

    pub async fn answer_question(&self, question: &str, top_k: usize) -> RagAnswer {
        info!("Processing question: {}", truncate(question, 100));

        let matches = match self.search_service.search_similar_text(question, top_k).await {
            Ok(matches) => matches,
            Err(e) => return Self::failure(e.to_string()),
        };

        let context = if matches.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            let joined = matches
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR);
            if joined.trim().is_empty() {
                EMPTY_CONTEXT.to_string()
            } else {
                joined
            }
        };

        let prompt = event_bot_prompt(&context, question);

        match self.llm.generate(GenerationRequest::new(prompt)).await {
            Ok(answer) => {
                info!("Answered question with {} sources", matches.len());
                RagAnswer {
                    answer,
                    context_found: !matches.is_empty(),
                    num_sources: matches.len(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => Self::failure(e.to_string()),
        }
    }

    fn failure(message: String) -> RagAnswer {
        error!("Error answering question: {}", message);
        RagAnswer {
            answer: APOLOGY.to_string(),
            context_found: false,
            num_sources: 0,
            success: false,
            error: Some(message),
        }
    }

    pub async fn health_check(&self) -> RagHealth {
        let (gemini_api, stats, embedding, search) = futures::join!(
            self.llm.health_check(),
            self.vector_repository.stats(),
            self.embedding_service.embed_query("test"),
            self.search_service.search_similar_text("test", 1),
        );
        let mut status = RagHealth {
            gemini_api: gemini_api.unwrap_or(false),
            ..Default::default()
        };

        match stats {
            Ok(_) => status.vector_store_connection = true,
            Err(e) => error!("Vector store health check failed: {}", e),
        }

        match embedding {
            Ok(vector) => status.embeddings = !vector.as_slice().is_empty(),
            Err(e) => error!("Embeddings health check failed: {}", e),
        }

        match search {
            Ok(_) => status.vector_store = true,
            Err(e) => error!("Vector search health check failed: {}", e),
        }

        status.overall_health = status.gemini_api
            && status.vector_store_connection
            && status.embeddings
            && status.vector_store;
        info!("RAG agent health status: {}", status.overall_health);
        status
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
