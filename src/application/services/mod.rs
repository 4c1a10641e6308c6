pub mod embedding_service;
pub mod llm_reply;
pub mod schema_inference;
pub mod schema_manager;
pub mod search_service;
pub mod table_ingestion;

pub use embedding_service::EmbeddingService;
pub use schema_inference::SchemaInferenceService;
pub use schema_manager::SchemaManagerService;
pub use search_service::SearchService;
pub use table_ingestion::TableIngestionService;
