pub mod document_extractor;
pub mod embedding_provider;
pub mod file_storage;
pub mod language_model;

pub use document_extractor::DocumentExtractor;
pub use embedding_provider::EmbeddingProvider;
pub use file_storage::FileStorage;
pub use language_model::LanguageModel;
