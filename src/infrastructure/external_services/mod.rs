pub mod document_extractors;
pub mod gemini_client;
pub mod pinecone_client;
pub mod semantic_chunking;

pub use document_extractors::PdfExtractor;
pub use gemini_client::{GeminiClient, GeminiEmbeddingProvider, GeminiLanguageModel};
pub use pinecone_client::PineconeVectorRepository;
