use pgvector::Vector;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, EmbeddingProvider, EmbeddingRequest, EmbeddingTask,
};
use crate::domain::entities::{DocumentType, VectorMetadata, VectorRecord};
use crate::domain::repositories::VectorRepository;
use crate::infrastructure::external_services::semantic_chunking::{
    RTSplitter, RecursiveTextSplitter,
};

pub const EMBEDDING_BATCH_SIZE: usize = 100;

#[derive(Debug)]
pub enum EmbeddingServiceError {
    ProviderError(String),
    RepositoryError(String),
    ValidationError(String),
}

impl std::fmt::Display for EmbeddingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingServiceError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            EmbeddingServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            EmbeddingServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingServiceError {}

/// Chunks document text, embeds it and writes the vectors with their metadata.
pub struct EmbeddingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_repository: Arc<dyn VectorRepository>,
    splitter: RTSplitter,
}

impl EmbeddingService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_repository: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            embedding_provider,
            vector_repository,
            splitter: RTSplitter::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: RTSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Embeds and stores `texts` as one document. Returns the number of vectors written.
    pub async fn store_document(
        &self,
        texts: &[String],
        filename: &str,
        table_count: usize,
    ) -> Result<usize, EmbeddingServiceError> {
        let document_text = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let chunks = self.splitter.split_text(&document_text);
        if chunks.is_empty() {
            warn!("No text chunks provided for embedding from {}", filename);
            return Ok(0);
        }

        info!("Processing {} text chunks from {}", chunks.len(), filename);
        let embeddings = self
            .embed_texts(&chunks, EmbeddingTask::RetrievalDocument)
            .await;

        let (document_type, user_id) = classify_document(filename);
        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, values)| {
                VectorRecord::new(
                    values,
                    VectorMetadata {
                        text,
                        filename: filename.to_string(),
                        user_id: user_id.clone(),
                        document_type,
                        table_count,
                    },
                )
            })
            .collect();

        let stored = self
            .vector_repository
            .upsert(&records)
            .await
            .map_err(|e| EmbeddingServiceError::RepositoryError(e.to_string()))?;

        info!("Stored {} text embeddings for {}", stored, filename);
        Ok(stored)
    }

    /// One vector per input, in order. Failed batches are retried text by
    /// text; texts that still fail get a zero vector.
    pub async fn embed_texts(&self, texts: &[String], task: EmbeddingTask) -> Vec<Vector> {
        let batch_size = self
            .embedding_provider
            .max_batch_size()
            .clamp(1, EMBEDDING_BATCH_SIZE);
        let total_batches = texts.len().div_ceil(batch_size);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (index, batch) in texts.chunks(batch_size).enumerate() {
            debug!("Processing batch {}/{}", index + 1, total_batches);

            let request = BatchEmbeddingRequest {
                texts: batch.to_vec(),
                task,
            };

            match self.embedding_provider.generate_embeddings(request).await {
                Ok(response) if response.embeddings.len() == batch.len() => {
                    embeddings.extend(response.embeddings);
                }
                Ok(response) => {
                    warn!(
                        "Batch returned {} embeddings for {} texts, retrying individually",
                        response.embeddings.len(),
                        batch.len()
                    );
                    embeddings.extend(self.embed_individually(batch, task).await);
                }
                Err(e) => {
                    warn!("Batch embedding failed, retrying individually: {}", e);
                    embeddings.extend(self.embed_individually(batch, task).await);
                }
            }
        }

        embeddings
    }

    async fn embed_individually(&self, texts: &[String], task: EmbeddingTask) -> Vec<Vector> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            let request = EmbeddingRequest {
                text: text.clone(),
                task,
            };
            match self.embedding_provider.generate_embedding(request).await {
                Ok(response) => embeddings.push(response.embedding),
                Err(e) => {
                    error!("Failed to generate embedding for text chunk: {}", e);
                    embeddings.push(self.zero_vector());
                }
            }
        }
        embeddings
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vector, EmbeddingServiceError> {
        if query.trim().is_empty() {
            return Err(EmbeddingServiceError::ValidationError(
                "Cannot embed an empty query".to_string(),
            ));
        }

        let response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest {
                text: query.to_string(),
                task: EmbeddingTask::RetrievalQuery,
            })
            .await
            .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))?;

        Ok(response.embedding)
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.embedding_dimension()
    }

    fn zero_vector(&self) -> Vector {
        Vector::from(vec![0.0; self.embedding_dimension()])
    }
}

/// Resumes and CVs are tagged with the file stem as the user id.
pub fn classify_document(filename: &str) -> (DocumentType, String) {
    let lowered = filename.to_lowercase();
    if lowered.contains("resume") || lowered.contains("cv") {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        (DocumentType::Resume, stem)
    } else {
        (DocumentType::EventDocument, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{InMemoryVectorRepository, MockEmbeddingProvider};

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("chunk number {}", i)).collect()
    }

    #[tokio::test]
    async fn test_embed_texts_batches_by_hundred() {
        let provider = Arc::new(MockEmbeddingProvider::new(4));
        let service = EmbeddingService::new(
            provider.clone(),
            Arc::new(InMemoryVectorRepository::default()),
        );

        let vectors = service
            .embed_texts(&texts(250), EmbeddingTask::RetrievalDocument)
            .await;

        assert_eq!(vectors.len(), 250);
        assert_eq!(*provider.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn test_failed_texts_get_zero_vectors() {
        let mut provider = MockEmbeddingProvider::new(4);
        provider.fail_texts_containing = Some("number 1".to_string());
        let service = EmbeddingService::new(
            Arc::new(provider),
            Arc::new(InMemoryVectorRepository::default()),
        );

        let vectors = service
            .embed_texts(&texts(3), EmbeddingTask::RetrievalDocument)
            .await;

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[1].as_slice(), &[0.0, 0.0, 0.0, 0.0]);
        assert!(vectors[0].as_slice().iter().any(|v| *v != 0.0));
        assert!(vectors[2].as_slice().iter().any(|v| *v != 0.0));
    }

    #[tokio::test]
    async fn test_store_document_metadata() {
        let repository = Arc::new(InMemoryVectorRepository::default());
        let service = EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            repository.clone(),
        )
        .with_splitter(RTSplitter::new(60, 20));

        let pages = vec![
            "Jane Doe is a backend engineer with ten years of Rust experience.".to_string(),
            "She organised three community meetups and a conference track.".to_string(),
        ];
        let stored = service
            .store_document(&pages, "jane_resume.pdf", 1)
            .await
            .unwrap();

        let records = repository.records.lock().unwrap();
        assert_eq!(stored, records.len());
        assert!(stored > 1);
        for record in records.iter() {
            assert!(record.id().starts_with("jane_resume.pdf_"));
            assert_eq!(record.metadata().user_id, "jane_resume");
            assert_eq!(record.metadata().document_type, DocumentType::Resume);
            assert_eq!(record.metadata().table_count, 1);
        }
    }

    #[tokio::test]
    async fn test_empty_document_stores_nothing() {
        let service = EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            Arc::new(InMemoryVectorRepository::default()),
        );

        assert_eq!(service.store_document(&[], "a.pdf", 0).await.unwrap(), 0);
        assert!(service.embed_query("  ").await.is_err());
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(
            classify_document("John_CV.pdf"),
            (DocumentType::Resume, "John_CV".to_string())
        );
        assert_eq!(
            classify_document("agenda.pdf"),
            (DocumentType::EventDocument, String::new())
        );
    }
}
