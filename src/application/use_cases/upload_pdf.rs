use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ports::document_extractor::ExtractionOptions;
use crate::application::ports::{DocumentExtractor, FileStorage};
use crate::application::services::table_ingestion::TableIngestionError;
use crate::application::services::{EmbeddingService, TableIngestionService};
use crate::domain::value_objects::FileHash;

#[derive(Debug)]
pub enum UploadPdfError {
    ValidationError(String),
    FileTooLarge(String),
    StorageError(String),
    ExtractionError(String),
    IngestionError(String),
    EmbeddingError(String),
}

impl std::fmt::Display for UploadPdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadPdfError::ValidationError(msg) => write!(f, "{}", msg),
            UploadPdfError::FileTooLarge(msg) => write!(f, "{}", msg),
            UploadPdfError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            UploadPdfError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            UploadPdfError::IngestionError(msg) => write!(f, "Table ingestion error: {}", msg),
            UploadPdfError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
        }
    }
}

impl std::error::Error for UploadPdfError {}

impl From<TableIngestionError> for UploadPdfError {
    fn from(error: TableIngestionError) -> Self {
        UploadPdfError::IngestionError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadPdfRequest {
    pub file_name: String,
    pub file_data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableDetail {
    pub name: String,
    pub rows_stored: usize,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadPdfResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub tables_stored: usize,
    pub text_chunks_stored: usize,
    pub schemas_created: usize,
    pub table_details: Vec<TableDetail>,
}

/// Validates an uploaded PDF, stores its tables and embeds its text.
pub struct UploadPdfUseCase {
    file_storage: Arc<dyn FileStorage>,
    extractor: Arc<dyn DocumentExtractor>,
    ingestion: Arc<TableIngestionService>,
    embedding_service: Arc<EmbeddingService>,
    max_file_size: usize,
}

impl UploadPdfUseCase {
    pub fn new(
        file_storage: Arc<dyn FileStorage>,
        extractor: Arc<dyn DocumentExtractor>,
        ingestion: Arc<TableIngestionService>,
        embedding_service: Arc<EmbeddingService>,
        max_file_size: usize,
    ) -> Self {
        Self {
            file_storage,
            extractor,
            ingestion,
            embedding_service,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub async fn execute(
        &self,
        request: UploadPdfRequest,
    ) -> Result<UploadPdfResponse, UploadPdfError> {
        let filename = self.validate(&request)?;
        let file_hash = FileHash::from_bytes(&request.file_data);
        info!("Processing PDF upload: {} ({})", filename, file_hash.short());

        let stored = self
            .file_storage
            .store_file(&request.file_data, &filename)
            .await
            .map_err(|e| UploadPdfError::StorageError(e.to_string()))?;

        let result = self.process(&request.file_data, &filename, file_hash).await;

        if let Err(e) = self.file_storage.delete_file(&stored.path).await {
            warn!("Failed to delete temporary file {}: {}", stored.path, e);
        }

        result
    }

    fn validate(&self, request: &UploadPdfRequest) -> Result<String, UploadPdfError> {
        let filename = Path::new(request.file_name.trim())
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if filename.is_empty() {
            return Err(UploadPdfError::ValidationError(
                "No file selected".to_string(),
            ));
        }

        if !self.extractor.can_extract(&filename) {
            return Err(UploadPdfError::ValidationError(
                "Only PDF files are allowed".to_string(),
            ));
        }

        if request.file_data.len() > self.max_file_size {
            return Err(UploadPdfError::FileTooLarge(format!(
                "File too large. Maximum size is {}MB",
                self.max_file_size / (1024 * 1024)
            )));
        }

        if request.file_data.is_empty() {
            return Err(UploadPdfError::ValidationError(
                "File data cannot be empty".to_string(),
            ));
        }

        Ok(filename)
    }

    async fn process(
        &self,
        data: &[u8],
        filename: &str,
        file_hash: FileHash,
    ) -> Result<UploadPdfResponse, UploadPdfError> {
        let document = self
            .extractor
            .extract(data, ExtractionOptions::default())
            .await
            .map_err(|e| UploadPdfError::ExtractionError(e.to_string()))?;

        for page_error in &document.errors {
            warn!("Page extraction problem in {}: {}", filename, page_error);
        }

        let report = self
            .ingestion
            .ingest(&document, filename, Some(file_hash))
            .await?;

        let mut texts: Vec<String> = document.pages.iter().map(|p| p.text.clone()).collect();
        texts.extend(report.text_chunks.iter().cloned());

        let text_chunks_stored = self
            .embedding_service
            .store_document(&texts, filename, report.tables_info.len())
            .await
            .map_err(|e| UploadPdfError::EmbeddingError(e.to_string()))?;

        let table_details: Vec<TableDetail> = report
            .tables_info
            .into_iter()
            .map(|t| TableDetail {
                name: t.name,
                rows_stored: t.rows,
                description: t.description,
            })
            .collect();

        info!(
            "Processed {}: {} tables, {} text chunks",
            filename,
            table_details.len(),
            text_chunks_stored
        );

        Ok(UploadPdfResponse {
            success: true,
            message: "PDF processed successfully with Gemini-enhanced schema inference"
                .to_string(),
            filename: filename.to_string(),
            tables_stored: table_details.len(),
            text_chunks_stored,
            schemas_created: report.schemas_saved,
            table_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::document_extractor::{ExtractedDocument, ExtractedPage};
    use crate::application::services::SchemaInferenceService;
    use crate::application::testing::{
        InMemoryFileStorage, InMemorySchemaRegistry, InMemoryTableRepository,
        InMemoryVectorRepository, MockEmbeddingProvider, MockLanguageModel, StaticExtractor,
    };

    struct Fixture {
        use_case: UploadPdfUseCase,
        storage: Arc<InMemoryFileStorage>,
        vectors: Arc<InMemoryVectorRepository>,
        tables: Arc<InMemoryTableRepository>,
    }

    fn fixture(document: ExtractedDocument, replies: Vec<&str>) -> Fixture {
        let llm = Arc::new(MockLanguageModel::with_replies(replies));
        let storage = Arc::new(InMemoryFileStorage::default());
        let vectors = Arc::new(InMemoryVectorRepository::default());
        let tables = Arc::new(InMemoryTableRepository::default());
        let ingestion = Arc::new(TableIngestionService::new(
            Arc::new(SchemaInferenceService::new(llm)),
            tables.clone(),
            Arc::new(InMemorySchemaRegistry::default()),
        ));
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            vectors.clone(),
        ));

        Fixture {
            use_case: UploadPdfUseCase::new(
                storage.clone(),
                Arc::new(StaticExtractor { document }),
                ingestion,
                embeddings,
                1024,
            ),
            storage,
            vectors,
            tables,
        }
    }

    fn request(name: &str, size: usize) -> UploadPdfRequest {
        UploadPdfRequest {
            file_name: name.to_string(),
            file_data: vec![b'%'; size],
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_uploads() {
        let f = fixture(ExtractedDocument::default(), vec![]);

        let err = f.use_case.execute(request("", 10)).await.unwrap_err();
        assert_eq!(err.to_string(), "No file selected");

        let err = f.use_case.execute(request("notes.txt", 10)).await.unwrap_err();
        assert_eq!(err.to_string(), "Only PDF files are allowed");

        let err = f.use_case.execute(request("big.pdf", 2048)).await.unwrap_err();
        assert!(matches!(err, UploadPdfError::FileTooLarge(_)));

        assert!(f.storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_only_pdf_is_embedded_and_file_removed() {
        let document = ExtractedDocument {
            pages: vec![ExtractedPage {
                number: 1,
                text: "The conference opens on Monday. Registration starts at 8am.".to_string(),
                tables: vec![],
            }],
            ..Default::default()
        };
        let f = fixture(document, vec![]);

        let response = f
            .use_case
            .execute(request("uploads/../agenda.pdf", 100))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.filename, "agenda.pdf");
        assert_eq!(response.tables_stored, 0);
        assert_eq!(response.schemas_created, 0);
        assert_eq!(response.text_chunks_stored, 1);
        assert_eq!(f.vectors.records.lock().unwrap().len(), 1);
        assert!(f.storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tables_are_stored_and_reported() {
        let document = ExtractedDocument {
            pages: vec![ExtractedPage {
                number: 1,
                text: "Speaker ratings from the feedback forms.".to_string(),
                tables: vec![vec![
                    vec!["Speaker".to_string(), "Rating".to_string()],
                    vec!["Ada".to_string(), "4.5".to_string()],
                    vec!["Grace".to_string(), "4.8".to_string()],
                ]],
            }],
            ..Default::default()
        };
        let f = fixture(
            document,
            vec![
                r#"{"table_name": "pdf_x_speaker_ratings", "table_schema": {"speaker": "string", "rating": "float"}, "description": "Ratings"}"#,
                "Speaker ratings collected after each talk.",
            ],
        );

        let response = f.use_case.execute(request("feedback.pdf", 100)).await.unwrap();

        assert_eq!(response.tables_stored, 1);
        assert_eq!(response.schemas_created, 1);
        assert_eq!(response.table_details[0].rows_stored, 2);
        assert_eq!(
            response.table_details[0].description,
            "Speaker ratings collected after each talk."
        );
        assert_eq!(f.tables.rows_of(&response.table_details[0].name).len(), 2);
        for record in f.vectors.records.lock().unwrap().iter() {
            assert_eq!(record.metadata().table_count, 1);
        }
    }
}
