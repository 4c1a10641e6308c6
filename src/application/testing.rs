//! In-memory doubles for the ports and repositories, shared by unit tests.

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, ExtractedDocument, ExtractionOptions,
};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProviderError, EmbeddingRequest,
    EmbeddingResponse,
};
use crate::application::ports::file_storage::{FileStorageError, StoredFile};
use crate::application::ports::language_model::{GenerationRequest, LanguageModelError};
use crate::application::ports::{DocumentExtractor, EmbeddingProvider, FileStorage, LanguageModel};
use crate::domain::entities::{
    SchemaEntry, TableSchema, VectorMatch, VectorRecord, cosine_similarity,
};
use crate::domain::repositories::schema_registry::{RegistryClearResult, SchemaRegistryError};
use crate::domain::repositories::table_repository::{
    DropSummary, QueryRows, TableRepositoryError,
};
use crate::domain::repositories::vector_repository::{VectorRepositoryError, VectorStoreStats};
use crate::domain::repositories::{SchemaRegistry, TableRepository, VectorRepository};
use crate::domain::value_objects::{CellValue, SelectStatement, SqlIdentifier};

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String, LanguageModelError> + Send + Sync>;

/// Language model that answers from a closure and records every request.
pub struct MockLanguageModel {
    responder: Responder,
    requests: Mutex<Vec<GenerationRequest>>,
    healthy: bool,
}

impl MockLanguageModel {
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, LanguageModelError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    /// Replies in order; errors once the script runs out.
    pub fn with_replies(replies: Vec<&str>) -> Self {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(replies.into_iter().map(str::to_string).collect());
        Self::responding(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LanguageModelError::ApiError("no scripted reply".to_string()))
        })
    }

    pub fn failing() -> Self {
        let mut model =
            Self::responding(|_| Err(LanguageModelError::ApiError("model offline".to_string())));
        model.healthy = false;
        model
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LanguageModelError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }

    async fn health_check(&self) -> Result<bool, LanguageModelError> {
        Ok(self.healthy)
    }

    fn model_name(&self) -> String {
        "mock-model".to_string()
    }
}

/// Deterministic embeddings derived from the text bytes.
pub struct MockEmbeddingProvider {
    dimension: usize,
    pub fail_batches: bool,
    pub fail_texts_containing: Option<String>,
    pub batch_sizes: Mutex<Vec<usize>>,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_batches: false,
            fail_texts_containing: None,
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn embed(&self, text: &str) -> Vector {
        let mut values = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            values[i % self.dimension] += byte as f32 / 255.0;
        }
        if values.iter().all(|v| *v == 0.0) {
            values[0] = 1.0;
        }
        Vector::from(values)
    }

    fn check(&self, text: &str) -> Result<(), EmbeddingProviderError> {
        match &self.fail_texts_containing {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(EmbeddingProviderError::ApiError("rejected text".to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        self.check(&request.text)?;
        Ok(EmbeddingResponse {
            embedding: self.embed(&request.text),
            model_name: self.model_name(),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        self.batch_sizes.lock().unwrap().push(request.texts.len());
        if self.fail_batches {
            return Err(EmbeddingProviderError::ServiceUnavailable);
        }
        for text in &request.texts {
            self.check(text)?;
        }
        Ok(BatchEmbeddingResponse {
            embeddings: request.texts.iter().map(|t| self.embed(t)).collect(),
            model_name: self.model_name(),
        })
    }

    async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
        Ok(!self.fail_batches)
    }

    fn model_name(&self) -> String {
        "mock-embedding".to_string()
    }

    fn max_batch_size(&self) -> usize {
        100
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Default)]
pub struct InMemoryVectorRepository {
    pub records: Mutex<Vec<VectorRecord>>,
    pub fail: bool,
}

impl InMemoryVectorRepository {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn guard(&self) -> Result<(), VectorRepositoryError> {
        if self.fail {
            Err(VectorRepositoryError::ConnectionError("index unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorRepositoryError> {
        self.guard()?;
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(records.len())
    }

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorRepositoryError> {
        self.guard()?;
        let records = self.records.lock().unwrap();
        let mut matches: Vec<VectorMatch> = records
            .iter()
            .map(|r| VectorMatch {
                id: r.id().to_string(),
                text: r.text().to_string(),
                filename: r.filename().to_string(),
                score: cosine_similarity(query_vector, r.values()),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_all(&self) -> Result<i64, VectorRepositoryError> {
        self.guard()?;
        let mut records = self.records.lock().unwrap();
        let count = records.len() as i64;
        records.clear();
        Ok(count)
    }

    async fn stats(&self) -> Result<VectorStoreStats, VectorRepositoryError> {
        self.guard()?;
        Ok(VectorStoreStats {
            index_name: self.index_name(),
            index_exists: true,
            vector_count: self.records.lock().unwrap().len() as i64,
        })
    }

    fn index_name(&self) -> String {
        "memory-index".to_string()
    }
}

#[derive(Default)]
pub struct InMemoryTableRepository {
    pub tables: Mutex<BTreeMap<String, (TableSchema, Vec<Vec<CellValue>>)>>,
    pub select_result: Mutex<Option<Result<QueryRows, String>>>,
    pub executed: Mutex<Vec<String>>,
    pub fail: bool,
}

impl InMemoryTableRepository {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_select_result(result: Result<QueryRows, String>) -> Self {
        let repository = Self::default();
        *repository.select_result.lock().unwrap() = Some(result);
        repository
    }

    pub fn rows_of(&self, name: &str) -> Vec<Vec<CellValue>> {
        self.tables
            .lock()
            .unwrap()
            .get(name)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }

    fn guard(&self) -> Result<(), TableRepositoryError> {
        if self.fail {
            Err(TableRepositoryError::DatabaseError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TableRepository for InMemoryTableRepository {
    async fn create_table(
        &self,
        name: &SqlIdentifier,
        schema: &TableSchema,
    ) -> Result<(), TableRepositoryError> {
        self.guard()?;
        self.tables
            .lock()
            .unwrap()
            .entry(name.as_str().to_string())
            .or_insert_with(|| (schema.clone(), Vec::new()));
        Ok(())
    }

    async fn insert_rows(
        &self,
        name: &SqlIdentifier,
        _schema: &TableSchema,
        rows: &[Vec<CellValue>],
    ) -> Result<usize, TableRepositoryError> {
        self.guard()?;
        let mut tables = self.tables.lock().unwrap();
        let (_, stored) = tables
            .get_mut(name.as_str())
            .ok_or_else(|| TableRepositoryError::DatabaseError("no such table".to_string()))?;
        stored.extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn run_select(
        &self,
        statement: &SelectStatement,
    ) -> Result<QueryRows, TableRepositoryError> {
        self.guard()?;
        self.executed.lock().unwrap().push(statement.to_string());
        match self.select_result.lock().unwrap().clone() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(msg)) => Err(TableRepositoryError::DatabaseError(msg)),
            None => Ok(QueryRows::default()),
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>, TableRepositoryError> {
        self.guard()?;
        Ok(self.tables.lock().unwrap().keys().cloned().collect())
    }

    async fn drop_all_tables(&self) -> Result<DropSummary, TableRepositoryError> {
        self.guard()?;
        let mut tables = self.tables.lock().unwrap();
        let dropped = tables.keys().cloned().collect();
        tables.clear();
        Ok(DropSummary {
            tables_dropped: dropped,
            tables_failed: Vec::new(),
        })
    }

    async fn database_name(&self) -> Result<String, TableRepositoryError> {
        self.guard()?;
        Ok("eventbot_test".to_string())
    }

    async fn health_check(&self) -> Result<bool, TableRepositoryError> {
        Ok(!self.fail)
    }
}

#[derive(Default)]
pub struct InMemorySchemaRegistry {
    pub data: Mutex<Map<String, Value>>,
    pub backups: Mutex<HashMap<String, Map<String, Value>>>,
}

impl InMemorySchemaRegistry {
    pub fn with_entries(entries: Vec<(&str, SchemaEntry)>) -> Self {
        let registry = Self::default();
        {
            let mut data = registry.data.lock().unwrap();
            for (name, entry) in entries {
                data.insert(name.to_string(), serde_json::to_value(entry).unwrap());
            }
        }
        registry
    }
}

#[async_trait]
impl SchemaRegistry for InMemorySchemaRegistry {
    async fn raw_entries(&self) -> Result<Map<String, Value>, SchemaRegistryError> {
        Ok(self.data.lock().unwrap().clone())
    }

    async fn entries(&self) -> Result<Vec<(String, SchemaEntry)>, SchemaRegistryError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(name, value)| {
                serde_json::from_value(value.clone())
                    .ok()
                    .map(|entry| (name.clone(), entry))
            })
            .collect())
    }

    async fn get(&self, table_name: &str) -> Result<Option<SchemaEntry>, SchemaRegistryError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(table_name)
            .and_then(|value| serde_json::from_value(value.clone()).ok()))
    }

    async fn upsert(
        &self,
        table_name: &str,
        entry: &SchemaEntry,
    ) -> Result<(), SchemaRegistryError> {
        let value = serde_json::to_value(entry)
            .map_err(|e| SchemaRegistryError::ParseError(e.to_string()))?;
        self.data
            .lock()
            .unwrap()
            .insert(table_name.to_string(), value);
        Ok(())
    }

    async fn replace_all(&self, entries: Map<String, Value>) -> Result<(), SchemaRegistryError> {
        *self.data.lock().unwrap() = entries;
        Ok(())
    }

    async fn clear(&self) -> Result<RegistryClearResult, SchemaRegistryError> {
        let mut data = self.data.lock().unwrap();
        let cleared = data.len();
        data.clear();
        Ok(RegistryClearResult {
            file_path: self.location(),
            file_existed: true,
            schemas_cleared: cleared,
        })
    }

    async fn backup(&self) -> Result<String, SchemaRegistryError> {
        let mut backups = self.backups.lock().unwrap();
        let path = format!("memory://backup_{}", backups.len() + 1);
        backups.insert(path.clone(), self.data.lock().unwrap().clone());
        Ok(path)
    }

    async fn restore(&self, path: &str) -> Result<usize, SchemaRegistryError> {
        let snapshot = self
            .backups
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SchemaRegistryError::NotFound(path.to_string()))?;
        let count = snapshot.len();
        *self.data.lock().unwrap() = snapshot;
        Ok(count)
    }

    async fn exists(&self) -> bool {
        true
    }

    async fn file_size(&self) -> u64 {
        Value::Object(self.data.lock().unwrap().clone())
            .to_string()
            .len() as u64
    }

    fn location(&self) -> String {
        "memory://table_schema.json".to_string()
    }
}

/// Extractor returning a canned document.
pub struct StaticExtractor {
    pub document: ExtractedDocument,
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(
        &self,
        data: &[u8],
        _options: ExtractionOptions,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        if data.is_empty() {
            return Err(DocumentExtractionError::CorruptedFile("empty file".to_string()));
        }
        Ok(self.document.clone())
    }

    fn can_extract(&self, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(".pdf")
    }

    fn max_file_size(&self) -> Option<usize> {
        None
    }
}

#[derive(Default)]
pub struct InMemoryFileStorage {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store_file(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<StoredFile, FileStorageError> {
        let path = format!("memory://{}", file_name);
        self.files.lock().unwrap().insert(path.clone(), data.to_vec());
        Ok(StoredFile {
            path,
            file_name: file_name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn delete_file(&self, path: &str) -> Result<bool, FileStorageError> {
        Ok(self.files.lock().unwrap().remove(path).is_some())
    }
}
