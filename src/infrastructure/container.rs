use std::sync::Arc;

use crate::{
    application::{
        agents::{CombinerAgent, ManagerAgent, Orchestrator, RagAgent, TableAgent},
        ports::{DocumentExtractor, EmbeddingProvider, FileStorage, LanguageModel},
        services::{
            EmbeddingService, SchemaInferenceService, SchemaManagerService, SearchService,
            TableIngestionService,
        },
        use_cases::{
            AnswerQueryUseCase, ClearAllDataUseCase, DataSummaryUseCase, HealthCheckUseCase,
            UploadPdfUseCase,
        },
    },
    domain::repositories::{SchemaRegistry, TableRepository, VectorRepository},
    infrastructure::{
        config::{AppConfig, VectorBackend},
        database::{
            PostgresTableRepository, PostgresVectorRepository, create_connection_pool,
            run_migrations,
        },
        external_services::{
            GeminiClient, GeminiEmbeddingProvider, GeminiLanguageModel, PdfExtractor,
            PineconeVectorRepository,
        },
        file_system::{JsonSchemaRegistry, LocalFileStorage},
    },
    presentation::http::handlers::{ChatHandler, DataHandler, HealthHandler, SchemaHandler},
};

pub struct AppContainer {
    // Repositories
    pub vector_repository: Arc<dyn VectorRepository>,
    pub table_repository: Arc<dyn TableRepository>,
    pub schema_registry: Arc<dyn SchemaRegistry>,

    // External Services
    pub language_model: Arc<dyn LanguageModel>,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub file_storage: Arc<dyn FileStorage>,
    pub document_extractor: Arc<dyn DocumentExtractor>,

    // Application Services
    pub embedding_service: Arc<EmbeddingService>,
    pub search_service: Arc<SearchService>,
    pub table_ingestion: Arc<TableIngestionService>,
    pub schema_manager: Arc<SchemaManagerService>,

    // Agents
    pub orchestrator: Arc<Orchestrator>,
    pub rag_agent: Arc<RagAgent>,

    // Use Cases
    pub answer_query_use_case: Arc<AnswerQueryUseCase>,
    pub upload_pdf_use_case: Arc<UploadPdfUseCase>,
    pub clear_all_data_use_case: Arc<ClearAllDataUseCase>,
    pub data_summary_use_case: Arc<DataSummaryUseCase>,
    pub health_check_use_case: Arc<HealthCheckUseCase>,

    // HTTP Handlers
    pub chat_handler: Arc<ChatHandler>,
    pub data_handler: Arc<DataHandler>,
    pub health_handler: Arc<HealthHandler>,
    pub schema_handler: Arc<SchemaHandler>,
}

impl AppContainer {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Create database connection pool
        let db_pool = create_connection_pool(&config.database_url)?;
        run_migrations(&db_pool)
            .map_err(|e| format!("Failed to run database migrations: {}", e))?;

        // Create repositories
        let table_repository: Arc<dyn TableRepository> =
            Arc::new(PostgresTableRepository::new(db_pool.clone()));
        let vector_repository: Arc<dyn VectorRepository> = match &config.vector_backend {
            VectorBackend::PgVector => Arc::new(PostgresVectorRepository::new(db_pool)),
            VectorBackend::Pinecone {
                api_key,
                index_name,
                host,
            } => Arc::new(PineconeVectorRepository::new(host, api_key, index_name)?),
        };
        let schema_registry: Arc<dyn SchemaRegistry> = Arc::new(JsonSchemaRegistry::new(
            config.schema_registry_path.clone(),
        ));

        // Create external services
        let gemini = GeminiClient::new(config.gemini.clone())?;
        let language_model: Arc<dyn LanguageModel> =
            Arc::new(GeminiLanguageModel::new(gemini.clone()));
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(GeminiEmbeddingProvider::new(gemini));

        let local_storage = LocalFileStorage::new(config.upload_folder.clone());
        local_storage.ensure_directory_exists().await?;
        let file_storage: Arc<dyn FileStorage> = Arc::new(local_storage);
        let document_extractor: Arc<dyn DocumentExtractor> = Arc::new(PdfExtractor::new());

        // Create application services
        let embedding_service = Arc::new(EmbeddingService::new(
            embedding_provider.clone(),
            vector_repository.clone(),
        ));
        let search_service = Arc::new(SearchService::new(
            embedding_service.clone(),
            vector_repository.clone(),
        ));
        let table_ingestion = Arc::new(TableIngestionService::new(
            Arc::new(SchemaInferenceService::new(language_model.clone())),
            table_repository.clone(),
            schema_registry.clone(),
        ));
        let schema_manager = Arc::new(SchemaManagerService::new(schema_registry.clone()));

        // Create agents
        let rag_agent = Arc::new(RagAgent::new(
            language_model.clone(),
            search_service.clone(),
            embedding_service.clone(),
            vector_repository.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(ManagerAgent::new(language_model.clone())),
            Arc::new(TableAgent::new(
                language_model.clone(),
                table_repository.clone(),
                schema_registry.clone(),
            )),
            rag_agent.clone(),
            Arc::new(CombinerAgent::new(language_model.clone())),
        ));

        // Create use cases
        let answer_query_use_case = Arc::new(AnswerQueryUseCase::new(orchestrator.clone()));
        let upload_pdf_use_case = Arc::new(UploadPdfUseCase::new(
            file_storage.clone(),
            document_extractor.clone(),
            table_ingestion.clone(),
            embedding_service.clone(),
            config.max_file_size,
        ));
        let clear_all_data_use_case = Arc::new(ClearAllDataUseCase::new(
            vector_repository.clone(),
            table_repository.clone(),
            schema_registry.clone(),
        ));
        let data_summary_use_case = Arc::new(DataSummaryUseCase::new(
            vector_repository.clone(),
            table_repository.clone(),
            schema_registry.clone(),
        ));
        let health_check_use_case = Arc::new(HealthCheckUseCase::new(
            rag_agent.clone(),
            table_repository.clone(),
        ));

        // Create HTTP handlers
        let chat_handler = Arc::new(ChatHandler::new(
            answer_query_use_case.clone(),
            upload_pdf_use_case.clone(),
        ));
        let data_handler = Arc::new(DataHandler::new(
            clear_all_data_use_case.clone(),
            data_summary_use_case.clone(),
        ));
        let health_handler = Arc::new(HealthHandler::new(health_check_use_case.clone()));
        let schema_handler = Arc::new(SchemaHandler::new(schema_manager.clone()));

        Ok(Self {
            vector_repository,
            table_repository,
            schema_registry,
            language_model,
            embedding_provider,
            file_storage,
            document_extractor,
            embedding_service,
            search_service,
            table_ingestion,
            schema_manager,
            orchestrator,
            rag_agent,
            answer_query_use_case,
            upload_pdf_use_case,
            clear_all_data_use_case,
            data_summary_use_case,
            health_check_use_case,
            chat_handler,
            data_handler,
            health_handler,
            schema_handler,
        })
    }
}
