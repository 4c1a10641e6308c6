use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::repositories::{SchemaRegistry, TableRepository, VectorRepository};

#[derive(Debug, Clone, Serialize)]
pub struct ClearOperation<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub details: T,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VectorClearDetails {
    pub vectors_deleted: i64,
    pub index_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseClearDetails {
    pub tables_dropped: Vec<String>,
    pub tables_failed: Vec<String>,
    pub database_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaClearDetails {
    pub file_path: String,
    pub file_existed: bool,
    pub schemas_cleared: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearOperations {
    pub vector_store: ClearOperation<VectorClearDetails>,
    pub database: ClearOperation<DatabaseClearDetails>,
    pub table_schema: ClearOperation<SchemaClearDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearAllDataResponse {
    pub success: bool,
    pub message: String,
    pub operations: ClearOperations,
}

/// Wipes the vector store, the PDF tables and the schema registry. Each store
/// is cleared independently; one failing does not stop the others.
pub struct ClearAllDataUseCase {
    vector_repository: Arc<dyn VectorRepository>,
    table_repository: Arc<dyn TableRepository>,
    schema_registry: Arc<dyn SchemaRegistry>,
}

impl ClearAllDataUseCase {
    pub fn new(
        vector_repository: Arc<dyn VectorRepository>,
        table_repository: Arc<dyn TableRepository>,
        schema_registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            vector_repository,
            table_repository,
            schema_registry,
        }
    }

    pub async fn execute(&self) -> ClearAllDataResponse {
        info!("Starting complete data clearing operation");

        let operations = ClearOperations {
            vector_store: self.clear_vectors().await,
            database: self.clear_tables().await,
            table_schema: self.clear_registry().await,
        };

        let failed: Vec<&str> = [
            ("Vector Store", operations.vector_store.success),
            ("Database", operations.database.success),
            ("Table Schema", operations.table_schema.success),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect();

        let message = if failed.is_empty() {
            info!("Data clearing operation completed successfully");
            "All data successfully cleared from all storage systems".to_string()
        } else {
            error!("Data clearing operation failed for: {}", failed.join(", "));
            format!("Data clearing failed for: {}", failed.join(", "))
        };

        ClearAllDataResponse {
            success: failed.is_empty(),
            message,
            operations,
        }
    }

    async fn clear_vectors(&self) -> ClearOperation<VectorClearDetails> {
        let mut details = VectorClearDetails {
            index_name: self.vector_repository.index_name(),
            ..Default::default()
        };

        match self.vector_repository.delete_all().await {
            Ok(deleted) => {
                details.vectors_deleted = deleted;
                info!("Cleared {} vectors from {}", deleted, details.index_name);
                ClearOperation {
                    success: true,
                    message: format!("Successfully cleared {} vectors", deleted),
                    details,
                }
            }
            Err(e) => {
                error!("Vector store clearing failed: {}", e);
                ClearOperation {
                    success: false,
                    message: format!("Error clearing vector store: {}", e),
                    details,
                }
            }
        }
    }

    async fn clear_tables(&self) -> ClearOperation<DatabaseClearDetails> {
        let mut details = DatabaseClearDetails {
            database_name: self
                .table_repository
                .database_name()
                .await
                .unwrap_or_default(),
            ..Default::default()
        };

        match self.table_repository.drop_all_tables().await {
            Ok(summary) => {
                details.tables_dropped = summary.tables_dropped;
                details.tables_failed = summary.tables_failed;

                let success = details.tables_failed.is_empty();
                let message = if details.tables_dropped.is_empty() && success {
                    "No tables found in database - nothing to clear".to_string()
                } else if success {
                    format!(
                        "Successfully dropped all {} tables",
                        details.tables_dropped.len()
                    )
                } else {
                    format!(
                        "Dropped {} tables, {} failed",
                        details.tables_dropped.len(),
                        details.tables_failed.len()
                    )
                };
                info!("{}", message);
                ClearOperation {
                    success,
                    message,
                    details,
                }
            }
            Err(e) => {
                error!("Database clearing failed: {}", e);
                ClearOperation {
                    success: false,
                    message: format!("Error clearing database tables: {}", e),
                    details,
                }
            }
        }
    }

    async fn clear_registry(&self) -> ClearOperation<SchemaClearDetails> {
        match self.schema_registry.clear().await {
            Ok(result) => ClearOperation {
                success: true,
                message: format!(
                    "Successfully cleared table schema file ({} schemas removed)",
                    result.schemas_cleared
                ),
                details: SchemaClearDetails {
                    file_path: result.file_path,
                    file_existed: result.file_existed,
                    schemas_cleared: result.schemas_cleared,
                },
            },
            Err(e) => {
                error!("Table schema clearing failed: {}", e);
                ClearOperation {
                    success: false,
                    message: format!("Error clearing table schema file: {}", e),
                    details: SchemaClearDetails {
                        file_path: self.schema_registry.location(),
                        ..Default::default()
                    },
                }
            }
        }
    }
}
