use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::repositories::{SchemaRegistry, TableRepository, VectorRepository};

#[derive(Debug, Clone, Default, Serialize)]
pub struct VectorStoreSummary {
    pub available: bool,
    pub vector_count: i64,
    pub index_exists: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseSummary {
    pub available: bool,
    pub table_count: usize,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSchemaSummary {
    pub available: bool,
    pub schema_count: usize,
    pub file_exists: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataTotals {
    pub total_vectors: i64,
    pub total_tables: usize,
    pub total_schemas: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataSummaryResponse {
    pub vector_store: VectorStoreSummary,
    pub database: DatabaseSummary,
    pub table_schema: TableSchemaSummary,
    pub totals: DataTotals,
}

/// Counts what is currently held in each store. Unreachable stores are
/// reported as unavailable rather than failing the summary.
pub struct DataSummaryUseCase {
    vector_repository: Arc<dyn VectorRepository>,
    table_repository: Arc<dyn TableRepository>,
    schema_registry: Arc<dyn SchemaRegistry>,
}

impl DataSummaryUseCase {
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

    pub async fn execute(&self) -> DataSummaryResponse {
        info!("Getting data summary");
        let mut summary = DataSummaryResponse::default();

        let (vector_stats, tables, file_exists, entries) = futures::join!(
            self.vector_repository.stats(),
            self.table_repository.list_tables(),
            self.schema_registry.exists(),
            self.schema_registry.raw_entries(),
        );

        match vector_stats {
            Ok(stats) => {
                summary.vector_store = VectorStoreSummary {
                    available: true,
                    vector_count: stats.vector_count,
                    index_exists: stats.index_exists,
                };
            }
            Err(e) => error!("Error getting vector store summary: {}", e),
        }

        match tables {
            Ok(tables) => {
                summary.database = DatabaseSummary {
                    available: true,
                    table_count: tables.len(),
                    tables,
                };
            }
            Err(e) => error!("Error getting database summary: {}", e),
        }

        match entries {
            Ok(entries) => {
                summary.table_schema = TableSchemaSummary {
                    available: true,
                    schema_count: entries.len(),
                    file_exists,
                };
            }
            Err(e) => {
                error!("Error getting table schema summary: {}", e);
                summary.table_schema.file_exists = file_exists;
            }
        }

        summary.totals = DataTotals {
            total_vectors: summary.vector_store.vector_count,
            total_tables: summary.database.table_count,
            total_schemas: summary.table_schema.schema_count,
        };
        summary
    }
}
