use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::entities::TableSchema;
use crate::domain::value_objects::{CellValue, SelectStatement, SqlIdentifier};

#[derive(Debug)]
pub enum TableRepositoryError {
    DatabaseError(String),
    InvalidQuery(String),
    ValidationError(String),
}

impl std::fmt::Display for TableRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            TableRepositoryError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            TableRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for TableRepositoryError {}

/// Rows returned by a read-only query, keys in select-list order.
#[derive(Debug, Clone, Default)]
pub struct QueryRows {
    pub rows: Vec<Map<String, Value>>,
}

impl QueryRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DropSummary {
    pub tables_dropped: Vec<String>,
    pub tables_failed: Vec<String>,
}

/// Relational store for tables extracted from PDFs.
#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn create_table(
        &self,
        name: &SqlIdentifier,
        schema: &TableSchema,
    ) -> Result<(), TableRepositoryError>;

    async fn insert_rows(
        &self,
        name: &SqlIdentifier,
        schema: &TableSchema,
        rows: &[Vec<CellValue>],
    ) -> Result<usize, TableRepositoryError>;

    /// Runs a single SELECT in a read-only transaction.
    async fn run_select(
        &self,
        statement: &SelectStatement,
    ) -> Result<QueryRows, TableRepositoryError>;

    async fn list_tables(&self) -> Result<Vec<String>, TableRepositoryError>;

    async fn drop_all_tables(&self) -> Result<DropSummary, TableRepositoryError>;

    async fn database_name(&self) -> Result<String, TableRepositoryError>;

    async fn health_check(&self) -> Result<bool, TableRepositoryError>;
}
