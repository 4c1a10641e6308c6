use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::ports::document_extractor::ExtractedDocument;
use crate::application::services::schema_inference::SchemaInferenceService;
use crate::domain::entities::{SchemaEntry, TableContext, TableInfo};
use crate::domain::repositories::{SchemaRegistry, TableRepository};
use crate::domain::value_objects::{CellValue, FileHash};
use crate::infrastructure::external_services::semantic_chunking::sentence_chunks;

const CONTEXT_WINDOW_CHARS: usize = 400;

#[derive(Debug)]
pub enum TableIngestionError {
    RegistryError(String),
    RepositoryError(String),
}

impl std::fmt::Display for TableIngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableIngestionError::RegistryError(msg) => write!(f, "Schema registry error: {}", msg),
            TableIngestionError::RepositoryError(msg) => write!(f, "Table store error: {}", msg),
        }
    }
}

impl std::error::Error for TableIngestionError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTableSummary {
    pub name: String,
    pub rows: usize,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub text_chunks: Vec<String>,
    pub tables_info: Vec<StoredTableSummary>,
    pub schemas_saved: usize,
    pub pdf_name: String,
    pub pdf_uuid: String,
}

/// Turns the table grids of an extracted PDF into typed relational tables,
/// stitching grids that continue across pages.
pub struct TableIngestionService {
    inference: Arc<SchemaInferenceService>,
    table_repository: Arc<dyn TableRepository>,
    schema_registry: Arc<dyn SchemaRegistry>,
}

impl TableIngestionService {
    pub fn new(
        inference: Arc<SchemaInferenceService>,
        table_repository: Arc<dyn TableRepository>,
        schema_registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            inference,
            table_repository,
            schema_registry,
        }
    }

    pub async fn ingest(
        &self,
        document: &ExtractedDocument,
        filename: &str,
        file_hash: Option<FileHash>,
    ) -> Result<IngestionReport, TableIngestionError> {
        let pdf_uuid = Uuid::new_v4().simple().to_string()[..8].to_string();
        let pdf_name = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());

        info!("Starting table extraction for {} ({})", filename, pdf_uuid);

        let mut taken = self.taken_names().await?;
        let mut text_chunks = Vec::new();
        let mut stored_tables = Vec::new();
        let mut current: Option<TableInfo> = None;
        let mut opened = 0usize;

        for page in &document.pages {
            text_chunks.extend(sentence_chunks(&page.text));

            for raw_grid in &page.tables {
                let Some(grid) = clean_grid(raw_grid) else {
                    continue;
                };

                info!(
                    "Processing table on page {}: {} rows x {} columns",
                    page.number,
                    grid.len(),
                    grid[0].len()
                );

                if let Some(open) = current.as_mut() {
                    if grid[0].len() == open.column_count()
                        && self.inference.is_continuation(open, &grid).await
                    {
                        open.extend_rows(grid);
                        continue;
                    }
                }

                if let Some(finished) = current.take() {
                    if let Some(summary) = self.store_table(finished).await? {
                        stored_tables.push(summary);
                    }
                }

                opened += 1;
                let inferred = self.inference.infer_schema(&grid, &pdf_uuid, opened).await;
                let name = inferred
                    .table_name
                    .with_unique_suffix(|candidate| taken.contains(candidate));
                taken.insert(name.as_str().to_string());

                let entry = SchemaEntry::new(
                    inferred.schema.clone(),
                    inferred.description.clone(),
                    pdf_uuid.clone(),
                    file_hash.clone(),
                    Some(filename.to_string()),
                );
                self.schema_registry
                    .upsert(name.as_str(), &entry)
                    .await
                    .map_err(|e| TableIngestionError::RegistryError(e.to_string()))?;
                info!("Saved initial schema for {}", name);

                current = Some(TableInfo::new(
                    name,
                    inferred.schema,
                    inferred.description,
                    grid,
                    context_around_midpoint(&page.text),
                ));
            }
        }

        if let Some(finished) = current.take() {
            if let Some(summary) = self.store_table(finished).await? {
                stored_tables.push(summary);
            }
        }

        info!(
            "Table extraction complete for {}: {} text chunks, {} tables stored",
            filename,
            text_chunks.len(),
            stored_tables.len()
        );

        Ok(IngestionReport {
            text_chunks,
            schemas_saved: stored_tables.len(),
            tables_info: stored_tables,
            pdf_name,
            pdf_uuid,
        })
    }

    async fn taken_names(&self) -> Result<HashSet<String>, TableIngestionError> {
        let mut taken: HashSet<String> = self
            .schema_registry
            .raw_entries()
            .await
            .map_err(|e| TableIngestionError::RegistryError(e.to_string()))?
            .keys()
            .cloned()
            .collect();

        match self.table_repository.list_tables().await {
            Ok(tables) => taken.extend(tables),
            Err(e) => warn!("Could not list existing tables: {}", e),
        }

        Ok(taken)
    }

    /// Creates and fills the table, then completes or fails its registry entry.
    /// Store failures are recorded on the entry and yield `None`.
    async fn store_table(
        &self,
        mut table: TableInfo,
    ) -> Result<Option<StoredTableSummary>, TableIngestionError> {
        let name = table.name().clone();
        info!("Storing table: {}", name);

        if table.row_count() == 0 {
            warn!("Table {} has no data rows", name);
            self.mark_failed(&table, "No data rows to store".to_string())
                .await?;
            return Ok(None);
        }

        let rows = table.typed_rows();
        let stored = match self.write_rows(&table, &rows).await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to store table {}: {}", name, e);
                self.mark_failed(&table, e.to_string()).await?;
                return Ok(None);
            }
        };

        let description = self.inference.describe_table(&table, stored).await;
        table.set_description(description.clone());

        let mut entry = self.entry_for(&table).await?;
        if let Err(e) = entry.complete(description.clone(), stored) {
            warn!("Registry entry for {} not updated: {}", name, e);
        }
        self.schema_registry
            .upsert(name.as_str(), &entry)
            .await
            .map_err(|e| TableIngestionError::RegistryError(e.to_string()))?;

        info!("Stored {} rows in {}", stored, name);
        Ok(Some(StoredTableSummary {
            name: name.to_string(),
            rows: stored,
            description,
        }))
    }

    async fn write_rows(
        &self,
        table: &TableInfo,
        rows: &[Vec<CellValue>],
    ) -> Result<usize, TableIngestionError> {
        self.table_repository
            .create_table(table.name(), table.schema())
            .await
            .map_err(|e| TableIngestionError::RepositoryError(e.to_string()))?;

        self.table_repository
            .insert_rows(table.name(), table.schema(), rows)
            .await
            .map_err(|e| TableIngestionError::RepositoryError(e.to_string()))
    }

    async fn entry_for(&self, table: &TableInfo) -> Result<SchemaEntry, TableIngestionError> {
        let existing = self
            .schema_registry
            .get(table.name().as_str())
            .await
            .map_err(|e| TableIngestionError::RegistryError(e.to_string()))?;

        Ok(existing.unwrap_or_else(|| {
            SchemaEntry::new(
                table.schema().clone(),
                table.description().to_string(),
                String::new(),
                None,
                None,
            )
        }))
    }

    async fn mark_failed(&self, table: &TableInfo, reason: String) -> Result<(), TableIngestionError> {
        let mut entry = self.entry_for(table).await?;
        if let Err(e) = entry.fail(reason) {
            warn!("Registry entry for {} not updated: {}", table.name(), e);
            return Ok(());
        }
        self.schema_registry
            .upsert(table.name().as_str(), &entry)
            .await
            .map_err(|e| TableIngestionError::RegistryError(e.to_string()))
    }
}

/// Trims cells, drops blank rows and pads to a rectangle. Grids with fewer
/// rows than columns are transposed.
pub fn clean_grid(grid: &[Vec<String>]) -> Option<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = grid
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.is_empty() || width == 0 {
        return None;
    }
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }

    if rows.len() < width {
        rows = (0..width)
            .map(|col| rows.iter().map(|row| row[col].clone()).collect())
            .collect();
    }

    Some(rows)
}

/// Page text within `CONTEXT_WINDOW_CHARS` on each side of the midpoint.
pub fn context_around_midpoint(text: &str) -> TableContext {
    let chars: Vec<char> = text.chars().collect();
    let mid = chars.len() / 2;
    let start = mid.saturating_sub(CONTEXT_WINDOW_CHARS);
    let end = (mid + CONTEXT_WINDOW_CHARS).min(chars.len());

    TableContext {
        before: chars[start..mid].iter().collect::<String>().trim().to_string(),
        after: chars[mid..end].iter().collect::<String>().trim().to_string(),
    }
}
