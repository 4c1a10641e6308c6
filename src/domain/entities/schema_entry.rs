use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::TableSchema;
use crate::domain::value_objects::{FileHash, TableStatus};

/// One table in the schema registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    schema: TableSchema,
    description: String,
    pdf_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_hash: Option<FileHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    created_at: DateTime<Utc>,
    status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows_stored: Option<usize>,
}

impl SchemaEntry {
    pub fn new(
        schema: TableSchema,
        description: String,
        pdf_uuid: String,
        file_hash: Option<FileHash>,
        filename: Option<String>,
    ) -> Self {
        Self {
            schema,
            description,
            pdf_uuid,
            file_hash,
            filename,
            created_at: Utc::now(),
            status: TableStatus::Processing,
            rows_stored: None,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn file_hash(&self) -> Option<&FileHash> {
        self.file_hash.as_ref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn status(&self) -> &TableStatus {
        &self.status
    }

    pub fn rows_stored(&self) -> Option<usize> {
        self.rows_stored
    }

    pub fn complete(&mut self, description: String, rows_stored: usize) -> Result<(), String> {
        let next = TableStatus::Complete;
        if !self.status.can_transition_to(&next) {
            return Err(format!("Cannot complete a table in {} state", self.status));
        }
        self.status = next;
        self.description = description;
        self.rows_stored = Some(rows_stored);
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        let next = TableStatus::Failed(error);
        if !self.status.can_transition_to(&next) {
            return Err(format!("Cannot fail a table in {} state", self.status));
        }
        self.status = next;
        Ok(())
    }
}
