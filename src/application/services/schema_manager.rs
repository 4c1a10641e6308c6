use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::SchemaRegistry;
use crate::domain::repositories::schema_registry::SchemaRegistryError;
use crate::domain::value_objects::ColumnType;

pub const DEFAULT_CLEANUP_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct TableListing {
    pub table_name: String,
    pub description: String,
    pub schema: Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSearchHit {
    pub table_name: String,
    pub description: String,
    pub schema: Value,
    pub match_reason: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaSummary {
    pub total_tables: usize,
    pub unique_files: usize,
    pub column_type_distribution: BTreeMap<String, usize>,
    pub schema_file_size: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ValidationReport {
    pub missing_fields: Vec<String>,
    pub invalid_types: Vec<String>,
    pub empty_schemas: Vec<String>,
    pub malformed_entries: Vec<String>,
}

impl ValidationReport {
    pub fn issue_count(&self) -> usize {
        self.missing_fields.len()
            + self.invalid_types.len()
            + self.empty_schemas.len()
            + self.malformed_entries.len()
    }

    pub fn is_valid(&self) -> bool {
        self.issue_count() == 0
    }
}

#[derive(Debug, Clone)]
pub enum CleanupPolicy {
    OlderThanDays(i64),
    KeepFileHashes(Vec<String>),
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        CleanupPolicy::OlderThanDays(DEFAULT_CLEANUP_DAYS)
    }
}

/// Read and maintenance operations over the raw schema registry. Entries are
/// handled as JSON so hand-edited or legacy records stay visible.
pub struct SchemaManagerService {
    registry: Arc<dyn SchemaRegistry>,
}

fn text_field(entry: &Value, field: &str) -> String {
    entry
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn schema_field(entry: &Value) -> Value {
    entry
        .get("schema")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

impl SchemaManagerService {
    pub fn new(registry: Arc<dyn SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub async fn all_schemas(&self) -> Result<Map<String, Value>, SchemaRegistryError> {
        self.registry.raw_entries().await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, SchemaRegistryError> {
        Ok(self.registry.raw_entries().await?.keys().cloned().collect())
    }

    pub async fn get_schema(&self, table_name: &str) -> Result<Option<Value>, SchemaRegistryError> {
        Ok(self.registry.raw_entries().await?.get(table_name).cloned())
    }

    pub async fn tables_by_file(
        &self,
        file_hash: &str,
    ) -> Result<Vec<TableListing>, SchemaRegistryError> {
        Ok(self
            .registry
            .raw_entries()
            .await?
            .iter()
            .filter(|(_, entry)| entry.get("file_hash").and_then(Value::as_str) == Some(file_hash))
            .map(|(name, entry)| TableListing {
                table_name: name.clone(),
                description: text_field(entry, "description"),
                schema: schema_field(entry),
                created_at: text_field(entry, "created_at"),
            })
            .collect())
    }

    /// Case-insensitive match on the table name, then the description.
    pub async fn search_tables(
        &self,
        keyword: &str,
    ) -> Result<Vec<TableSearchHit>, SchemaRegistryError> {
        let keyword = keyword.to_lowercase();
        let mut hits = Vec::new();

        for (name, entry) in self.registry.raw_entries().await? {
            let description = text_field(&entry, "description");
            let match_reason = if name.to_lowercase().contains(&keyword) {
                "name"
            } else if description.to_lowercase().contains(&keyword) {
                "description"
            } else {
                continue;
            };

            hits.push(TableSearchHit {
                schema: schema_field(&entry),
                table_name: name,
                description,
                match_reason,
            });
        }

        Ok(hits)
    }

    pub async fn summary(&self) -> Result<SchemaSummary, SchemaRegistryError> {
        let entries = self.registry.raw_entries().await?;
        let mut files = BTreeSet::new();
        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();

        for entry in entries.values() {
            if let Some(hash) = entry.get("file_hash").and_then(Value::as_str) {
                files.insert(hash.to_string());
            }
            if let Some(schema) = entry.get("schema").and_then(Value::as_object) {
                for column_type in schema.values() {
                    let key = column_type.as_str().unwrap_or("unknown").to_string();
                    *distribution.entry(key).or_insert(0) += 1;
                }
            }
        }

        Ok(SchemaSummary {
            total_tables: entries.len(),
            unique_files: files.len(),
            column_type_distribution: distribution,
            schema_file_size: self.registry.file_size().await,
        })
    }

    pub async fn validate(&self) -> Result<ValidationReport, SchemaRegistryError> {
        let mut report = ValidationReport::default();

        for (name, entry) in self.registry.raw_entries().await? {
            let Some(fields) = entry.as_object() else {
                report.malformed_entries.push(name);
                continue;
            };

            let missing: Vec<&str> = ["schema", "description"]
                .into_iter()
                .filter(|field| !fields.contains_key(*field))
                .collect();
            if !missing.is_empty() {
                report
                    .missing_fields
                    .push(format!("{}: missing {}", name, missing.join(", ")));
            }

            match fields.get("schema").and_then(Value::as_object) {
                Some(schema) if !schema.is_empty() => {
                    for (column, column_type) in schema {
                        let raw = match column_type.as_str() {
                            Some(raw) => raw.to_string(),
                            None => column_type.to_string(),
                        };
                        if ColumnType::from_string(&raw).is_err() {
                            report
                                .invalid_types
                                .push(format!("{}.{}: {}", name, column, raw));
                        }
                    }
                }
                _ => report.empty_schemas.push(name),
            }
        }

        Ok(report)
    }

    /// Removes matching entries and returns how many were dropped. Entries
    /// whose timestamp cannot be parsed survive an age-based cleanup.
    pub async fn cleanup(&self, policy: CleanupPolicy) -> Result<usize, SchemaRegistryError> {
        let entries = self.registry.raw_entries().await?;
        let before = entries.len();

        let kept: Map<String, Value> = match &policy {
            CleanupPolicy::OlderThanDays(days) => {
                let cutoff = Utc::now() - Duration::days(*days);
                entries
                    .into_iter()
                    .filter(|(_, entry)| {
                        entry
                            .get("created_at")
                            .and_then(Value::as_str)
                            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                            .map(|created| created.with_timezone(&Utc) >= cutoff)
                            .unwrap_or(true)
                    })
                    .collect()
            }
            CleanupPolicy::KeepFileHashes(hashes) => entries
                .into_iter()
                .filter(|(_, entry)| {
                    entry
                        .get("file_hash")
                        .and_then(Value::as_str)
                        .map(|hash| hashes.iter().any(|keep| keep == hash))
                        .unwrap_or(false)
                })
                .collect(),
        };

        let removed = before - kept.len();
        if removed > 0 {
            self.registry.replace_all(kept).await?;
            info!("Cleaned up {} schemas", removed);
        }
        Ok(removed)
    }

    pub async fn backup(&self) -> Result<String, SchemaRegistryError> {
        let path = self.registry.backup().await?;
        info!("Schemas backed up to {}", path);
        Ok(path)
    }

    pub async fn restore(&self, path: &str) -> Result<usize, SchemaRegistryError> {
        let restored = self.registry.restore(path).await?;
        info!("Restored {} schemas from {}", restored, path);
        Ok(restored)
    }

    pub async fn export_markdown(&self) -> Result<String, SchemaRegistryError> {
        let entries = self.registry.raw_entries().await?;
        let summary = self.summary().await?;
        Ok(render_markdown(&entries, &summary, Utc::now()))
    }
}

fn sql_type_label(column_type: &str) -> String {
    match ColumnType::from_string(column_type) {
        Ok(ty) => ty.sql_type().to_string(),
        Err(_) => column_type.to_uppercase(),
    }
}

fn render_markdown(
    entries: &Map<String, Value>,
    summary: &SchemaSummary,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Table Schema Documentation\n");
    let _ = writeln!(
        out,
        "Generated on: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- **Total Tables**: {}", summary.total_tables);
    let _ = writeln!(out, "- **Unique Files Processed**: {}", summary.unique_files);
    let _ = writeln!(out, "- **Schema File Size**: {} bytes\n", summary.schema_file_size);

    let _ = writeln!(out, "### Column Type Distribution\n");
    for (column_type, count) in &summary.column_type_distribution {
        let description = ColumnType::from_string(column_type)
            .map(|ty| ty.description())
            .unwrap_or("Unknown type");
        let _ = writeln!(out, "- **{}**: {} columns - {}", column_type, count, description);
    }

    let _ = writeln!(out, "\n## Data Type Parsing Rules\n");
    let _ = writeln!(out, "### Currency");
    let _ = writeln!(out, "- **Formats**: `$4.34`, `€1,234.56`, `(£5.99)` for negative");
    let _ = writeln!(out, "- **Storage**: Numeric value only (4.34, 1234.56, -5.99)\n");
    let _ = writeln!(out, "### Percentage");
    let _ = writeln!(out, "- **Formats**: `25%`, `12.5%`, or decimal `0.25`");
    let _ = writeln!(out, "- **Storage**: Decimal format (25% → 0.25)\n");

    let _ = writeln!(out, "## Table Schemas\n");
    for (name, entry) in entries {
        let _ = writeln!(out, "### {}\n", name);
        let description = entry
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("No description available");
        let _ = writeln!(out, "{}\n", description);
        let created = entry
            .get("created_at")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        let _ = writeln!(out, "**Created**: {}\n", created);
        if let Some(hash) = entry.get("file_hash").and_then(Value::as_str) {
            let _ = writeln!(out, "**Source File Hash**: `{}`\n", hash);
        }

        let _ = writeln!(out, "**Technical Schema**:\n");
        let _ = writeln!(out, "| Column Name | Data Type | SQL Type |");
        let _ = writeln!(out, "|-------------|-----------|----------|");
        if let Some(schema) = entry.get("schema").and_then(Value::as_object) {
            for (column, column_type) in schema {
                let raw = column_type.as_str().unwrap_or_default();
                let _ = writeln!(out, "| {} | {} | {} |", column, raw, sql_type_label(raw));
            }
        }
        let _ = writeln!(out, "\n---\n");
    }

    out
}
