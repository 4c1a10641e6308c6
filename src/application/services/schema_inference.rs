use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::GenerationRequest;
use crate::application::services::llm_reply::parse_json_object;
use crate::domain::entities::{ColumnDef, TableInfo, TableSchema};
use crate::domain::value_objects::{ColumnType, SqlIdentifier, dedupe_columns};

const CONTEXT_PROMPT_CHARS: usize = 200;

/// Schema proposed for a freshly detected table.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredSchema {
    pub table_name: SqlIdentifier,
    pub schema: TableSchema,
    pub description: String,
    pub from_fallback: bool,
}

/// LLM-backed table analysis: schema inference, continuation checks and
/// descriptions. Every call degrades to a heuristic when the model fails.
pub struct SchemaInferenceService {
    language_model: Arc<dyn LanguageModel>,
}

impl SchemaInferenceService {
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }

    pub async fn infer_schema(
        &self,
        grid: &[Vec<String>],
        pdf_uuid: &str,
        table_index: usize,
    ) -> InferredSchema {
        let prompt = schema_prompt(grid, pdf_uuid);
        let reply = match self
            .language_model
            .generate(GenerationRequest::new(prompt))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Schema inference failed, using header fallback: {}", e);
                return fallback_schema(grid, pdf_uuid, table_index);
            }
        };

        match parse_schema_reply(&reply, grid) {
            Some(inferred) => {
                info!(
                    "Inferred schema for {} with {} columns",
                    inferred.table_name,
                    inferred.schema.len()
                );
                inferred
            }
            None => {
                warn!("Could not parse schema reply, using header fallback");
                debug!("Unparsed schema reply: {}", reply);
                fallback_schema(grid, pdf_uuid, table_index)
            }
        }
    }

    /// Asks whether `grid` continues `current`. Any failure means "new table".
    pub async fn is_continuation(&self, current: &TableInfo, grid: &[Vec<String>]) -> bool {
        let prompt = continuation_prompt(current, grid);
        let reply = match self
            .language_model
            .generate(GenerationRequest::new(prompt))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Continuation check failed, assuming new table: {}", e);
                return false;
            }
        };

        let Some(value) = parse_json_object(&reply) else {
            warn!("Continuation reply was not JSON, assuming new table");
            return false;
        };

        let status = value.get("status").and_then(|s| s.as_bool()).unwrap_or(false);
        if status {
            info!("Grid continues table {}", current.name());
        } else {
            let reason = value
                .get("reason")
                .and_then(|r| r.as_str())
                .unwrap_or("No reason provided");
            info!("Table not a continuation: {}", reason);
        }
        status
    }

    pub async fn describe_table(&self, table: &TableInfo, rows_stored: usize) -> String {
        let prompt = description_prompt(table, rows_stored);
        match self
            .language_model
            .generate(GenerationRequest::new(prompt))
            .await
        {
            Ok(reply) => {
                let description = reply.replace("```", "").trim().to_string();
                if description.is_empty() {
                    fallback_description(table, rows_stored)
                } else {
                    description
                }
            }
            Err(e) => {
                warn!("Failed to generate detailed description: {}", e);
                fallback_description(table, rows_stored)
            }
        }
    }
}

fn tab_rows(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn schema_prompt(grid: &[Vec<String>], pdf_uuid: &str) -> String {
    let preview = tab_rows(&grid[..grid.len().min(3)]);
    format!(
        r#"Analyze this table data and provide schema information in JSON format.

Table Preview (first 3 rows):
{preview}

Please provide a JSON response with:
1. table_name: A descriptive name for this table (use format: pdf_{pdf_uuid}_descriptive_name)
2. table_schema: Object mapping column names to SQL types (use: "string", "integer", "float", "text", "currency", "percentage")
3. description: "TBD" (will be generated later with full data)

Schema type guidelines:
- "currency": For monetary values (e.g., $4.34, €10.50, ¥1000)
- "percentage": For percentage values (e.g., 25%, 0.15%)
- "float": For plain decimal numbers
- "integer": For whole numbers
- "string": For text data
- "text": For longer text content

Example response:
{{
    "table_name": "pdf_{pdf_uuid}_financial_summary",
    "table_schema": {{
        "year": "integer",
        "revenue": "currency",
        "profit_margin": "percentage",
        "description": "text"
    }},
    "description": "Financial summary table showing yearly revenue and profit margins"
}}

Respond with valid JSON only:"#
    )
}

fn continuation_prompt(current: &TableInfo, grid: &[Vec<String>]) -> String {
    let headers: Vec<String> = current
        .schema()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut current_rows = vec![headers];
    current_rows.extend(current.data_rows().iter().take(3).cloned());
    let current_preview = tab_rows(&current_rows);
    let new_preview = tab_rows(&grid[..grid.len().min(3)]);

    format!(
        r#"Determine if this new table data is a continuation of the previous table.

Current table (headers + top 3 data rows):
{current_preview}

New table preview (first 3 rows):
{new_preview}

Analyze if this is a continuation (same structure, no headers) or a new table.

Respond with JSON only:
- If it's a continuation: {{"status": true}}
- If it's a new table: {{"status": false, "reason": "explain why it's not a continuation"}}

Examples:
- Same column count, data rows only: {{"status": true}}
- Different column count: {{"status": false, "reason": "Column count mismatch"}}
- Different data structure: {{"status": false, "reason": "Data structure differs from previous table"}}

JSON response:"#
    )
}

fn truncate_context(text: &str) -> String {
    if text.chars().count() > CONTEXT_PROMPT_CHARS {
        let cut: String = text.chars().take(CONTEXT_PROMPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn description_prompt(table: &TableInfo, rows_stored: usize) -> String {
    let headers: Vec<String> = table
        .schema()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut display = vec![headers.clone()];
    display.extend(table.preview_rows());
    let preview = tab_rows(&display);

    let schema_text = table
        .schema()
        .columns()
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.column_type.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let context = table.context();
    let context_section = if context.before.is_empty() && context.after.is_empty() {
        String::new()
    } else {
        format!(
            "SURROUNDING CONTEXT:\nText before table: {}\nText after table: {}\n",
            truncate_context(&context.before),
            truncate_context(&context.after)
        )
    };

    format!(
        r#"Generate a comprehensive table description for database query generation. This description will help an LLM choose the correct table and generate accurate SQL queries.

TABLE INFORMATION:
Table Name: {name}
Total Rows Stored: {rows_stored}
Column Count: {column_count}

SCHEMA DETAILS:
{schema_text}

SAMPLE DATA:
{preview}

{context_section}
Provide a clear, concise and simple description that would help an LLM understand when and how to use this table for query generation:"#,
        name = table.name(),
        column_count = headers.len(),
    )
}

/// Used when the model cannot describe a stored table.
pub fn fallback_description(table: &TableInfo, rows_stored: usize) -> String {
    let names = table.schema().column_names();
    let schema = serde_json::to_string(table.schema()).unwrap_or_default();
    format!(
        "Table: {}\nColumns: {}\nTotal Rows: {}\nPurpose: Data table with {} columns containing structured information.\nSchema: {}",
        table.name(),
        names.join(", "),
        rows_stored,
        names.len(),
        schema
    )
}

/// Header-derived schema with every column typed as `string`.
pub fn fallback_schema(grid: &[Vec<String>], pdf_uuid: &str, table_index: usize) -> InferredSchema {
    let headers: Vec<String> = grid
        .first()
        .map(|row| {
            row.iter()
                .map(|h| h.trim().to_lowercase().replace(' ', "_"))
                .collect()
        })
        .unwrap_or_default();

    let table_name = SqlIdentifier::for_table(pdf_uuid, table_index);

    InferredSchema {
        table_name,
        schema: TableSchema::all_strings(dedupe_columns(&headers)),
        description: "Auto-generated table schema".to_string(),
        from_fallback: true,
    }
}

/// Reads `{table_name, table_schema, description}`. A schema whose width
/// differs from the grid is replaced by the header columns.
fn parse_schema_reply(reply: &str, grid: &[Vec<String>]) -> Option<InferredSchema> {
    let value = parse_json_object(reply)?;
    let table_name = value
        .get("table_name")
        .and_then(|n| n.as_str())
        .and_then(SqlIdentifier::sanitize)?;
    let raw_schema = value.get("table_schema").and_then(|s| s.as_object())?;
    if raw_schema.is_empty() {
        return None;
    }

    let description = value
        .get("description")
        .and_then(|d| d.as_str())
        .unwrap_or("TBD")
        .to_string();

    let width = grid.first().map(|row| row.len()).unwrap_or(0);
    let schema = if raw_schema.len() == width || width == 0 {
        let names: Vec<&str> = raw_schema.keys().map(String::as_str).collect();
        let columns = dedupe_columns(&names)
            .into_iter()
            .zip(raw_schema.values())
            .map(|(name, ty)| ColumnDef {
                name,
                column_type: ColumnType::from_string_lossy(ty.as_str().unwrap_or("string")),
            })
            .collect();
        TableSchema::new(columns)
    } else {
        warn!(
            "Model returned {} columns for a {}-column grid, typing header columns as string",
            raw_schema.len(),
            width
        );
        let headers: Vec<String> = grid[0]
            .iter()
            .map(|h| h.trim().to_lowercase().replace(' ', "_"))
            .collect();
        TableSchema::all_strings(dedupe_columns(&headers))
    };

    Some(InferredSchema {
        table_name,
        schema,
        description,
        from_fallback: false,
    })
}
