use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::GenerationRequest;
use crate::application::services::llm_reply::strip_code_fences;
use crate::domain::repositories::table_repository::QueryRows;
use crate::domain::repositories::{SchemaRegistry, TableRepository};
use crate::domain::value_objects::SelectStatement;

const CANNOT_GENERATE: &str = "Cannot generate SQL";

const SQL_PROMPT: &str = r#"You are an expert SQL query generator for PostgreSQL. Generate a valid SQL SELECT query based on the provided database schema and user query, supporting multiple table joins.

Guidelines:
- Use only tables and columns defined in the schema.
- Table and column names are lowercase identifiers (e.g., 'pdf_9aec543c_player_stats'); wrap them in double quotes.
- Map schema data types: 'string' to VARCHAR, 'integer' to BIGINT, 'float', 'currency' and 'percentage' to DOUBLE PRECISION, 'text' to TEXT.
- Use INNER JOIN for queries requiring data from multiple tables where all conditions must be met, and LEFT JOIN for queries including all records from the primary table.
- Identify relationships using common columns (e.g., 'player_id').
- Ensure syntactically correct and optimized PostgreSQL queries.
- Only generate SELECT queries, no INSERT, UPDATE, or DELETE.
- If the query cannot be answered, return 'Cannot generate SQL for this query' and explain why in a comment.
- Return only the SQL query, without explanations, unless specified.
- Format the query for readability with proper indentation.

Example:
Schema:
{
  "tables": {
    "table1": {
      "columns": {"id": "string", "name": "string"}
    },
    "table2": {
      "columns": {"id": "string", "table1_id": "string", "date": "string"}
    }
  }
}
Query: 'List names and dates for records in both tables'
SQL:
SELECT "table1"."name", "table2"."date"
FROM "table1"
INNER JOIN "table2" ON "table1"."id" = "table2"."table1_id";

"#;

#[derive(Debug)]
pub enum TableAgentError {
    SchemaUnavailable(String),
    Unanswerable(String),
    DatabaseError(String),
}

impl std::fmt::Display for TableAgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableAgentError::SchemaUnavailable(msg) => write!(f, "Schema unavailable: {}", msg),
            TableAgentError::Unanswerable(msg) => write!(f, "Unanswerable query: {}", msg),
            TableAgentError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TableAgentError {}

impl TableAgentError {
    /// The reply shown to the user for this failure.
    pub fn user_message(&self, query: &str) -> String {
        match self {
            TableAgentError::SchemaUnavailable(_) => {
                format!("Error: Could not load schema for query: {}", query)
            }
            TableAgentError::Unanswerable(_) => {
                format!("Unable to process data query: {}", query)
            }
            TableAgentError::DatabaseError(_) => {
                format!("Database error while processing query: {}", query)
            }
        }
    }
}

/// Answers data questions by generating SQL over the registered PDF tables.
pub struct TableAgent {
    llm: Arc<dyn LanguageModel>,
    table_repository: Arc<dyn TableRepository>,
    schema_registry: Arc<dyn SchemaRegistry>,
}

impl TableAgent {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        table_repository: Arc<dyn TableRepository>,
        schema_registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            llm,
            table_repository,
            schema_registry,
        }
    }

    /// Never fails: problems are reported as a user-facing reply.
    pub async fn process_query(&self, query: &str) -> String {
        info!("Table agent processing query: {}", query);
        match self.try_process(query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Table agent could not answer: {}", e);
                e.user_message(query)
            }
        }
    }

    async fn try_process(&self, query: &str) -> Result<String, TableAgentError> {
        let schema = self.schema_context().await?;
        let statement = self.generate_sql(query, &schema).await?;
        debug!("Executing generated SQL: {}", statement);

        let rows = self
            .table_repository
            .run_select(&statement)
            .await
            .map_err(|e| {
                error!("SQL execution failed: {}", e);
                TableAgentError::DatabaseError(e.to_string())
            })?;

        if rows.is_empty() {
            warn!("No results returned for query: {}", statement);
            return Ok(format!("No results found for query: {}", query));
        }

        Ok(format_results(&rows, &statement, query))
    }

    /// The registry as `{"tables": {name: {columns, description}}}`. Failed
    /// tables are left out since they were never stored.
    pub async fn schema_context(&self) -> Result<Value, TableAgentError> {
        let entries = self
            .schema_registry
            .entries()
            .await
            .map_err(|e| TableAgentError::SchemaUnavailable(e.to_string()))?;

        let mut tables = Map::new();
        for (name, entry) in entries {
            if entry.status().is_failed() || entry.schema().is_empty() {
                continue;
            }
            tables.insert(
                name,
                json!({
                    "columns": entry.schema(),
                    "description": entry.description(),
                }),
            );
        }

        if tables.is_empty() {
            return Err(TableAgentError::SchemaUnavailable(
                "no tables registered".to_string(),
            ));
        }

        Ok(json!({ "tables": tables }))
    }

    async fn generate_sql(
        &self,
        query: &str,
        schema: &Value,
    ) -> Result<SelectStatement, TableAgentError> {
        let schema_json = serde_json::to_string_pretty(schema)
            .map_err(|e| TableAgentError::SchemaUnavailable(e.to_string()))?;
        let system_prompt = format!(
            "{}Schema:\n{}\n\nUser Query: {}\n",
            SQL_PROMPT, schema_json, query
        );

        let request = GenerationRequest::new(format!("Generate SQL for query: {}", query))
            .with_system(system_prompt)
            .with_temperature(0.1);

        let reply = self.llm.generate(request).await.map_err(|e| {
            error!("Error generating SQL query: {}", e);
            TableAgentError::Unanswerable(e.to_string())
        })?;

        let sql = strip_code_fences(&reply, "sql");
        if sql.contains(CANNOT_GENERATE) {
            return Err(TableAgentError::Unanswerable(sql.to_string()));
        }

        SelectStatement::parse(sql).map_err(TableAgentError::Unanswerable)
    }
}

/// Renders rows for the combiner. A single aggregate value becomes one line,
/// anything else a markdown table.
pub fn format_results(rows: &QueryRows, statement: &SelectStatement, query: &str) -> String {
    let headers = rows.columns();

    if statement.is_aggregation() && rows.rows.len() == 1 && headers.len() == 1 {
        let key = &headers[0];
        let value = rows.rows[0].get(key).map(render_cell).unwrap_or_default();
        return format!("Result for '{}': {} = {}", query, key, value);
    }

    let mut output = vec![format!("Results for query: {}\n", query)];
    output.push(format!("| {} |", headers.join(" | ")));
    output.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));

    for row in &rows.rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(render_cell).unwrap_or_default())
            .collect();
        output.push(format!("| {} |", cells.join(" | ")));
    }

    output.join("\n")
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
