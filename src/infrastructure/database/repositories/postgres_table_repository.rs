use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::domain::entities::TableSchema;
use crate::domain::repositories::table_repository::{
    DropSummary, QueryRows, TableRepository, TableRepositoryError,
};
use crate::domain::value_objects::{CellValue, SelectStatement, SqlIdentifier};
use crate::infrastructure::database::{DbConnection, DbPool, get_connection_from_pool};

/// Postgres schema holding every PDF-derived table.
pub const TABLE_SCHEMA: &str = "pdf_tables";
const INSERT_BATCH_SIZE: usize = 500;
const STATEMENT_TIMEOUT: &str = "30s";

#[derive(QueryableByName)]
struct JsonRows {
    #[diesel(sql_type = Text)]
    rows: String,
}

#[derive(QueryableByName)]
struct NameRow {
    #[diesel(sql_type = Text)]
    name: String,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(name: &str) -> String {
    format!("{}.{}", TABLE_SCHEMA, quote_ident(name))
}

pub fn create_table_sql(name: &SqlIdentifier, schema: &TableSchema) -> String {
    let columns = schema
        .columns()
        .iter()
        .map(|c| format!("{} {}", c.name.quoted(), c.column_type.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified(name.as_str()),
        columns
    )
}

/// One INSERT per batch of rows.
pub fn insert_statements(
    name: &SqlIdentifier,
    schema: &TableSchema,
    rows: &[Vec<CellValue>],
) -> Vec<String> {
    let column_list = schema
        .columns()
        .iter()
        .map(|c| c.name.quoted())
        .collect::<Vec<_>>()
        .join(", ");

    rows.chunks(INSERT_BATCH_SIZE)
        .map(|batch| {
            let values = batch
                .iter()
                .map(|row| {
                    let cells = (0..schema.len())
                        .map(|i| {
                            row.get(i)
                                .map(CellValue::to_sql_literal)
                                .unwrap_or_else(|| "NULL".to_string())
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({})", cells)
                })
                .collect::<Vec<_>>()
                .join(", ");

            format!(
                "INSERT INTO {} ({}) VALUES {}",
                qualified(name.as_str()),
                column_list,
                values
            )
        })
        .collect()
}

/// Wraps a SELECT so Postgres returns every row as one JSON array.
pub fn json_rows_sql(statement: &SelectStatement) -> String {
    format!(
        "SELECT COALESCE(json_agg(t), '[]'::json)::text AS rows FROM ({}) t",
        statement.as_str()
    )
}

pub struct PostgresTableRepository {
    pool: DbPool,
}

impl PostgresTableRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<DbConnection, TableRepositoryError> {
        get_connection_from_pool(&self.pool)
            .map_err(|e| TableRepositoryError::DatabaseError(e.to_string()))
    }
}

fn db_error(e: diesel::result::Error) -> TableRepositoryError {
    TableRepositoryError::DatabaseError(e.to_string())
}

#[async_trait]
impl TableRepository for PostgresTableRepository {
    async fn create_table(
        &self,
        name: &SqlIdentifier,
        schema: &TableSchema,
    ) -> Result<(), TableRepositoryError> {
        if schema.is_empty() {
            return Err(TableRepositoryError::ValidationError(format!(
                "Table {} has no columns",
                name
            )));
        }

        let mut conn = self.connection()?;
        conn.batch_execute(&create_table_sql(name, schema))
            .map_err(db_error)?;

        debug!("Created table {}.{}", TABLE_SCHEMA, name);
        Ok(())
    }

    async fn insert_rows(
        &self,
        name: &SqlIdentifier,
        schema: &TableSchema,
        rows: &[Vec<CellValue>],
    ) -> Result<usize, TableRepositoryError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection()?;
        let statements = insert_statements(name, schema, rows);

        let inserted = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                let mut total = 0;
                for sql in &statements {
                    total += diesel::sql_query(sql).execute(conn)?;
                }
                Ok(total)
            })
            .map_err(db_error)?;

        info!("Inserted {} rows into {}", inserted, name);
        Ok(inserted)
    }

    async fn run_select(
        &self,
        statement: &SelectStatement,
    ) -> Result<QueryRows, TableRepositoryError> {
        let mut conn = self.connection()?;
        let sql = json_rows_sql(statement);

        let result = conn
            .build_transaction()
            .read_only()
            .run::<JsonRows, diesel::result::Error, _>(|conn| {
                conn.batch_execute(&format!(
                    "SET LOCAL search_path TO {}; SET LOCAL statement_timeout = '{}'",
                    TABLE_SCHEMA, STATEMENT_TIMEOUT
                ))?;
                diesel::sql_query(&sql).get_result::<JsonRows>(conn)
            })
            .map_err(|e| {
                error!("Query failed: {} ({})", statement, e);
                TableRepositoryError::InvalidQuery(e.to_string())
            })?;

        let rows: Vec<Map<String, Value>> = serde_json::from_str(&result.rows)
            .map_err(|e| TableRepositoryError::DatabaseError(e.to_string()))?;

        Ok(QueryRows { rows })
    }

    async fn list_tables(&self) -> Result<Vec<String>, TableRepositoryError> {
        let mut conn = self.connection()?;

        let names = diesel::sql_query(
            "SELECT table_name::text AS name FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name",
        )
        .bind::<Text, _>(TABLE_SCHEMA)
        .load::<NameRow>(&mut conn)
        .map_err(db_error)?;

        Ok(names.into_iter().map(|n| n.name).collect())
    }

    async fn drop_all_tables(&self) -> Result<DropSummary, TableRepositoryError> {
        let tables = self.list_tables().await?;
        let mut conn = self.connection()?;
        let mut summary = DropSummary::default();

        for table in tables {
            let sql = format!("DROP TABLE IF EXISTS {} CASCADE", qualified(&table));
            match conn.batch_execute(&sql) {
                Ok(()) => summary.tables_dropped.push(table),
                Err(e) => {
                    error!("Failed to drop table {}: {}", table, e);
                    summary.tables_failed.push(table);
                }
            }
        }

        info!(
            "Dropped {} tables ({} failed)",
            summary.tables_dropped.len(),
            summary.tables_failed.len()
        );
        Ok(summary)
    }

    async fn database_name(&self) -> Result<String, TableRepositoryError> {
        let mut conn = self.connection()?;

        diesel::sql_query("SELECT current_database()::text AS name")
            .get_result::<NameRow>(&mut conn)
            .map(|row| row.name)
            .map_err(db_error)
    }

    async fn health_check(&self) -> Result<bool, TableRepositoryError> {
        let mut conn = self.connection()?;
        conn.batch_execute("SELECT 1").map_err(db_error)?;
        Ok(true)
    }
}
