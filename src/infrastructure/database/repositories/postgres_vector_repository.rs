use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use pgvector::{Vector, VectorExpressionMethods};
use tracing::{debug, info};

use crate::domain::entities::{VectorMatch, VectorRecord};
use crate::domain::repositories::vector_repository::{
    VectorRepository, VectorRepositoryError, VectorStoreStats,
};
use crate::infrastructure::database::models::NewVectorRecordModel;
use crate::infrastructure::database::schema::vector_records::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

const INSERT_BATCH_SIZE: usize = 500;

/// pgvector-backed store; scores are `1 - cosine distance`.
pub struct PostgresVectorRepository {
    pool: DbPool,
}

impl PostgresVectorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: impl std::fmt::Display) -> VectorRepositoryError {
    VectorRepositoryError::DatabaseError(e.to_string())
}

#[async_trait]
impl VectorRepository for PostgresVectorRepository {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorRepositoryError::ConnectionError(e.to_string()))?;

        let models = records
            .iter()
            .map(NewVectorRecordModel::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(VectorRepositoryError::ValidationError)?;

        let mut written = 0;
        for batch in models.chunks(INSERT_BATCH_SIZE) {
            written += diesel::insert_into(vector_records)
                .values(batch)
                .on_conflict(id)
                .do_update()
                .set((
                    content.eq(excluded(content)),
                    metadata.eq(excluded(metadata)),
                    embedding.eq(excluded(embedding)),
                ))
                .execute(&mut conn)
                .map_err(db_error)?;
        }

        debug!("Upserted {} vector records", written);
        Ok(written)
    }

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorRepositoryError::ConnectionError(e.to_string()))?;

        let rows = vector_records
            .select((
                id,
                content,
                filename,
                embedding.cosine_distance(query_vector.clone()),
            ))
            .order(embedding.cosine_distance(query_vector.clone()))
            .limit(top_k as i64)
            .load::<(String, String, String, f64)>(&mut conn)
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(record_id, text, file, distance)| VectorMatch {
                id: record_id,
                text,
                filename: file,
                score: (1.0 - distance) as f32,
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<i64, VectorRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorRepositoryError::ConnectionError(e.to_string()))?;

        let deleted = diesel::delete(vector_records)
            .execute(&mut conn)
            .map_err(db_error)?;

        info!("Deleted {} vector records", deleted);
        Ok(deleted as i64)
    }

    async fn stats(&self) -> Result<VectorStoreStats, VectorRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorRepositoryError::ConnectionError(e.to_string()))?;

        let vector_count = vector_records
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(db_error)?;

        Ok(VectorStoreStats {
            index_name: self.index_name(),
            index_exists: true,
            vector_count,
        })
    }

    fn index_name(&self) -> String {
        "vector_records".to_string()
    }
}
