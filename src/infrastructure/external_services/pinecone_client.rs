use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::entities::{VectorMatch, VectorMetadata, VectorRecord};
use crate::domain::repositories::vector_repository::{
    VectorRepository, VectorRepositoryError, VectorStoreStats,
};

const UPSERT_BATCH_SIZE: usize = 100;

#[derive(Debug, Serialize)]
pub struct PineconeVector<'a> {
    pub id: &'a str,
    pub values: &'a [f32],
    pub metadata: &'a VectorMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
}

impl From<QueryMatch> for VectorMatch {
    fn from(m: QueryMatch) -> Self {
        let field = |name: &str| {
            m.metadata
                .as_ref()
                .and_then(|meta| meta.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        VectorMatch {
            text: field("text"),
            filename: field("filename"),
            id: m.id,
            score: m.score,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub total_vector_count: i64,
}

/// Vector store backed by a Pinecone index's data-plane REST API.
pub struct PineconeVectorRepository {
    client: Client,
    host: String,
    api_key: String,
    index_name: String,
}

impl PineconeVectorRepository {
    pub fn new(host: &str, api_key: &str, index_name: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let host = if host.starts_with("http") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Ok(Self {
            client,
            host,
            api_key: api_key.to_string(),
            index_name: index_name.to_string(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, VectorRepositoryError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| VectorRepositoryError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VectorRepositoryError::ApiError(format!(
                "{} {}: {}",
                status, path, message
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| VectorRepositoryError::ApiError(e.to_string()))
    }

    async fn describe(&self) -> Result<IndexStats, VectorRepositoryError> {
        self.post("/describe_index_stats", &json!({})).await
    }
}

#[async_trait]
impl VectorRepository for PineconeVectorRepository {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorRepositoryError> {
        let mut upserted = 0;

        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let vectors: Vec<PineconeVector> = batch
                .iter()
                .map(|r| PineconeVector {
                    id: r.id(),
                    values: r.values().as_slice(),
                    metadata: r.metadata(),
                })
                .collect();

            let response: Value = self
                .post("/vectors/upsert", &json!({ "vectors": vectors }))
                .await?;
            upserted += response
                .get("upsertedCount")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(batch.len());
        }

        debug!("Upserted {} vectors into {}", upserted, self.index_name);
        Ok(upserted)
    }

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorRepositoryError> {
        let response: QueryResponse = self
            .post(
                "/query",
                &QueryRequest {
                    vector: query_vector.as_slice(),
                    top_k,
                    include_metadata: true,
                },
            )
            .await?;

        Ok(response.matches.into_iter().map(VectorMatch::from).collect())
    }

    async fn delete_all(&self) -> Result<i64, VectorRepositoryError> {
        let before = self.describe().await?.total_vector_count;
        let _: Value = self
            .post("/vectors/delete", &json!({ "deleteAll": true }))
            .await?;

        info!("Deleted {} vectors from {}", before, self.index_name);
        Ok(before)
    }

    async fn stats(&self) -> Result<VectorStoreStats, VectorRepositoryError> {
        let stats = self.describe().await?;
        Ok(VectorStoreStats {
            index_name: self.index_name.clone(),
            index_exists: true,
            vector_count: stats.total_vector_count,
        })
    }

    fn index_name(&self) -> String {
        self.index_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DocumentType;

    #[test]
    fn test_host_normalization() {
        let repo = PineconeVectorRepository::new("eventbot-abc.svc.pinecone.io/", "k", "eventbot")
            .unwrap();
        assert_eq!(repo.host, "https://eventbot-abc.svc.pinecone.io");

        let repo = PineconeVectorRepository::new("http://localhost:5080", "k", "local").unwrap();
        assert_eq!(repo.host, "http://localhost:5080");
    }

    #[test]
    fn test_vector_payload_shape() {
        let record = VectorRecord::from_parts(
            "agenda.pdf_1".to_string(),
            Vector::from(vec![0.5, 0.25]),
            VectorMetadata {
                text: "Doors open at 8".to_string(),
                filename: "agenda.pdf".to_string(),
                user_id: String::new(),
                document_type: DocumentType::EventDocument,
                table_count: 1,
            },
        );
        let payload = serde_json::to_value(PineconeVector {
            id: record.id(),
            values: record.values().as_slice(),
            metadata: record.metadata(),
        })
        .unwrap();

        assert_eq!(payload["id"], "agenda.pdf_1");
        assert_eq!(payload["values"], json!([0.5, 0.25]));
        assert_eq!(payload["metadata"]["document_type"], "event_document");
        assert_eq!(payload["metadata"]["table_count"], 1);
    }

    #[test]
    fn test_query_response_to_matches() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "a", "score": 0.9, "metadata": {"text": "Keynote", "filename": "agenda.pdf"}},
                {"id": "b", "score": 0.4}
            ]
        }))
        .unwrap();

        let matches: Vec<VectorMatch> = response.matches.into_iter().map(Into::into).collect();
        assert_eq!(matches[0].text, "Keynote");
        assert_eq!(matches[0].filename, "agenda.pdf");
        assert_eq!(matches[1].text, "");
        assert!((matches[1].score - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_index_stats_reads_vector_count() {
        let stats: IndexStats = serde_json::from_value(json!({
            "namespaces": {"": {"vectorCount": 42}},
            "dimension": 768,
            "indexFullness": 0.0,
            "totalVectorCount": 42
        }))
        .unwrap();
        assert_eq!(stats.total_vector_count, 42);

        let empty: IndexStats = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.total_vector_count, 0);
    }
}
