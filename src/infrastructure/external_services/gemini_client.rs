use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse, EmbeddingTask,
};
use crate::application::ports::language_model::{
    GenerationRequest, LanguageModel, LanguageModelError,
};
use crate::infrastructure::config::GeminiConfig;

const MAX_EMBEDDING_BATCH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            contents: vec![Content::text(Some("user"), &request.prompt)],
            system_instruction: request
                .system_prompt
                .as_deref()
                .map(|s| Content::text(None, s)),
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    pub model: String,
    pub content: Content,
    pub task_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ContentEmbedding {
    pub values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub struct EmbedContentResponse {
    pub embedding: ContentEmbedding,
}

#[derive(Debug, Serialize)]
pub struct BatchEmbedContentsRequest {
    pub requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BatchEmbedContentsResponse {
    #[serde(default)]
    pub embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug)]
pub enum GeminiError {
    RequestError(String),
    ApiError { status: u16, message: String },
    ParseError(String),
    MaxRetriesExceeded(String),
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::RequestError(msg) => write!(f, "Request error: {}", msg),
            GeminiError::ApiError { status, message } => {
                write!(f, "Gemini API error {}: {}", status, message)
            }
            GeminiError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            GeminiError::MaxRetriesExceeded(msg) => write!(f, "Max retries exceeded: {}", msg),
        }
    }
}

impl std::error::Error for GeminiError {}

impl GeminiError {
    /// Network failures, rate limits and server errors are worth retrying.
    fn is_retryable(&self) -> bool {
        match self {
            GeminiError::RequestError(_) => true,
            GeminiError::ApiError { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            _ => false,
        }
    }
}

impl From<GeminiError> for LanguageModelError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::RequestError(msg) => LanguageModelError::NetworkError(msg),
            GeminiError::ApiError { status: 429, .. } => LanguageModelError::RateLimitExceeded,
            GeminiError::ApiError { status, message } if status >= 500 => {
                warn!("Gemini unavailable ({}): {}", status, message);
                LanguageModelError::ServiceUnavailable
            }
            other => LanguageModelError::ApiError(other.to_string()),
        }
    }
}

impl From<GeminiError> for EmbeddingProviderError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            GeminiError::ApiError { status: 429, .. } => EmbeddingProviderError::RateLimitExceeded,
            GeminiError::ApiError { status, .. } if status >= 500 => {
                EmbeddingProviderError::ServiceUnavailable
            }
            other => EmbeddingProviderError::ApiError(other.to_string()),
        }
    }
}

/// Thin REST client for the Gemini `generateContent` and embedding endpoints.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.model_url(&self.config.chat_model, "generateContent");
        self.send_request(&url, request).await
    }

    pub async fn embed_content(
        &self,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, GeminiError> {
        let url = self.model_url(&self.config.embedding_model, "embedContent");
        self.send_request(&url, request).await
    }

    pub async fn batch_embed_contents(
        &self,
        request: &BatchEmbedContentsRequest,
    ) -> Result<BatchEmbedContentsResponse, GeminiError> {
        let url = self.model_url(&self.config.embedding_model, "batchEmbedContents");
        self.send_request(&url, request).await
    }

    pub fn embed_request(&self, text: &str, task: EmbeddingTask) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: Content::text(None, text),
            task_type: task.as_api_str(),
        }
    }

    async fn send_request<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.execute_request(url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempts > self.config.max_retries {
                        return Err(GeminiError::MaxRetriesExceeded(e.to_string()));
                    }

                    let backoff_time = backoff_delay(self.config.backoff_factor, attempts);
                    warn!(
                        "Gemini request failed (attempt {}), retrying in {:?}: {}",
                        attempts, backoff_time, e
                    );
                    tokio::time::sleep(backoff_time).await;
                }
            }
        }
    }

    async fn execute_request<B, R>(&self, url: &str, body: &B) -> Result<R, GeminiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GeminiError::ParseError(e.to_string()))
    }
}

pub fn backoff_delay(backoff_factor: f64, attempt: u32) -> Duration {
    Duration::from_millis((backoff_factor.powi(attempt as i32 - 1) * 1000.0) as u64)
}

pub struct GeminiLanguageModel {
    client: GeminiClient,
}

impl GeminiLanguageModel {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LanguageModel for GeminiLanguageModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LanguageModelError> {
        debug!(
            "Gemini generate: {} prompt chars, temperature {}",
            request.prompt.len(),
            request.temperature
        );
        let response = self
            .client
            .generate_content(&GenerateContentRequest::from(&request))
            .await?;

        response.text().ok_or(LanguageModelError::EmptyResponse)
    }

    async fn health_check(&self) -> Result<bool, LanguageModelError> {
        let reply = self
            .generate(GenerationRequest::new("Say 'OK' if you can respond"))
            .await?;
        Ok(reply.contains("OK"))
    }

    fn model_name(&self) -> String {
        self.client.config().chat_model.clone()
    }
}

pub struct GeminiEmbeddingProvider {
    client: GeminiClient,
}

impl GeminiEmbeddingProvider {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        if request.text.trim().is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let response = self
            .client
            .embed_content(&self.client.embed_request(&request.text, request.task))
            .await?;

        Ok(EmbeddingResponse {
            embedding: Vector::from(response.embedding.values),
            model_name: self.model_name(),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.len() > MAX_EMBEDDING_BATCH {
            return Err(EmbeddingProviderError::InvalidInput(format!(
                "Batch of {} exceeds the limit of {}",
                request.texts.len(),
                MAX_EMBEDDING_BATCH
            )));
        }

        let batch = BatchEmbedContentsRequest {
            requests: request
                .texts
                .iter()
                .map(|t| self.client.embed_request(t, request.task))
                .collect(),
        };
        let response = self.client.batch_embed_contents(&batch).await?;

        Ok(BatchEmbeddingResponse {
            embeddings: response
                .embeddings
                .into_iter()
                .map(|e| Vector::from(e.values))
                .collect(),
            model_name: self.model_name(),
        })
    }

    async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
        let response = self
            .generate_embedding(EmbeddingRequest {
                text: "health check".to_string(),
                task: EmbeddingTask::RetrievalQuery,
            })
            .await?;
        Ok(!response.embedding.as_slice().is_empty())
    }

    fn model_name(&self) -> String {
        self.client.config().embedding_model.clone()
    }

    fn max_batch_size(&self) -> usize {
        MAX_EMBEDDING_BATCH
    }

    fn embedding_dimension(&self) -> usize {
        self.client.config().embedding_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
            embedding_model: "embedding-001".to_string(),
            embedding_dimension: 768,
            max_retries: 3,
            timeout_secs: 60,
            backoff_factor: 1.5,
        }
    }

    #[test]
    fn test_generate_request_body() {
        let request = GenerationRequest::new("Query: who is speaking?")
            .with_system("You are a query analyzer.")
            .with_temperature(0.3);

        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Query: who is speaking?"}]}],
                "systemInstruction": {"parts": [{"text": "You are a query analyzer."}]},
                "generationConfig": {"temperature": 0.3}
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "ta"}, {"text": "ble"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("table"));

        let empty: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_embed_request_and_urls() {
        let client = GeminiClient::new(config()).unwrap();
        let body =
            serde_json::to_value(client.embed_request("hello", EmbeddingTask::RetrievalDocument))
                .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "models/embedding-001",
                "content": {"parts": [{"text": "hello"}]},
                "taskType": "RETRIEVAL_DOCUMENT"
            })
        );
        assert_eq!(
            client.model_url("embedding-001", "batchEmbedContents"),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:batchEmbedContents"
        );
    }

    #[test]
    fn test_backoff_and_retry_classification() {
        assert_eq!(backoff_delay(1.5, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1.5, 3), Duration::from_millis(2250));

        assert!(GeminiError::RequestError("timeout".into()).is_retryable());
        assert!(GeminiError::ApiError { status: 429, message: String::new() }.is_retryable());
        assert!(GeminiError::ApiError { status: 503, message: String::new() }.is_retryable());
        assert!(!GeminiError::ApiError { status: 400, message: String::new() }.is_retryable());
        assert!(!GeminiError::ParseError("bad json".into()).is_retryable());
    }
}
