use async_trait::async_trait;

#[derive(Debug)]
pub enum LanguageModelError {
    NetworkError(String),
    ApiError(String),
    EmptyResponse,
    RateLimitExceeded,
    ServiceUnavailable,
}

impl std::fmt::Display for LanguageModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageModelError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LanguageModelError::ApiError(msg) => write!(f, "API error: {}", msg),
            LanguageModelError::EmptyResponse => write!(f, "Model returned no text"),
            LanguageModelError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            LanguageModelError::ServiceUnavailable => write!(f, "Service unavailable"),
        }
    }
}

impl std::error::Error for LanguageModelError {}

pub const DEFAULT_TEMPERATURE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LanguageModelError>;

    async fn health_check(&self) -> Result<bool, LanguageModelError>;

    fn model_name(&self) -> String;
}
