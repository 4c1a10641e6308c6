use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue { name: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => {
                write!(f, "Missing required environment variable: {}", name)
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorBackend {
    PgVector,
    Pinecone {
        api_key: String,
        index_name: String,
        host: String,
    },
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub database_url: String,
    pub vector_backend: VectorBackend,
    pub schema_registry_path: PathBuf,
    pub upload_folder: PathBuf,
    pub max_file_size: usize,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let gemini = GeminiConfig {
            api_key: vars.required("GEMINI_API_KEY")?,
            base_url: vars.url(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            )?,
            chat_model: vars.or("GEMINI_CHAT_MODEL", "gemini-2.0-flash"),
            embedding_model: vars.or("GEMINI_EMBEDDING_MODEL", "embedding-001"),
            embedding_dimension: vars.parsed("EMBEDDING_DIMENSION", 768)?,
            max_retries: vars.parsed("LLM_MAX_RETRIES", 3)?,
            timeout_secs: vars.parsed("LLM_TIMEOUT_SECS", 60)?,
            backoff_factor: vars.parsed("LLM_BACKOFF_FACTOR", 1.5)?,
        };

        let backend = vars.or("VECTOR_BACKEND", "pgvector").to_lowercase();
        let vector_backend = match backend.as_str() {
            "pgvector" => VectorBackend::PgVector,
            "pinecone" => VectorBackend::Pinecone {
                api_key: vars.required("PINECONE_API_KEY")?,
                index_name: vars.required("PINECONE_INDEX")?,
                host: vars.url("PINECONE_HOST", "")?,
            },
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "VECTOR_BACKEND".to_string(),
                    value: backend,
                });
            }
        };

        Ok(Self {
            gemini,
            database_url: vars.required("DATABASE_URL")?,
            vector_backend,
            schema_registry_path: PathBuf::from(
                vars.or("SCHEMA_REGISTRY_PATH", "data/table_schema.json"),
            ),
            upload_folder: PathBuf::from(vars.or("UPLOAD_FOLDER", "uploads")),
            max_file_size: vars.parsed("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?,
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parsed("PORT", 5000)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Hosts without a scheme are taken as https.
    fn url(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        let value = match self.get(name) {
            Some(value) => value,
            None if !default.is_empty() => default.to_string(),
            None => return Err(ConfigError::MissingVariable(name.to_string())),
        };
        let candidate = if value.contains("://") {
            value.clone()
        } else {
            format!("https://{}", value)
        };

        match Url::parse(&candidate) {
            Ok(url) if url.host_str().is_some() => {
                Ok(url.as_str().trim_end_matches('/').to_string())
            }
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
        }
    }

    fn parsed<T: FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }
}
