use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::entities::SchemaEntry;

#[derive(Debug)]
pub enum SchemaRegistryError {
    IoError(String),
    ParseError(String),
    NotFound(String),
}

impl std::fmt::Display for SchemaRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaRegistryError::IoError(msg) => write!(f, "IO error: {}", msg),
            SchemaRegistryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SchemaRegistryError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for SchemaRegistryError {}

#[derive(Debug, Clone)]
pub struct RegistryClearResult {
    pub file_path: String,
    pub file_existed: bool,
    pub schemas_cleared: usize,
}

/// Table name → schema entry store.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Raw JSON entries, including ones that no longer deserialize.
    async fn raw_entries(&self) -> Result<Map<String, Value>, SchemaRegistryError>;

    /// Well-formed entries in insertion order; malformed ones are skipped.
    async fn entries(&self) -> Result<Vec<(String, SchemaEntry)>, SchemaRegistryError>;

    async fn get(&self, table_name: &str) -> Result<Option<SchemaEntry>, SchemaRegistryError>;

    async fn upsert(&self, table_name: &str, entry: &SchemaEntry)
    -> Result<(), SchemaRegistryError>;

    async fn replace_all(&self, entries: Map<String, Value>) -> Result<(), SchemaRegistryError>;

    async fn clear(&self) -> Result<RegistryClearResult, SchemaRegistryError>;

    /// Writes a timestamped copy next to the registry and returns its path.
    async fn backup(&self) -> Result<String, SchemaRegistryError>;

    /// Replaces the registry with the contents of `path`; returns the entry count.
    async fn restore(&self, path: &str) -> Result<usize, SchemaRegistryError>;

    async fn exists(&self) -> bool;

    async fn file_size(&self) -> u64;

    fn location(&self) -> String;
}
