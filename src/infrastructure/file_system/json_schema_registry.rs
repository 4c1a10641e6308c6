use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::entities::SchemaEntry;
use crate::domain::repositories::schema_registry::{
    RegistryClearResult, SchemaRegistry, SchemaRegistryError,
};

/// Schema registry kept as one pretty-printed JSON object on disk.
///
/// Writes go through a temporary file and a rename. Read-modify-write cycles
/// are serialized by an in-process lock.
pub struct JsonSchemaRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

fn io_error(e: std::io::Error) -> SchemaRegistryError {
    SchemaRegistryError::IoError(e.to_string())
}

fn parse_object(raw: &str, source: &Path) -> Result<Map<String, Value>, SchemaRegistryError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SchemaRegistryError::ParseError(format!(
            "{} does not contain a JSON object",
            source.display()
        ))),
        Err(e) => Err(SchemaRegistryError::ParseError(format!(
            "{}: {}",
            source.display(),
            e
        ))),
    }
}

impl JsonSchemaRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, SchemaRegistryError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => parse_object(&raw, &self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn save(&self, entries: &Map<String, Value>) -> Result<(), SchemaRegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SchemaRegistryError::ParseError(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_error)?;
        fs::rename(&tmp, &self.path).await.map_err(io_error)?;

        debug!("Saved {} schema entries to {}", entries.len(), self.location());
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "table_schema".to_string());
        let name = format!(
            "{}_backup_{}.json",
            stem,
            Utc::now().format("%Y%m%d_%H%M%S_%3f")
        );
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SchemaRegistry for JsonSchemaRegistry {
    async fn raw_entries(&self) -> Result<Map<String, Value>, SchemaRegistryError> {
        self.load().await
    }

    async fn entries(&self) -> Result<Vec<(String, SchemaEntry)>, SchemaRegistryError> {
        let raw = self.load().await?;

        Ok(raw
            .into_iter()
            .filter_map(|(name, value)| match serde_json::from_value(value) {
                Ok(entry) => Some((name, entry)),
                Err(e) => {
                    warn!("Skipping malformed schema entry {}: {}", name, e);
                    None
                }
            })
            .collect())
    }

    async fn get(&self, table_name: &str) -> Result<Option<SchemaEntry>, SchemaRegistryError> {
        let mut raw = self.load().await?;

        raw.remove(table_name)
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| SchemaRegistryError::ParseError(format!("{}: {}", table_name, e)))
            })
            .transpose()
    }

    async fn upsert(
        &self,
        table_name: &str,
        entry: &SchemaEntry,
    ) -> Result<(), SchemaRegistryError> {
        let value = serde_json::to_value(entry)
            .map_err(|e| SchemaRegistryError::ParseError(e.to_string()))?;

        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(table_name.to_string(), value);
        self.save(&entries).await
    }

    async fn replace_all(&self, entries: Map<String, Value>) -> Result<(), SchemaRegistryError> {
        let _guard = self.lock.lock().await;
        self.save(&entries).await
    }

    async fn clear(&self) -> Result<RegistryClearResult, SchemaRegistryError> {
        let _guard = self.lock.lock().await;

        let file_existed = self.exists().await;
        let schemas_cleared = match self.load().await {
            Ok(entries) => entries.len(),
            Err(e) => {
                warn!("Clearing unreadable schema registry: {}", e);
                0
            }
        };
        self.save(&Map::new()).await?;

        info!("Cleared {} schema entries", schemas_cleared);
        Ok(RegistryClearResult {
            file_path: self.location(),
            file_existed,
            schemas_cleared,
        })
    }

    async fn backup(&self) -> Result<String, SchemaRegistryError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;

        let backup = self.backup_path();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| SchemaRegistryError::ParseError(e.to_string()))?;
        fs::write(&backup, json).await.map_err(io_error)?;

        let location = backup.display().to_string();
        info!("Backed up {} schema entries to {}", entries.len(), location);
        Ok(location)
    }

    async fn restore(&self, path: &str) -> Result<usize, SchemaRegistryError> {
        let source = Path::new(path);
        let raw = match fs::read_to_string(source).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaRegistryError::NotFound(path.to_string()));
            }
            Err(e) => return Err(io_error(e)),
        };
        let entries = parse_object(&raw, source)?;

        let _guard = self.lock.lock().await;
        self.save(&entries).await?;

        info!("Restored {} schema entries from {}", entries.len(), path);
        Ok(entries.len())
    }

    async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn file_size(&self) -> u64 {
        fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
