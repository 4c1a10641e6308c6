use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, StoredFile};

/// Upload scratch directory. Files are named `{uuid}_{file_name}`.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FileStorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    fn get_file_path(&self, file_name: &str) -> Result<PathBuf, FileStorageError> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| FileStorageError::InvalidPath(file_name.to_string()))?;

        Ok(self
            .base_path
            .join(format!("{}_{}", Uuid::new_v4(), name.to_string_lossy())))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_file(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<StoredFile, FileStorageError> {
        self.ensure_directory_exists().await?;

        let file_path = self.get_file_path(file_name)?;

        fs::write(&file_path, data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(StoredFile {
            path: file_path.to_string_lossy().to_string(),
            file_name: file_name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn delete_file(&self, path: &str) -> Result<bool, FileStorageError> {
        let file_path = Path::new(path);

        if !file_path.starts_with(&self.base_path) {
            return Err(FileStorageError::InvalidPath(path.to_string()));
        }

        if !file_path.exists() {
            return Ok(false);
        }

        fs::remove_file(file_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("uploads"));

        let stored = storage.store_file(b"%PDF-1.5", "agenda.pdf").await.unwrap();
        assert!(stored.path.ends_with("_agenda.pdf"));
        assert_eq!(stored.size, 8);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"%PDF-1.5");

        assert!(storage.delete_file(&stored.path).await.unwrap());
        assert!(!storage.delete_file(&stored.path).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_base() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("uploads"));

        assert!(matches!(
            storage.delete_file("/etc/passwd").await,
            Err(FileStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.store_file(b"x", "..").await,
            Err(FileStorageError::InvalidPath(_))
        ));
    }
}
