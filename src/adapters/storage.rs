use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::validation::resolve_within;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at a directory. Paths may not leave the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.base_path
    }

    pub fn full_path(&self, path: &str) -> Result<PathBuf> {
        resolve_within(&self.base_path, path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        match self.full_path(path) {
            Ok(full_path) => tokio::fs::metadata(full_path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
