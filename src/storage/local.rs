use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::IndexStore;
use super::error::{StorageError, StorageResult};

/// Index blob stored in a single file on local disk.
///
/// Writes go to a temporary file in the same directory, are fsynced, then renamed over the
/// target so readers never observe a partially written index.
#[derive(Debug, Clone)]
pub struct LocalIndexStore {
    path: PathBuf,
}

impl LocalIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[async_trait]
impl IndexStore for LocalIndexStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "Loaded index blob");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn save(&self, bytes: &[u8]) -> StorageResult<()> {
        let dir = self.parent_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let path = self.path.clone();
        let data = bytes.to_vec();

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let mut temp_file = tempfile::NamedTempFile::new_in(&dir)?;
            temp_file.write_all(&data)?;
            temp_file.as_file().sync_all()?;
            temp_file
                .persist(&path)
                .map_err(|e| StorageError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::TaskFailed(e.to_string()))??;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Persisted index blob");
        Ok(())
    }
}
