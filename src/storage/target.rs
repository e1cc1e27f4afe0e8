use std::path::PathBuf;
use std::sync::Arc;

use super::error::{StorageError, StorageResult};
use super::{GcsIndexStore, IndexStore, LocalIndexStore};
use crate::constants::DEFAULT_INDEX_FILENAME;

/// Where the requirement index lives.
///
/// Parsed from a CLI/env string:
/// - `gs://bucket/path/to/index.json` (object defaults to [`DEFAULT_INDEX_FILENAME`])
/// - `local` (the default file name in the working directory)
/// - anything else is a local file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Local(PathBuf),
    Gcs { bucket: String, object: String },
}

impl StorageTarget {
    pub fn parse(value: &str) -> StorageResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(StorageError::InvalidTarget {
                target: value.to_string(),
                reason: "empty target".to_string(),
            });
        }

        if let Some(rest) = value.strip_prefix("gs://") {
            let (bucket, object) = match rest.split_once('/') {
                Some((bucket, object)) if !object.is_empty() => (bucket, object),
                Some((bucket, _)) => (bucket, DEFAULT_INDEX_FILENAME),
                None => (rest, DEFAULT_INDEX_FILENAME),
            };
            if bucket.is_empty() {
                return Err(StorageError::InvalidTarget {
                    target: value.to_string(),
                    reason: "missing bucket name".to_string(),
                });
            }
            return Ok(Self::Gcs {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }

        if value.eq_ignore_ascii_case("local") {
            return Ok(Self::Local(PathBuf::from(DEFAULT_INDEX_FILENAME)));
        }

        Ok(Self::Local(PathBuf::from(value)))
    }

    /// Opens the matching [`IndexStore`].
    pub fn open(&self) -> Arc<dyn IndexStore> {
        match self {
            Self::Local(path) => Arc::new(LocalIndexStore::new(path.clone())),
            Self::Gcs { bucket, object } => Arc::new(GcsIndexStore::new(bucket, object)),
        }
    }
}

impl std::fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Gcs { bucket, object } => write!(f, "gs://{}/{}", bucket, object),
        }
    }
}
