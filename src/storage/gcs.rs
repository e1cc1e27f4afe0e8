//! Google Cloud Storage backend. Shells out to `gsutil`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::IndexStore;
use super::error::{StorageError, StorageResult};

const CMD_TIMEOUT: Duration = Duration::from_secs(120);
const CMD_RETRIES: usize = 3;
const CMD_RETRY_BACKOFF: Duration = Duration::from_millis(750);

/// Index blob stored as a single object in a GCS bucket.
///
/// `gsutil cp` replaces an object in one step, so readers observe either the old or the new
/// blob.
#[derive(Debug, Clone)]
pub struct GcsIndexStore {
    bucket: String,
    object: String,
    gsutil_path: PathBuf,
}

enum CommandFailure {
    NotFound,
    Failed(StorageError),
}

impl GcsIndexStore {
    /// Creates a store for `gs://{bucket}/{object}` using `gsutil` from `PATH`.
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            gsutil_path: PathBuf::from("gsutil"),
        }
    }

    /// Overrides the `gsutil` binary location.
    pub fn with_gsutil_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.gsutil_path = path.into();
        self
    }

    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object)
    }

    async fn run_command_with_retries(
        &self,
        program: &Path,
        args: Vec<String>,
        label: &str,
    ) -> Result<(), CommandFailure> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;

            let mut cmd = Command::new(program);
            cmd.args(&args)
                .kill_on_drop(true)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());

            let child = cmd.spawn().map_err(|e| {
                CommandFailure::Failed(StorageError::Remote(format!(
                    "Failed to spawn {label}: {e}"
                )))
            })?;

            let output = match tokio::time::timeout(CMD_TIMEOUT, child.wait_with_output()).await {
                Ok(res) => res.map_err(|e| {
                    CommandFailure::Failed(StorageError::Remote(format!(
                        "Failed waiting for {label}: {e}"
                    )))
                })?,
                Err(_) => {
                    return Err(CommandFailure::Failed(StorageError::Timeout {
                        operation: label.to_string(),
                        secs: CMD_TIMEOUT.as_secs(),
                    }));
                }
            };

            if output.status.success() {
                return Ok(());
            }

            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if is_missing_object(&stderr) {
                return Err(CommandFailure::NotFound);
            }

            if attempt >= CMD_RETRIES {
                return Err(CommandFailure::Failed(StorageError::Remote(format!(
                    "{label} failed: {stderr}"
                ))));
            }

            warn!(attempt, label, stderr = %stderr, "gsutil command failed, retrying");
            tokio::time::sleep(CMD_RETRY_BACKOFF).await;
        }
    }
}

/// Whether `gsutil` stderr reports a missing object. A missing bucket is not a missing object.
pub(super) fn is_missing_object(stderr: &str) -> bool {
    if stderr.contains("BucketNotFoundException") {
        return false;
    }
    stderr.contains("No URLs matched") || stderr.contains("NotFoundException")
}

#[async_trait]
impl IndexStore for GcsIndexStore {
    fn location(&self) -> String {
        self.uri()
    }

    async fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("index.json");

        let result = self
            .run_command_with_retries(
                &self.gsutil_path,
                vec![
                    "cp".to_string(),
                    self.uri(),
                    dest.to_string_lossy().to_string(),
                ],
                "gsutil cp (download)",
            )
            .await;

        match result {
            Ok(()) => {
                let bytes = tokio::fs::read(&dest).await?;
                debug!(uri = %self.uri(), bytes = bytes.len(), "Downloaded index blob");
                Ok(Some(bytes))
            }
            Err(CommandFailure::NotFound) => Ok(None),
            Err(CommandFailure::Failed(e)) => Err(e),
        }
    }

    async fn save(&self, bytes: &[u8]) -> StorageResult<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("index.json");
        tokio::fs::write(&src, bytes).await?;

        let result = self
            .run_command_with_retries(
                &self.gsutil_path,
                vec![
                    "cp".to_string(),
                    src.to_string_lossy().to_string(),
                    self.uri(),
                ],
                "gsutil cp (upload)",
            )
            .await;

        match result {
            Ok(()) => {
                debug!(uri = %self.uri(), bytes = bytes.len(), "Uploaded index blob");
                Ok(())
            }
            Err(CommandFailure::NotFound) => Err(StorageError::Remote(format!(
                "bucket not found for {}",
                self.uri()
            ))),
            Err(CommandFailure::Failed(e)) => Err(e),
        }
    }
}
