use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::IndexStore;
use super::error::{StorageError, StorageResult};

/// In-memory [`IndexStore`] for tests. Clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
    saves: Arc<AtomicUsize>,
    fail_io: Arc<AtomicBool>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `bytes`.
    pub fn with_blob(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        *store.blob.lock() = Some(bytes.into());
        store
    }

    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every subsequent load/save fail with an I/O error.
    pub fn fail_io(&self, fail: bool) {
        self.fail_io.store(fail, Ordering::SeqCst);
    }

    fn check_io(&self) -> StorageResult<()> {
        if self.fail_io.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "simulated storage failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    fn location(&self) -> String {
        "memory://index".to_string()
    }

    async fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        self.check_io()?;
        Ok(self.blob.lock().clone())
    }

    async fn save(&self, bytes: &[u8]) -> StorageResult<()> {
        self.check_io()?;
        *self.blob.lock() = Some(bytes.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
