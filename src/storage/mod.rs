//! Index blob storage: local disk, Google Cloud Storage, and an in-memory store for tests.
//!
//! Stores move opaque bytes. Decoding and validation belong to
//! [`RequirementIndex`](crate::index::RequirementIndex).
//!
//! Writers are assumed to be serialized externally (one ingestion run at a time per target).
//! `save` is atomic from a reader's perspective: a reader sees either the previous blob or the
//! new one, never a partial write.

pub mod error;
pub mod gcs;
pub mod local;
#[cfg(any(test, feature = "mock"))]
pub mod memory;
pub mod target;

#[cfg(test)]
mod tests;

pub use error::{StorageError, StorageResult};
pub use gcs::GcsIndexStore;
pub use local::LocalIndexStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryIndexStore;
pub use target::StorageTarget;

use async_trait::async_trait;

#[async_trait]
/// Load/save interface for the persisted requirement index.
pub trait IndexStore: Send + Sync + std::fmt::Debug {
    /// Human-readable location (path or URI) for logs and reports.
    fn location(&self) -> String;

    /// Returns the stored blob, or `None` if nothing has been saved yet.
    async fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically replaces the stored blob.
    async fn save(&self, bytes: &[u8]) -> StorageResult<()>;
}
