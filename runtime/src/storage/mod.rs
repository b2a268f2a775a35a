use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

pub mod certificates;
pub mod io;
pub mod json_kv;
pub mod manager;

pub use certificates::{CertificateFilter, CertificateStore, StoredCertificate};
pub use json_kv::{JsonKvStorage, JsonKvStorageConfig};
pub use manager::{StorageManager, StoragesStatus};

pub type StorageResult<T> = Result<T>;

#[async_trait]
pub trait KvStorage: Send + Sync {
    async fn initialize(&self) -> StorageResult<()>;
    async fn finalize(&self) -> StorageResult<()>;

    async fn upsert(&self, records: HashMap<String, serde_json::Value>) -> StorageResult<()>;

    async fn get_all(&self) -> StorageResult<HashMap<String, serde_json::Value>>;

    /// Flush dirty state to disk if needed.
    async fn sync_if_dirty(&self) -> StorageResult<()>;
}
