use std::sync::Arc;

use super::{KvStorage, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragesStatus {
    #[default]
    Created,
    Initialized,
    Finalized,
}

/// Sequentially initializes registered stores at startup and flushes them on shutdown.
pub struct StorageManager {
    status: StoragesStatus,
    storages: Vec<Arc<dyn KvStorage>>,
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            status: StoragesStatus::Created,
            storages: Vec::new(),
        }
    }

    pub fn status(&self) -> StoragesStatus {
        self.status
    }

    pub fn register_kv<T>(&mut self, storage: Arc<T>)
    where
        T: KvStorage + 'static,
    {
        let storage: Arc<dyn KvStorage> = storage;
        self.storages.push(storage);
    }

    pub async fn initialize_all(&mut self) -> StorageResult<()> {
        if self.status == StoragesStatus::Initialized {
            return Ok(());
        }

        for storage in &self.storages {
            storage.initialize().await?;
        }

        self.status = StoragesStatus::Initialized;
        Ok(())
    }

    pub async fn finalize_all(&mut self) -> StorageResult<()> {
        for storage in &self.storages {
            storage.finalize().await?;
        }
        self.status = StoragesStatus::Finalized;
        Ok(())
    }
}
