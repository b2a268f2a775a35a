use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Number, Value, map::Entry};
use tokio::sync::RwLock;

use super::KvStorage;
use super::io::{ensure_parent_dir, load_or_default, write_json_file};

#[derive(Clone, Debug)]
pub struct JsonKvStorageConfig {
    pub working_dir: PathBuf,
    pub namespace: String,
    pub workspace: Option<String>,
}

/// Key/value records kept in memory and flushed to
/// `<working_dir>[/<workspace>]/kv_store_<namespace>.json`.
pub struct JsonKvStorage {
    final_namespace: String,
    file_path: PathBuf,
    data: Arc<RwLock<HashMap<String, Value>>>,
    dirty: AtomicBool,
}

impl JsonKvStorage {
    pub fn new(config: JsonKvStorageConfig) -> Self {
        let JsonKvStorageConfig {
            working_dir,
            namespace,
            workspace,
        } = config;

        let (workspace_prefix, workspace_dir) = match workspace.as_deref() {
            Some(ws) if !ws.is_empty() => (ws.to_string(), working_dir.join(ws)),
            _ => ("_".to_string(), working_dir.clone()),
        };

        let final_namespace = format!("{}_{}", workspace_prefix, namespace);
        let file_path = workspace_dir.join(format!("kv_store_{}.json", namespace));

        Self {
            final_namespace,
            file_path,
            data: Arc::new(RwLock::new(HashMap::new())),
            dirty: AtomicBool::new(false),
        }
    }

    fn current_unix_timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn decorate_upsert_record(key: &str, value: Value) -> Value {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };

        let now = Value::Number(Number::from(Self::current_unix_timestamp()));
        if let Entry::Vacant(entry) = map.entry("create_time".to_string()) {
            entry.insert(now.clone());
        }
        map.insert("update_time".to_string(), now);
        map.insert("_id".to_string(), Value::String(key.to_string()));

        Value::Object(map)
    }
}

#[async_trait]
impl KvStorage for JsonKvStorage {
    async fn initialize(&self) -> Result<()> {
        ensure_parent_dir(&self.file_path).await?;
        let data: HashMap<String, Value> = load_or_default(&self.file_path)
            .await
            .with_context(|| format!("failed to load kv store {}", self.final_namespace))?;
        *self.data.write().await = data;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        self.sync_if_dirty().await
    }

    async fn upsert(&self, records: HashMap<String, Value>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut guard = self.data.write().await;
        for (key, value) in records {
            let decorated = Self::decorate_upsert_record(&key, value);
            guard.insert(key, decorated);
        }
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_all(&self) -> Result<HashMap<String, Value>> {
        let guard = self.data.read().await;
        Ok(guard.clone())
    }

    async fn sync_if_dirty(&self) -> Result<()> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let snapshot = {
            let guard = self.data.read().await;
            guard.clone()
        };

        if let Err(err) = write_json_file(&self.file_path, &snapshot).await {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(err)
                .with_context(|| format!("failed to write kv store {}", self.final_namespace));
        }
        Ok(())
    }
}
