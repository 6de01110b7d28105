use std::{collections::HashMap, io::ErrorKind, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Durable byte log for one store.
///
/// `append` adds bytes at the end; `replace` swaps the whole content in one
/// step. Whatever either call accepted must be returned by `load` after a
/// restart.
#[async_trait]
pub trait StableStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Vec<u8>>, ServiceError>;
    async fn append(&self, bytes: Vec<u8>) -> Result<(), ServiceError>;
    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ServiceError>;
    fn describe(&self) -> String;
}

/// JSONL file backend. Appends are synced before returning and truncated
/// back on failure; `replace` writes `<file>.tmp` and renames it into place.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    file_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.file_path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn ensure_parent(&self) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ServiceError::storage(format!("{}: {e}", parent.display())))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StableStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>, ServiceError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServiceError::storage(format!("read {}: {e}", self.file_path.display()))),
        }
    }

    async fn append(&self, bytes: Vec<u8>) -> Result<(), ServiceError> {
        self.ensure_parent().await?;
        let io_err = |e: std::io::Error| {
            ServiceError::storage(format!("append {}: {e}", self.file_path.display()))
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await
            .map_err(io_err)?;
        let prev_len = file.metadata().await.map_err(io_err)?.len();
        let written = async {
            file.write_all(&bytes).await?;
            file.sync_data().await
        }
        .await;
        if let Err(e) = written {
            // cut back to the last acknowledged line
            let rollback = async {
                file.set_len(prev_len).await?;
                file.sync_data().await
            }
            .await;
            if let Err(re) = rollback {
                warn!(path = %self.file_path.display(), error = %re, "journal rollback failed");
            }
            return Err(io_err(e));
        }
        Ok(())
    }

    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ServiceError> {
        self.ensure_parent().await?;
        let tmp = self.tmp_path();
        let write_result = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(format!("write {}: {e}", tmp.display())));
        }
        fs::rename(&tmp, &self.file_path).await.map_err(|e| {
            ServiceError::storage(format!("{} -> {}: {e}", tmp.display(), self.file_path.display()))
        })?;
        debug!(path = %self.file_path.display(), "store file replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.file_path.display())
    }
}

/// In-process backend. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StableStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>, ServiceError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn append(&self, bytes: Vec<u8>) -> Result<(), ServiceError> {
        self.slot.lock().await.get_or_insert_with(Vec::new).extend_from_slice(&bytes);
        Ok(())
    }

    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ServiceError> {
        *self.slot.lock().await = Some(bytes);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Named set of memory slots; opening the same name twice yields the same
/// slot, so a reopened store sees earlier writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryVolume {
    slots: Arc<std::sync::Mutex<HashMap<String, MemoryStorage>>>,
}

impl MemoryVolume {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, name: &str) -> MemoryStorage {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.entry(name.to_string()).or_default().clone()
    }
}

/// Where a set of named stores lives.
#[derive(Clone, Debug)]
pub enum StorageLocation {
    /// `<dir>/<name>.jsonl` per store.
    Dir(PathBuf),
    Memory(MemoryVolume),
}

impl StorageLocation {
    pub fn memory() -> Self {
        Self::Memory(MemoryVolume::new())
    }

    pub fn backend_for(&self, name: &str) -> Arc<dyn StableStorage> {
        match self {
            StorageLocation::Dir(dir) => {
                Arc::new(JsonFileStorage::new(dir.join(format!("{name}.jsonl"))))
            }
            StorageLocation::Memory(volume) => Arc::new(volume.open(name)),
        }
    }
}
