use std::{collections::BTreeMap, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::storage::backend::StableStorage;
use crate::storage::journal::{encode_line, encode_put, encode_snapshot, replay, JournalOp};

/// Journals shorter than this are never compacted at runtime.
const COMPACT_MIN_OPS: usize = 1024;

struct State<K, V> {
    map: BTreeMap<K, V>,
    journal_ops: usize,
}

/// Persistent ordered key-value map.
///
/// Reads are served from the in-memory `BTreeMap`. Every mutation is
/// appended to the backend journal first and applied in memory only after
/// the write succeeded, so a failed write leaves the store unchanged.
/// Iteration follows key order, not insertion order.
pub struct KeyedStore<K, V> {
    name: String,
    inner: RwLock<State<K, V>>,
    backend: Arc<dyn StableStorage>,
}

impl<K, V> KeyedStore<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned + Send + Sync,
    V: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync,
{
    /// Replay the backend journal and compact it to one line per entry.
    pub async fn open(
        name: impl Into<String>,
        backend: Arc<dyn StableStorage>,
    ) -> Result<Arc<Self>, ServiceError> {
        let name = name.into();
        let (map, ops) = match backend.load().await? {
            Some(bytes) => replay::<K, V>(&bytes).map_err(|e| match e {
                ServiceError::Storage(msg) => {
                    ServiceError::Storage(format!("store {name} ({}): {msg}", backend.describe()))
                }
                other => other,
            })?,
            None => (BTreeMap::new(), 0),
        };
        backend.replace(encode_snapshot(&map)?).await?;
        info!(store = %name, backend = %backend.describe(), entries = map.len(), replayed = ops, "store opened");
        let journal_ops = map.len();
        Ok(Arc::new(Self { name, inner: RwLock::new(State { map, journal_ops }), backend }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append one journal line. On failure the journal is rewritten from the
    /// in-memory map, so no partial or unacknowledged line is ever replayed.
    async fn persist(&self, state: &mut State<K, V>, line: Vec<u8>) -> Result<(), ServiceError> {
        if let Err(e) = self.backend.append(line).await {
            warn!(store = %self.name, error = %e, "journal append failed; restoring journal");
            let restored = match encode_snapshot(&state.map) {
                Ok(bytes) => self.backend.replace(bytes).await,
                Err(se) => Err(se),
            };
            match restored {
                Ok(()) => state.journal_ops = state.map.len(),
                Err(re) => warn!(store = %self.name, error = %re, "journal restore failed"),
            }
            return Err(e);
        }
        state.journal_ops += 1;
        Ok(())
    }

    /// Rewrite the journal once it is mostly dead entries. Failure only costs space.
    async fn maybe_compact(&self, state: &mut State<K, V>) {
        if state.journal_ops < COMPACT_MIN_OPS || state.journal_ops < 2 * state.map.len() {
            return;
        }
        let result = match encode_snapshot(&state.map) {
            Ok(bytes) => self.backend.replace(bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                debug!(store = %self.name, from = state.journal_ops, to = state.map.len(), "journal compacted");
                state.journal_ops = state.map.len();
            }
            Err(e) => warn!(store = %self.name, error = %e, "journal compaction failed"),
        }
    }

    /// Insert or overwrite; returns the previous value under `key`.
    pub async fn insert(&self, key: K, value: V) -> Result<Option<V>, ServiceError> {
        let mut state = self.inner.write().await;
        self.persist(&mut state, encode_put(&key, &value)?).await?;
        let previous = state.map.insert(key, value);
        self.maybe_compact(&mut state).await;
        Ok(previous)
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let state = self.inner.read().await;
        state.map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        let state = self.inner.read().await;
        state.map.contains_key(key)
    }

    /// Remove `key`; `None` when it was absent (nothing is written then).
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        let mut state = self.inner.write().await;
        if !state.map.contains_key(key) {
            return Ok(None);
        }
        let line = encode_line(&JournalOp::<K, V>::Delete { key: key.clone() })?;
        self.persist(&mut state, line).await?;
        let removed = state.map.remove(key);
        self.maybe_compact(&mut state).await;
        Ok(removed)
    }

    pub async fn size(&self) -> usize {
        self.inner.read().await.map.len()
    }

    /// Values in key order, as of this call.
    pub async fn values(&self) -> Vec<V> {
        let state = self.inner.read().await;
        state.map.values().cloned().collect()
    }

    /// `(key, value)` pairs in key order, as of this call.
    pub async fn entries(&self) -> Vec<(K, V)> {
        let state = self.inner.read().await;
        state.map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Values matching `pred`, in key order.
    pub async fn filter_values<F>(&self, pred: F) -> Vec<V>
    where
        F: Fn(&V) -> bool,
    {
        let state = self.inner.read().await;
        state.map.values().filter(|v| pred(v)).cloned().collect()
    }

    pub async fn any<F>(&self, pred: F) -> bool
    where
        F: Fn(&V) -> bool,
    {
        let state = self.inner.read().await;
        state.map.values().any(pred)
    }

    /// Read-modify-write of a single record.
    ///
    /// Returns `Ok(None)` when `key` is absent. If `f` fails, nothing is persisted.
    pub async fn update<T, F>(&self, key: &K, f: F) -> Result<Option<T>, ServiceError>
    where
        F: FnOnce(&mut V) -> Result<T, ServiceError>,
    {
        let mut state = self.inner.write().await;
        let Some(current) = state.map.get(key) else {
            return Ok(None);
        };
        let mut record = current.clone();
        let out = f(&mut record)?;
        self.persist(&mut state, encode_put(key, &record)?).await?;
        state.map.insert(key.clone(), record);
        self.maybe_compact(&mut state).await;
        Ok(Some(out))
    }

    /// Apply a mutation to the whole map and persist it as one batch.
    pub async fn update_map<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut BTreeMap<K, V>) -> Result<T, ServiceError>,
    {
        let mut state = self.inner.write().await;
        let mut next = state.map.clone();
        let out = f(&mut next)?;

        let mut ops: Vec<JournalOp<K, V>> = state
            .map
            .keys()
            .filter(|k| !next.contains_key(*k))
            .map(|k| JournalOp::Delete { key: k.clone() })
            .collect();
        ops.extend(
            next.iter()
                .filter(|(k, v)| state.map.get(*k) != Some(*v))
                .map(|(k, v)| JournalOp::Put { key: k.clone(), value: v.clone() }),
        );
        if !ops.is_empty() {
            self.persist(&mut state, encode_line(&JournalOp::Batch { ops })?).await?;
            state.map = next;
            self.maybe_compact(&mut state).await;
        }
        Ok(out)
    }
}
