//! JSONL journal: one mutation per line.
//!
//! A store's content is the replay of its journal. Compaction rewrites the
//! journal as one `put` per live entry.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalOp<K, V> {
    Put { key: K, value: V },
    Delete { key: K },
    /// Applied all-or-nothing: the batch is a single line.
    Batch { ops: Vec<JournalOp<K, V>> },
}

impl<K: Ord, V> JournalOp<K, V> {
    pub fn apply(self, map: &mut BTreeMap<K, V>) {
        match self {
            JournalOp::Put { key, value } => {
                map.insert(key, value);
            }
            JournalOp::Delete { key } => {
                map.remove(&key);
            }
            JournalOp::Batch { ops } => {
                for op in ops {
                    op.apply(map);
                }
            }
        }
    }
}

pub fn encode_line<T: Serialize>(op: &T) -> Result<Vec<u8>, ServiceError> {
    let mut line = serde_json::to_vec(op).map_err(ServiceError::storage)?;
    line.push(b'\n');
    Ok(line)
}

/// Borrowed form of `JournalOp::Put`, same wire shape.
#[derive(Serialize)]
#[serde(tag = "op", rename = "put")]
struct PutRef<'a, K, V> {
    key: &'a K,
    value: &'a V,
}

pub fn encode_put<K: Serialize, V: Serialize>(key: &K, value: &V) -> Result<Vec<u8>, ServiceError> {
    encode_line(&PutRef { key, value })
}

/// Snapshot of `map` as one `put` line per entry, in key order.
pub fn encode_snapshot<K, V>(map: &BTreeMap<K, V>) -> Result<Vec<u8>, ServiceError>
where
    K: Serialize,
    V: Serialize,
{
    let mut out = Vec::new();
    for (key, value) in map {
        out.extend(encode_put(key, value)?);
    }
    Ok(out)
}

/// Replay journal bytes into a map; returns the map and the number of ops read.
///
/// A final line without its trailing newline was never acknowledged and is
/// dropped if it does not parse. Any other bad line is corruption.
pub fn replay<K, V>(bytes: &[u8]) -> Result<(BTreeMap<K, V>, usize), ServiceError>
where
    K: Ord + DeserializeOwned,
    V: DeserializeOwned,
{
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ServiceError::storage(format!("journal is not UTF-8: {e}")))?;
    let complete = text.ends_with('\n');
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    let mut map = BTreeMap::new();
    let mut ops = 0;
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalOp<K, V>>(trimmed) {
            Ok(op) => {
                op.apply(&mut map);
                ops += 1;
            }
            Err(e) if idx == last && !complete => {
                warn!(line = idx + 1, error = %e, "dropping torn journal tail");
            }
            Err(e) => {
                return Err(ServiceError::storage(format!("journal line {}: {e}", idx + 1)));
            }
        }
    }
    Ok((map, ops))
}

#[cfg(test)]
mod tests {
    use super::*;

    type Op = JournalOp<String, u8>;

    fn put(k: &str, v: u8) -> Op {
        Op::Put { key: k.into(), value: v }
    }

    #[test]
    fn replay_applies_puts_deletes_and_batches() -> Result<(), anyhow::Error> {
        let mut bytes = Vec::new();
        bytes.extend(encode_line(&put("a", 1))?);
        bytes.extend(encode_line(&put("b", 2))?);
        bytes.extend(encode_line(&Op::Delete { key: "a".into() })?);
        bytes.extend(encode_line(&Op::Batch { ops: vec![put("c", 3), put("b", 20)] })?);

        let (map, ops) = replay::<String, u8>(&bytes)?;
        assert_eq!(ops, 4);
        assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![("b".to_string(), 20), ("c".to_string(), 3)]);
        Ok(())
    }

    #[test]
    fn torn_tail_is_dropped_but_inner_garbage_is_corruption() -> Result<(), anyhow::Error> {
        let mut bytes = encode_line(&put("a", 1))?;
        bytes.extend_from_slice(b"{\"op\":\"put\",\"key\":\"b\"");
        let (map, ops) = replay::<String, u8>(&bytes)?;
        assert_eq!(ops, 1);
        assert_eq!(map.len(), 1);

        let mut bad = b"garbage\n".to_vec();
        bad.extend(encode_line(&put("a", 1))?);
        assert!(matches!(replay::<String, u8>(&bad), Err(ServiceError::Storage(_))));
        Ok(())
    }

    #[test]
    fn borrowed_put_matches_owned_put() -> Result<(), anyhow::Error> {
        assert_eq!(encode_put(&"a".to_string(), &1u8)?, encode_line(&put("a", 1))?);
        Ok(())
    }

    #[test]
    fn snapshot_replays_to_the_same_map() -> Result<(), anyhow::Error> {
        let map: BTreeMap<String, u8> = [("x".to_string(), 9), ("y".to_string(), 8)].into_iter().collect();
        let snapshot = encode_snapshot(&map)?;
        let (back, ops) = replay::<String, u8>(&snapshot)?;
        assert_eq!(back, map);
        assert_eq!(ops, 2);
        Ok(())
    }
}
