use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::RedisError;
use crate::store::{glob_match, KeyValueStore};

#[derive(Debug, Clone)]
enum Value {
    String(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    ttl: Option<i64>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    unavailable: bool,
    replay_scans: bool,
}

/// In-memory `KeyValueStore` for tests and local runs without a Redis server.
///
/// SCAN walks keys in sorted order and treats `count` as the number of keys examined
/// per step, like Redis does, so a step may return fewer matches than `count` (or none)
/// while the cursor is still non-zero. Expiry is not simulated; the stored TTL is
/// reported as-is.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.inner.write().entries.insert(
            key.to_string(),
            Entry {
                value: Value::String(value.to_string()),
                ttl: None,
            },
        );
    }

    /// Set fields on the hash at `key`, creating it if needed.
    pub fn hset(&self, key: &str, fields: &[(&str, &str)]) {
        let mut inner = self.inner.write();
        let entry = inner.entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Hash(HashMap::new()),
            ttl: None,
        });
        if !matches!(entry.value, Value::Hash(_)) {
            entry.value = Value::Hash(HashMap::new());
        }
        if let Value::Hash(hash) = &mut entry.value {
            for (field, value) in fields {
                hash.insert(field.to_string(), value.to_string());
            }
        }
    }

    /// Record a remaining lifetime for an existing key.
    pub fn expire(&self, key: &str, ttl_secs: i64) {
        if let Some(entry) = self.inner.write().entries.get_mut(key) {
            entry.ttl = Some(ttl_secs);
        }
    }

    /// Make every subsequent call fail as if the connection dropped.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unavailable = unavailable;
    }

    /// Make every SCAN step after the first start one step early, so keys already
    /// returned come back again, as Redis may do while the keyspace is rehashing.
    pub fn set_replay_scans(&self, replay: bool) {
        self.inner.write().replay_scans = replay;
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(inner: &Inner) -> Result<(), RedisError> {
        if inner.unavailable {
            return Err(RedisError::ConnectionError(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        match inner.entries.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Hash(_)) => Err(RedisError::InvalidDataFormat(format!(
                "WRONGTYPE {} holds a hash",
                key
            ))),
        }
    }

    async fn scan(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(Vec<String>, u64), RedisError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;

        let start = cursor as usize;
        let step = count.max(1);
        let first = if inner.replay_scans {
            start.saturating_sub(step)
        } else {
            start
        };
        let keys: Vec<String> = inner
            .entries
            .keys()
            .skip(first)
            .take(start + step - first)
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();

        let next = start + step;
        let next_cursor = if next >= inner.entries.len() {
            0
        } else {
            next as u64
        };
        Ok((keys, next_cursor))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, RedisError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        match inner.entries.get(key).map(|e| &e.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(Value::String(_)) => Err(RedisError::InvalidDataFormat(format!(
                "WRONGTYPE {} holds a string",
                key
            ))),
        }
    }

    async fn ttl(&self, key: &str) -> Result<i64, RedisError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        Ok(match inner.entries.get(key) {
            None => -2,
            Some(entry) => entry.ttl.unwrap_or(-1),
        })
    }

    async fn ping(&self) -> Result<(), RedisError> {
        Self::check_available(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_and_hget() {
        let store = MemoryStore::new();
        store.set("wallet", "c1");
        store.hset("c1.1", &[("worker", "rig-a")]);

        assert_eq!(store.get("wallet").await.unwrap(), Some("c1".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(
            store.hget("c1.1", "worker").await.unwrap(),
            Some("rig-a".to_string())
        );
        assert_eq!(store.hget("c1.1", "valid").await.unwrap(), None);
        assert!(store.get("c1.1").await.is_err());
    }

    #[tokio::test]
    async fn test_ttl_follows_redis_conventions() {
        let store = MemoryStore::new();
        store.hset("c1.1", &[("worker", "rig-a")]);
        assert_eq!(store.ttl("c1.1").await.unwrap(), -1);
        store.expire("c1.1", 3600);
        assert_eq!(store.ttl("c1.1").await.unwrap(), 3600);
        assert_eq!(store.ttl("c1.2").await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_scan_walks_every_key_in_steps() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store.set(&format!("c1.{}", i), "x");
        }
        store.set("c2.0", "x");

        let mut cursor = 0;
        let mut seen = Vec::new();
        let mut steps = 0;
        loop {
            let (keys, next) = store.scan("c1.*", cursor, 3).await.unwrap();
            seen.extend(keys);
            steps += 1;
            if next == 0 {
                break;
            }
            cursor = next;
        }
        assert_eq!(steps, 3);
        assert_eq!(seen.len(), 7);
        assert!(!seen.contains(&"c2.0".to_string()));
    }

    #[tokio::test]
    async fn test_replayed_scan_returns_keys_again() {
        let store = MemoryStore::new();
        for i in 0..4 {
            store.set(&format!("c1.{}", i), "x");
        }
        store.set_replay_scans(true);

        let (first, cursor) = store.scan("c1.*", 0, 2).await.unwrap();
        assert_eq!(first, vec!["c1.0".to_string(), "c1.1".to_string()]);
        let (second, cursor) = store.scan("c1.*", cursor, 2).await.unwrap();
        assert_eq!(cursor, 0);
        assert_eq!(second.len(), 4);
        assert!(second.contains(&"c1.0".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get("wallet").await,
            Err(RedisError::ConnectionError(_))
        ));
        assert!(store.scan("*", 0, 10).await.is_err());
        assert!(store.ping().await.is_err());
    }
}
