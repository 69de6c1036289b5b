use hashrate_redis::KeyValueStore;
use tracing::debug;

use crate::error::Result;

/// Cursor-driven walk over every key matching a pattern.
///
/// Batches arrive in store order. A key may be returned more than once if the
/// keyspace changes during the walk; the walk ends when the store hands back cursor 0.
pub struct KeyScanner<'a> {
    store: &'a dyn KeyValueStore,
    pattern: String,
    batch_size: usize,
    cursor: u64,
    finished: bool,
}

impl<'a> KeyScanner<'a> {
    pub fn new(store: &'a dyn KeyValueStore, pattern: String, batch_size: usize) -> Self {
        Self {
            store,
            pattern,
            batch_size: batch_size.max(1),
            cursor: 0,
            finished: false,
        }
    }

    /// Next batch of keys, `None` once the walk is complete. Batches may be empty.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        if self.finished {
            return Ok(None);
        }

        let (keys, next_cursor) = self
            .store
            .scan(&self.pattern, self.cursor, self.batch_size)
            .await?;

        debug!(
            "scan {} cursor {} -> {} keys",
            self.pattern,
            self.cursor,
            keys.len()
        );

        self.cursor = next_cursor;
        if next_cursor == 0 {
            self.finished = true;
        }
        Ok(Some(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use hashrate_redis::MemoryStore;

    impl KeyScanner<'_> {
        async fn collect_all(mut self) -> Result<Vec<String>> {
            let mut all = Vec::new();
            while let Some(batch) = self.next_batch().await? {
                all.extend(batch);
            }
            Ok(all)
        }
    }

    #[tokio::test]
    async fn test_scan_collects_all_matches_across_batches() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.set(&format!("c1.{}", i), "x");
        }
        store.set("c2.1", "x");

        let keys = KeyScanner::new(&store, "c1.*".to_string(), 4)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(keys.len(), 25);
        assert!(keys.iter().all(|k| k.starts_with("c1.")));
    }

    #[tokio::test]
    async fn test_scan_counts_batches() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.set(&format!("c1.{}", i), "x");
        }

        let mut scanner = KeyScanner::new(&store, "c1.*".to_string(), 5);
        let mut batches = 0;
        while let Some(batch) = scanner.next_batch().await.unwrap() {
            assert_eq!(batch.len(), 5);
            batches += 1;
        }
        assert_eq!(batches, 2);
        assert!(scanner.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scan_empty_store_terminates() {
        let store = MemoryStore::new();
        let keys = KeyScanner::new(&store, "c1.*".to_string(), 100)
            .collect_all()
            .await
            .unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_scan_store_failure() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = KeyScanner::new(&store, "c1.*".to_string(), 100)
            .collect_all()
            .await;
        assert!(matches!(result, Err(ReportError::StoreUnavailable(_))));
    }
}
