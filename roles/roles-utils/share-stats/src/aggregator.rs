use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use hashrate_redis::KeyValueStore;
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::keys::KeySchema;
use crate::scanner::KeyScanner;
use crate::types::WindowAggregate;
use crate::windowing::ReportWindows;

const VALID_FIELD: &str = "valid";
const DIFFICULTY_FIELD: &str = "difficulty";

/// Sums the share records of one worker into per-window totals.
pub struct ShareAggregator {
    store: Arc<dyn KeyValueStore>,
    schema: KeySchema,
    ack_delay_secs: u64,
    scan_batch_size: usize,
}

impl ShareAggregator {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &ReportConfig) -> Self {
        Self {
            store,
            schema: config.keys.clone(),
            ack_delay_secs: config.ack_delay_secs,
            scan_batch_size: config.scan_batch_size,
        }
    }

    /// Scan every share of `worker_id` (or of the whole client when the key layout has
    /// no worker field) and total the ones inside each window as of `now`.
    ///
    /// Windows overlap: a share counts toward every window whose bounds contain it.
    /// A key the scan returns twice counts once. Any unreadable key or record aborts
    /// the aggregation.
    pub async fn aggregate(
        &self,
        client_id: &str,
        worker_id: Option<&str>,
        windows: &ReportWindows,
        now: i64,
    ) -> Result<BTreeMap<u64, WindowAggregate>> {
        let bounds = windows.bounds(now, self.ack_delay_secs);
        let mut totals: BTreeMap<u64, WindowAggregate> = windows
            .iter()
            .map(|window| (window, WindowAggregate::default()))
            .collect();

        let pattern = self.schema.share_pattern(client_id, worker_id);
        let mut scanner = KeyScanner::new(self.store.as_ref(), pattern, self.scan_batch_size);
        let mut seen = HashSet::new();

        while let Some(batch) = scanner.next_batch().await? {
            for key in batch {
                if !seen.insert(key.clone()) {
                    continue;
                }
                let share_key = self.schema.parse_share_key(&key)?;
                let matching: Vec<u64> = bounds
                    .iter()
                    .filter(|b| b.contains(share_key.submission_time))
                    .map(|b| b.window_secs)
                    .collect();
                if matching.is_empty() {
                    continue;
                }

                let (difficulty, valid) = self.read_share(&key).await?;
                for window in matching {
                    totals.entry(window).or_default().record(difficulty, valid);
                }
            }
        }

        debug!(
            "aggregated client {} worker {:?}: {:?}",
            client_id, worker_id, totals
        );
        Ok(totals)
    }

    async fn read_share(&self, key: &str) -> Result<(u64, bool)> {
        let valid = self
            .store
            .hget(key, VALID_FIELD)
            .await?
            .ok_or_else(|| ReportError::malformed_record(key, VALID_FIELD, "missing"))?;
        let difficulty = self
            .store
            .hget(key, DIFFICULTY_FIELD)
            .await?
            .ok_or_else(|| ReportError::malformed_record(key, DIFFICULTY_FIELD, "missing"))?;

        let difficulty = difficulty.trim().parse::<u64>().map_err(|e| {
            ReportError::malformed_record(key, DIFFICULTY_FIELD, format!("{:?}: {}", difficulty, e))
        })?;
        Ok((difficulty, parse_valid(key, &valid)?))
    }
}

/// `0`/`false` marks a rejected share; any other integer or `true` an accepted one.
fn parse_valid(key: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|flag| flag != 0)
            .map_err(|_| ReportError::malformed_record(key, VALID_FIELD, format!("{:?}", raw))),
    }
}
