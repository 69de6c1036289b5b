use serde::Deserialize;

use crate::keys::KeySchema;
use crate::metrics::HashrateParams;

/// Parameters of a report computation. Deserialized from the `[report]` table of the
/// service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Window lengths reported when a request does not name its own.
    pub windows: Vec<u64>,
    /// Trailing seconds excluded from every window.
    pub ack_delay_secs: u64,
    /// Expiry the pool sets on worker keys once a worker stops submitting.
    pub retention_secs: u64,
    /// COUNT hint for each SCAN step.
    pub scan_batch_size: usize,
    /// Workers aggregated concurrently within one report.
    pub worker_concurrency: usize,
    pub hashrate: HashrateParams,
    pub keys: KeySchema,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            windows: vec![300, 3600],
            ack_delay_secs: 60,
            retention_secs: 172_800,
            scan_batch_size: 100,
            worker_concurrency: 8,
            hashrate: HashrateParams::default(),
            keys: KeySchema::default(),
        }
    }
}
