use std::collections::BTreeMap;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::aggregator::ShareAggregator;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::keys::KeySchema;
use crate::scanner::KeyScanner;
use crate::stores::StoreSet;
use crate::types::{ClientReport, OnlineStatus, WindowAggregate, WorkerRecord};
use crate::windowing::{unix_timestamp, ReportWindows};

const WORKER_NAME_FIELD: &str = "worker";

/// Builds a client's hashrate report from the pool's stores.
///
/// Each call runs wallet lookup, worker enumeration, per-worker aggregation, and the
/// merge by display name. Nothing is kept between calls.
pub struct HashrateReporter {
    stores: StoreSet,
    config: ReportConfig,
    aggregator: ShareAggregator,
    default_windows: ReportWindows,
}

impl HashrateReporter {
    pub fn new(stores: StoreSet, config: ReportConfig) -> Result<Self> {
        let default_windows = ReportWindows::new(config.windows.iter().copied())?;
        let aggregator = ShareAggregator::new(stores.shares.clone(), &config);
        Ok(Self {
            stores,
            config,
            aggregator,
            default_windows,
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// Windows from the configuration, used when a request names none.
    pub fn default_windows(&self) -> &ReportWindows {
        &self.default_windows
    }

    pub async fn compute_report(&self, wallet: &str, windows: &ReportWindows) -> Result<ClientReport> {
        self.compute_report_at(wallet, windows, unix_timestamp()).await
    }

    /// Report for `wallet` with windows ending at `now` (minus the acknowledgement
    /// delay). A client without workers yields an empty report, not an error.
    pub async fn compute_report_at(
        &self,
        wallet: &str,
        windows: &ReportWindows,
        now: i64,
    ) -> Result<ClientReport> {
        let wallet = wallet.trim();
        if wallet.is_empty() {
            return Err(ReportError::NoWallet);
        }

        let client_id = self.resolve_client(wallet).await?;
        let workers = self.list_workers(&client_id).await?;

        let mut report = ClientReport::empty(&client_id, windows.iter());
        if workers.is_empty() {
            info!("Client {} (wallet {}) has no workers", client_id, wallet);
            return Ok(report);
        }

        if self.config.keys.shares_by_worker() {
            for (worker, totals) in self.aggregate_workers(&client_id, &workers, windows, now).await? {
                self.merge_worker(&mut report, &worker.display_name, worker, &totals);
            }
        } else {
            // Shares carry no worker id: one aggregate for the client, reported
            // under the client id.
            let totals = self.aggregator.aggregate(&client_id, None, windows, now).await?;
            for worker in &workers {
                self.merge_worker(&mut report, &client_id, worker, &BTreeMap::new());
            }
            for (window, aggregate) in &totals {
                report.add_aggregate(*window, &client_id, aggregate);
            }
        }

        info!(
            "Computed report for client {}: {} workers under {} names",
            client_id,
            workers.len(),
            report.online_status.len()
        );
        Ok(report)
    }

    async fn resolve_client(&self, wallet: &str) -> Result<String> {
        match self.stores.accounts.get(wallet).await? {
            Some(client_id) if !client_id.trim().is_empty() => Ok(client_id.trim().to_string()),
            _ => Err(ReportError::WalletNotFound(wallet.to_string())),
        }
    }

    /// Every worker record of `client_id`, ordered by worker id. Keys the scan returns
    /// more than once are read once.
    pub async fn list_workers(&self, client_id: &str) -> Result<Vec<WorkerRecord>> {
        let schema: &KeySchema = &self.config.keys;
        let mut scanner = KeyScanner::new(
            self.stores.workers.as_ref(),
            schema.worker_pattern(client_id),
            self.config.scan_batch_size,
        );

        let mut workers = BTreeMap::new();
        while let Some(batch) = scanner.next_batch().await? {
            for key in batch {
                let worker_key = schema.parse_worker_key(&key)?;
                if workers.contains_key(&worker_key.worker_id) {
                    continue;
                }

                let display_name = self
                    .stores
                    .workers
                    .hget(&key, WORKER_NAME_FIELD)
                    .await?
                    .ok_or_else(|| ReportError::malformed_record(&key, WORKER_NAME_FIELD, "missing"))?;
                let time_to_live = self.stores.workers.ttl(&key).await?;

                workers.insert(
                    worker_key.worker_id.clone(),
                    WorkerRecord {
                        worker_id: worker_key.worker_id,
                        display_name,
                        time_to_live,
                    },
                );
            }
        }

        debug!("Client {} has {} workers", client_id, workers.len());
        Ok(workers.into_values().collect())
    }

    /// Aggregate all workers with bounded concurrency. The first failure drops the
    /// aggregations still in flight and is returned.
    async fn aggregate_workers<'w>(
        &self,
        client_id: &str,
        workers: &'w [WorkerRecord],
        windows: &ReportWindows,
        now: i64,
    ) -> Result<Vec<(&'w WorkerRecord, BTreeMap<u64, WindowAggregate>)>> {
        let pending: Vec<_> = workers
            .iter()
            .map(|worker| self.aggregate_worker(client_id, worker, windows, now))
            .collect();

        stream::iter(pending)
            .buffer_unordered(self.config.worker_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn aggregate_worker<'w>(
        &self,
        client_id: &str,
        worker: &'w WorkerRecord,
        windows: &ReportWindows,
        now: i64,
    ) -> Result<(&'w WorkerRecord, BTreeMap<u64, WindowAggregate>)> {
        let totals = self
            .aggregator
            .aggregate(client_id, Some(&worker.worker_id), windows, now)
            .await?;
        Ok((worker, totals))
    }

    fn merge_worker(
        &self,
        report: &mut ClientReport,
        name: &str,
        worker: &WorkerRecord,
        totals: &BTreeMap<u64, WindowAggregate>,
    ) {
        report.add_worker_status(
            name,
            OnlineStatus::from_ttl(worker.time_to_live, self.config.retention_secs),
        );
        for (window, aggregate) in totals {
            report.add_aggregate(*window, name, aggregate);
        }
    }
}
