use std::sync::Arc;

use hashrate_redis::KeyValueStore;
use tracing::info;

use crate::error::Result;

/// The three logical databases the pool writes: wallet → client id, worker records,
/// and share records.
#[derive(Clone)]
pub struct StoreSet {
    pub accounts: Arc<dyn KeyValueStore>,
    pub workers: Arc<dyn KeyValueStore>,
    pub shares: Arc<dyn KeyValueStore>,
}

impl StoreSet {
    pub fn new(
        accounts: Arc<dyn KeyValueStore>,
        workers: Arc<dyn KeyValueStore>,
        shares: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            accounts,
            workers,
            shares,
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.accounts.ping().await?;
        self.workers.ping().await?;
        self.shares.ping().await?;
        Ok(())
    }

    /// Release the handles. Connections close once the last clone is dropped.
    pub fn close(self) {
        info!(
            "Closing store handles ({} outstanding references to the accounts store)",
            Arc::strong_count(&self.accounts) - 1
        );
    }
}
