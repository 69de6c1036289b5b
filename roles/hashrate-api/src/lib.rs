use std::sync::Arc;

use hashrate_redis::{RedisClient, RedisError};
use share_stats::StoreSet;
use tracing::info;

pub mod cli;
pub mod config;
pub mod web;

use config::{Config, RedisConfig};

/// Open one connection-managed handle per logical database. Each handle is pinged on
/// open, so an unreachable database fails here rather than on the first request.
pub async fn open_stores(redis: &RedisConfig) -> Result<StoreSet, RedisError> {
    let accounts = RedisClient::new(&redis.url, redis.accounts_db).await?;
    let workers = RedisClient::new(&redis.url, redis.workers_db).await?;
    let shares = RedisClient::new(&redis.url, redis.shares_db).await?;

    info!(
        "Opened Redis stores at {} (accounts db {}, workers db {}, shares db {})",
        redis.url,
        accounts.db(),
        workers.db(),
        shares.db()
    );

    Ok(StoreSet::new(
        Arc::new(accounts),
        Arc::new(workers),
        Arc::new(shares),
    ))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let fmt_layer = tracing_subscriber::fmt().with_env_filter(env_filter);

    if let Some(log_file) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| format!("Failed to open log file {}: {}", log_file, e))?;
        fmt_layer.with_writer(Arc::new(file)).with_ansi(false).init();
    } else {
        fmt_layer.init();
    }

    Ok(())
}
