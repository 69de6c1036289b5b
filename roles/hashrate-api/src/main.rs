use std::{sync::Arc, time::Duration};
use tracing::info;

use hashrate_api::{
    config::Config,
    init_logging, open_stores,
    web::{run_http_server, AppState},
};
use share_stats::HashrateReporter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_args()?;
    init_logging(&config)?;

    info!("Starting hashrate-api service");
    info!("Redis URL: {}", config.redis.url);
    info!("Web server address: {}", config.listen_address);
    info!("Report windows: {:?}", config.report.windows);
    info!("Request timeout: {} seconds", config.request_timeout_secs);

    let stores = open_stores(&config.redis).await?;
    let reporter = Arc::new(HashrateReporter::new(stores.clone(), config.report.clone())?);
    let state = AppState::new(
        reporter,
        Duration::from_secs(config.request_timeout_secs),
    );

    let served = run_http_server(config.listen_address.clone(), state).await;
    stores.close();
    served
}
