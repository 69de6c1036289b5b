use clap::Parser;

use hashrate_api::{cli::ReportArgs, init_logging, open_stores};
use share_stats::{HashrateReporter, ReportWindows};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ReportArgs::parse();
    let config = args.load_config()?;
    init_logging(&config)?;

    let stores = open_stores(&config.redis).await?;
    let reporter = HashrateReporter::new(stores.clone(), config.report.clone())?;
    let windows = match &args.windows {
        Some(list) => ReportWindows::parse(list)?,
        None => reporter.default_windows().clone(),
    };

    let report = reporter.compute_report(&args.wallet, &windows).await?;
    if !report.has_workers() {
        println!("no workers for wallet {}", args.wallet);
    }

    let params = &reporter.config().hashrate;
    for (window, workers) in &report.windows {
        for (name, aggregate) in workers {
            let status = report
                .online_status
                .get(name)
                .map(|status| status.render())
                .unwrap_or_default();
            println!(
                "{}\t{}\t{}\treject:{}\t{}",
                name,
                window,
                web_utils::format_hashrate(aggregate.hashrate(*window, params)),
                aggregate.invalid_share_count,
                status
            );
        }
    }

    stores.close();
    Ok(())
}
