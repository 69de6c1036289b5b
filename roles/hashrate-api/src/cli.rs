//! Command-line arguments of the `hashrate_report` binary.

use clap::Parser;

use crate::config::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the hashrate report of a wallet", long_about = None)]
pub struct ReportArgs {
    #[arg(help = "Wallet address to report on")]
    pub wallet: String,
    #[arg(help = "Comma separated window lengths in seconds, e.g. 300,3600")]
    pub windows: Option<String>,
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the TOML configuration file (defaults to config/hashrate-api.toml)"
    )]
    pub config_path: Option<String>,
    #[arg(short = 'r', long = "redis-url", help = "Redis server URL")]
    pub redis_url: Option<String>,
    #[arg(
        short = 'f',
        long = "log-file",
        help = "Path to the log file. If not set, logs will only be written to stdout."
    )]
    pub log_file: Option<String>,
}

impl ReportArgs {
    pub fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        Config::load(
            self.config_path.as_deref(),
            Overrides {
                listen_address: None,
                redis_url: self.redis_url.clone(),
                log_file: self.log_file.clone(),
            },
        )
    }
}
