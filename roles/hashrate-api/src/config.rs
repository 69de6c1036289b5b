use std::env;
use std::fs;
use serde::Deserialize;
use share_stats::ReportConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_address: String,
    pub request_timeout_secs: u64,
    pub redis: RedisConfig,
    pub report: ReportConfig,
    pub log_level: String,
    pub log_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct HashrateApiConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    redis: RedisConfig,
    #[serde(default)]
    report: ReportConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServerConfig {
    listen_address: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: Some("127.0.0.1:8090".to_string()),
            request_timeout_secs: Some(30),
        }
    }
}

/// Redis topology: one server, one logical database per record kind.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub accounts_db: i64,
    pub workers_db: i64,
    pub shares_db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/".to_string(),
            accounts_db: 0,
            workers_db: 1,
            shares_db: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
            file: None,
        }
    }
}

const DEFAULT_CONFIG_PATH: &str = "config/hashrate-api.toml";

/// Values given on the command line, applied over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen_address: Option<String>,
    pub redis_url: Option<String>,
    pub log_file: Option<String>,
}

fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.iter()
        .position(|arg| names.contains(&arg.as_str()))
        .and_then(|i| args.get(i + 1))
        .cloned()
}

impl Config {
    pub fn from_args() -> Result<Self, Box<dyn std::error::Error>> {
        let args: Vec<String> = env::args().collect();
        Self::from_arg_list(&args)
    }

    pub fn from_arg_list(args: &[String]) -> Result<Self, Box<dyn std::error::Error>> {
        let overrides = Overrides {
            listen_address: flag_value(args, &["--listen-address", "-l"]),
            redis_url: flag_value(args, &["--redis-url", "-r"]),
            log_file: flag_value(args, &["--log-file", "-f"]),
        };
        let config_path = flag_value(args, &["--config", "-c"]);
        Self::load(config_path.as_deref(), overrides)
    }

    /// Read `config_path`, or the default location when none is given. Only the default
    /// location may be absent; an explicit path that cannot be read is an error.
    pub fn load(
        config_path: Option<&str>,
        overrides: Overrides,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = match config_path {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file {}: {}", path, e))?,
            None => fs::read_to_string(DEFAULT_CONFIG_PATH).unwrap_or_default(),
        };
        Self::build(Self::parse(&config_str)?, overrides)
    }

    fn build(
        file_config: HashrateApiConfig,
        overrides: Overrides,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listen_address = overrides
            .listen_address
            .or(file_config.server.listen_address)
            .ok_or("Missing required config: server.listen_address")?;

        let mut redis = file_config.redis;
        if let Some(url) = overrides.redis_url {
            redis.url = url;
        }

        Ok(Config {
            listen_address,
            request_timeout_secs: file_config.server.request_timeout_secs.unwrap_or(30),
            redis,
            report: file_config.report,
            log_level: file_config.logging.level.unwrap_or_else(|| "info".to_string()),
            log_file: overrides.log_file.or(file_config.logging.file),
        })
    }

    fn parse(config_str: &str) -> Result<HashrateApiConfig, toml::de::Error> {
        if config_str.trim().is_empty() {
            Ok(HashrateApiConfig::default())
        } else {
            toml::from_str(config_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_config_deserialization() {
        let toml_str = r#"
            [server]
            listen_address = "0.0.0.0:9000"
            request_timeout_secs = 5

            [redis]
            url = "redis://10.0.0.5:6380/"
            accounts_db = 3
            workers_db = 4
            shares_db = 5

            [report]
            windows = [180]
            ack_delay_secs = 15

            [report.hashrate]
            hash_constant = 4294967296.0
            unit_divisor = 1.0

            [logging]
            level = "debug"
            file = "/tmp/hashrate.log"
        "#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.server.listen_address, Some("0.0.0.0:9000".to_string()));
        assert_eq!(config.server.request_timeout_secs, Some(5));
        assert_eq!(config.redis.url, "redis://10.0.0.5:6380/");
        assert_eq!(config.redis.accounts_db, 3);
        assert_eq!(config.redis.workers_db, 4);
        assert_eq!(config.redis.shares_db, 5);
        assert_eq!(config.report.windows, vec![180]);
        assert_eq!(config.report.ack_delay_secs, 15);
        assert_eq!(config.report.hashrate.unit_divisor, 1.0);
        assert_eq!(config.logging.level, Some("debug".to_string()));
        assert_eq!(config.logging.file, Some("/tmp/hashrate.log".to_string()));
    }

    fn write_config(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::build(Config::parse("").unwrap(), Overrides::default()).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:8090");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.redis, RedisConfig::default());
        assert_eq!(config.report, ReportConfig::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::parse("[server]\nrequest_timeout_secs = 5\n").unwrap();
        assert_eq!(config.server.listen_address, Some("127.0.0.1:8090".to_string()));
        assert_eq!(config.server.request_timeout_secs, Some(5));
    }

    #[test]
    fn test_explicit_missing_config_file_is_an_error() {
        let result = Config::from_arg_list(&args(&[
            "hashrate_api",
            "--config",
            "/nonexistent/hashrate-api.toml",
        ]));
        assert!(result.is_err());
        assert!(Config::load(Some("/nonexistent/hashrate-api.toml"), Overrides::default()).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let path = write_config(
            "hashrate-api-overrides",
            "[redis]\nurl = \"redis://file:6379/\"\nshares_db = 7\n[logging]\nfile = \"file.log\"\n",
        );
        let config = Config::from_arg_list(&args(&[
            "hashrate_api",
            "-c",
            path.as_str(),
            "-l",
            "0.0.0.0:1234",
            "--redis-url",
            "redis://redis:6379/",
            "-f",
            "api.log",
        ]))
        .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.listen_address, "0.0.0.0:1234");
        assert_eq!(config.redis.url, "redis://redis:6379/");
        assert_eq!(config.redis.shares_db, 7);
        assert_eq!(config.log_file, Some("api.log".to_string()));
    }
}
