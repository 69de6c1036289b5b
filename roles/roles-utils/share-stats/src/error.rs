use hashrate_redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No wallet address supplied")]
    NoWallet,

    #[error("Wallet address not found: {0}")]
    WalletNotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] RedisError),

    #[error("Malformed key {key}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Malformed record {key} field {field}: {reason}")]
    MalformedRecord {
        key: String,
        field: String,
        reason: String,
    },

    #[error("Invalid report window: {0}")]
    InvalidWindow(String),
}

impl ReportError {
    pub(crate) fn malformed_key(key: &str, reason: impl Into<String>) -> Self {
        ReportError::MalformedKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_record(key: &str, field: &str, reason: impl Into<String>) -> Self {
        ReportError::MalformedRecord {
            key: key.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
