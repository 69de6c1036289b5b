//! Versioned layout of the composite worker and share keys.
//!
//! Keys are positional and separator-delimited. Worker keys are always
//! `{client}{sep}{worker}`; the share-key layout depends on the pool version that
//! wrote the store.

use hashrate_redis::escape_glob;
use serde::Deserialize;

use crate::error::{ReportError, Result};

/// Field order of share keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLayout {
    /// `{client}.{worker}.{submission_time}`
    #[default]
    ClientWorkerTime,
    /// `{client}.{submission_time}`, written before shares were tracked per worker.
    ClientTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeySchema {
    #[serde(default)]
    pub layout: KeyLayout,
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_separator() -> char {
    '.'
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            layout: KeyLayout::default(),
            separator: default_separator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerKey {
    pub worker_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareKey {
    pub client_id: String,
    /// Absent for `KeyLayout::ClientTime`.
    pub worker_id: Option<String>,
    pub submission_time: i64,
}

impl KeySchema {
    pub fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Whether share keys carry a worker id.
    pub fn shares_by_worker(&self) -> bool {
        self.layout == KeyLayout::ClientWorkerTime
    }

    fn sep(&self) -> String {
        escape_glob(&self.separator.to_string())
    }

    /// SCAN pattern for every worker key of `client_id`.
    pub fn worker_pattern(&self, client_id: &str) -> String {
        format!("{}{}*", escape_glob(client_id), self.sep())
    }

    /// SCAN pattern for the share keys of one worker. The worker is ignored when
    /// the layout does not carry one.
    pub fn share_pattern(&self, client_id: &str, worker_id: Option<&str>) -> String {
        match (self.layout, worker_id) {
            (KeyLayout::ClientWorkerTime, Some(worker_id)) => format!(
                "{}{}{}{}*",
                escape_glob(client_id),
                self.sep(),
                escape_glob(worker_id),
                self.sep()
            ),
            _ => format!("{}{}*", escape_glob(client_id), self.sep()),
        }
    }

    pub fn parse_worker_key(&self, key: &str) -> Result<WorkerKey> {
        let fields: Vec<&str> = key.split(self.separator).collect();
        match fields.as_slice() {
            [client_id, worker_id] if !client_id.is_empty() && !worker_id.is_empty() => {
                Ok(WorkerKey {
                    worker_id: worker_id.to_string(),
                })
            }
            _ => Err(ReportError::malformed_key(
                key,
                format!("expected 2 fields, found {}", fields.len()),
            )),
        }
    }

    pub fn parse_share_key(&self, key: &str) -> Result<ShareKey> {
        let fields: Vec<&str> = key.split(self.separator).collect();
        let (client_id, worker_id, time) = match (self.layout, fields.as_slice()) {
            (KeyLayout::ClientWorkerTime, [client_id, worker_id, time]) => {
                (*client_id, Some(worker_id.to_string()), *time)
            }
            (KeyLayout::ClientTime, [client_id, time]) => (*client_id, None, *time),
            (layout, _) => {
                let expected = match layout {
                    KeyLayout::ClientWorkerTime => 3,
                    KeyLayout::ClientTime => 2,
                };
                return Err(ReportError::malformed_key(
                    key,
                    format!("expected {} fields, found {}", expected, fields.len()),
                ));
            }
        };

        let submission_time = time.parse::<i64>().map_err(|e| {
            ReportError::malformed_key(key, format!("submission time {:?}: {}", time, e))
        })?;

        Ok(ShareKey {
            client_id: client_id.to_string(),
            worker_id,
            submission_time,
        })
    }
}
