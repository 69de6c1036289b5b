//! Report types.

use std::collections::BTreeMap;

use serde::Serialize;
use web_utils::{format_hashrate, format_offline_since};

use crate::metrics::{derive_hashrate, HashrateParams};

/// One mining device of a client, as read from the workers store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    pub worker_id: String,
    pub display_name: String,
    /// Seconds until the record expires; negative when the record has no expiry.
    pub time_to_live: i64,
}

/// Share totals of one worker (or one display name, once merged) over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowAggregate {
    /// Difficulty of every share in the window, valid or not.
    pub total_difficulty: u64,
    pub invalid_difficulty: u64,
    pub share_count: u64,
    pub invalid_share_count: u64,
}

impl WindowAggregate {
    pub fn record(&mut self, difficulty: u64, valid: bool) {
        self.share_count += 1;
        self.total_difficulty = self.total_difficulty.saturating_add(difficulty);
        if !valid {
            self.invalid_share_count += 1;
            self.invalid_difficulty = self.invalid_difficulty.saturating_add(difficulty);
        }
    }

    pub fn merge(&mut self, other: &WindowAggregate) {
        self.total_difficulty = self.total_difficulty.saturating_add(other.total_difficulty);
        self.invalid_difficulty = self
            .invalid_difficulty
            .saturating_add(other.invalid_difficulty);
        self.share_count += other.share_count;
        self.invalid_share_count += other.invalid_share_count;
    }

    pub fn hashrate(&self, window_secs: u64, params: &HashrateParams) -> f64 {
        derive_hashrate(self.total_difficulty as f64, window_secs, params)
    }

    /// Hashrate lost to rejected shares, estimated as rejected count times the mean
    /// share difficulty. Zero when the window holds no shares.
    pub fn invalid_hashrate(&self, window_secs: u64, params: &HashrateParams) -> f64 {
        if self.share_count == 0 {
            return 0.0;
        }
        let mean_difficulty = self.total_difficulty as f64 / self.share_count as f64;
        derive_hashrate(
            self.invalid_share_count as f64 * mean_difficulty,
            window_secs,
            params,
        )
    }

    /// Fraction of shares rejected. Zero when the window holds no shares.
    pub fn reject_ratio(&self) -> f64 {
        if self.share_count == 0 {
            0.0
        } else {
            self.invalid_share_count as f64 / self.share_count as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineStatus {
    Online,
    Offline { elapsed_secs: u64 },
}

impl OnlineStatus {
    /// Negative TTL means the store holds the worker key without expiry, which the
    /// pool only does while the worker is submitting. A positive TTL counts down from
    /// `retention_secs`, set when the worker's last share arrived.
    pub fn from_ttl(time_to_live: i64, retention_secs: u64) -> Self {
        if time_to_live < 0 {
            OnlineStatus::Online
        } else {
            OnlineStatus::Offline {
                elapsed_secs: retention_secs.saturating_sub(time_to_live as u64),
            }
        }
    }

    /// Status of several workers reported under one name: online if any is, else the
    /// most recent offline time.
    pub fn combine(self, other: OnlineStatus) -> OnlineStatus {
        match (self, other) {
            (OnlineStatus::Online, _) | (_, OnlineStatus::Online) => OnlineStatus::Online,
            (
                OnlineStatus::Offline { elapsed_secs: a },
                OnlineStatus::Offline { elapsed_secs: b },
            ) => OnlineStatus::Offline {
                elapsed_secs: a.min(b),
            },
        }
    }

    pub fn render(&self) -> String {
        match self {
            OnlineStatus::Online => "online".to_string(),
            OnlineStatus::Offline { elapsed_secs } => format_offline_since(*elapsed_secs),
        }
    }
}

/// Merged per-client result: one aggregate per display name and window, plus the
/// online status of every display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReport {
    pub client_id: String,
    pub windows: BTreeMap<u64, BTreeMap<String, WindowAggregate>>,
    pub online_status: BTreeMap<String, OnlineStatus>,
}

impl ClientReport {
    /// Report with an empty entry for every window.
    pub fn empty(client_id: &str, windows: impl IntoIterator<Item = u64>) -> Self {
        Self {
            client_id: client_id.to_string(),
            windows: windows.into_iter().map(|w| (w, BTreeMap::new())).collect(),
            online_status: BTreeMap::new(),
        }
    }

    pub fn has_workers(&self) -> bool {
        !self.online_status.is_empty()
    }

    pub fn add_worker_status(&mut self, display_name: &str, status: OnlineStatus) {
        self.online_status
            .entry(display_name.to_string())
            .and_modify(|current| *current = current.combine(status))
            .or_insert(status);
    }

    pub fn add_aggregate(&mut self, window_secs: u64, display_name: &str, aggregate: &WindowAggregate) {
        self.windows
            .entry(window_secs)
            .or_default()
            .entry(display_name.to_string())
            .or_default()
            .merge(aggregate);
    }

    pub fn render(&self, params: &HashrateParams) -> RenderedReport {
        let online_status = self
            .online_status
            .iter()
            .map(|(name, status)| (name.clone(), status.render()))
            .collect();

        let windows = self
            .windows
            .iter()
            .map(|(window, workers)| {
                let rendered = workers
                    .iter()
                    .map(|(name, aggregate)| {
                        (name.clone(), RenderedWorkerStats::new(aggregate, *window, params))
                    })
                    .collect();
                (window.to_string(), rendered)
            })
            .collect();

        RenderedReport {
            online_status,
            windows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWorkerStats {
    pub hashrate: String,
    pub hashrate_raw: f64,
    pub invalid_hashrate: String,
    pub shares: u64,
    pub invalid_shares: u64,
    pub reject_ratio: f64,
}

impl RenderedWorkerStats {
    pub fn new(aggregate: &WindowAggregate, window_secs: u64, params: &HashrateParams) -> Self {
        let hashrate = aggregate.hashrate(window_secs, params);
        Self {
            hashrate: format_hashrate(hashrate),
            hashrate_raw: hashrate,
            invalid_hashrate: format_hashrate(aggregate.invalid_hashrate(window_secs, params)),
            shares: aggregate.share_count,
            invalid_shares: aggregate.invalid_share_count,
            reject_ratio: aggregate.reject_ratio(),
        }
    }
}

/// JSON shape of a report: `online_status` plus one object per window, keyed by the
/// window length in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReport {
    pub online_status: BTreeMap<String, String>,
    #[serde(flatten)]
    pub windows: BTreeMap<String, BTreeMap<String, RenderedWorkerStats>>,
}
