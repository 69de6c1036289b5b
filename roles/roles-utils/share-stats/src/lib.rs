//! Share aggregation and hashrate reporting over the pool's Redis stores.
//!
//! The pool server writes one hash per accepted or rejected share and one per worker.
//! This crate scans those records for a client, totals share difficulty per trailing
//! window, and turns the totals into a per-worker hashrate report.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod report;
pub mod scanner;
pub mod stores;
pub mod types;
pub mod windowing;

pub use aggregator::ShareAggregator;
pub use config::ReportConfig;
pub use error::ReportError;
pub use keys::{KeyLayout, KeySchema};
pub use metrics::{derive_hashrate, HashrateParams};
pub use report::HashrateReporter;
pub use stores::StoreSet;
pub use types::{ClientReport, OnlineStatus, RenderedReport, WindowAggregate, WorkerRecord};
pub use windowing::{unix_timestamp, ReportWindows};
