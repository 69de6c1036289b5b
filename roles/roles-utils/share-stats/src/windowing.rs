//! Trailing report windows and their acknowledgement-delayed bounds.
//!
//! A window of length `L` evaluated at `now` with acknowledgement delay `D` covers the
//! closed interval `[now - L - D, now - D]`. The trailing `D` seconds are left out
//! because the pool may still reject shares submitted that recently.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ReportError, Result};

/// Get current Unix timestamp in seconds.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Inclusive bounds of one window at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub window_secs: u64,
    pub start: i64,
    pub end: i64,
}

impl WindowBounds {
    pub fn new(window_secs: u64, now: i64, ack_delay_secs: u64) -> Self {
        let end = now.saturating_sub(ack_delay_secs as i64);
        let start = end.saturating_sub(window_secs as i64);
        Self {
            window_secs,
            start,
            end,
        }
    }

    pub fn contains(&self, submission_time: i64) -> bool {
        self.start <= submission_time && submission_time <= self.end
    }
}

/// Ordered, de-duplicated set of window lengths in seconds. Never empty and never
/// contains a zero-length window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindows(BTreeSet<u64>);

impl ReportWindows {
    pub fn new(windows: impl IntoIterator<Item = u64>) -> Result<Self> {
        let set: BTreeSet<u64> = windows.into_iter().collect();
        if set.is_empty() {
            return Err(ReportError::InvalidWindow("no windows requested".to_string()));
        }
        if set.contains(&0) {
            return Err(ReportError::InvalidWindow(
                "window length must be positive".to_string(),
            ));
        }
        Ok(Self(set))
    }

    /// Parse a comma separated list such as `300,3600`.
    pub fn parse(list: &str) -> Result<Self> {
        let windows = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|_| ReportError::InvalidWindow(s.to_string()))
            })
            .collect::<Result<Vec<u64>>>()?;
        Self::new(windows)
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bounds(&self, now: i64, ack_delay_secs: u64) -> Vec<WindowBounds> {
        self.iter()
            .map(|window| WindowBounds::new(window, now, ack_delay_secs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_closed() {
        let bounds = WindowBounds::new(300, 10_000, 60);
        assert_eq!(bounds.start, 9_640);
        assert_eq!(bounds.end, 9_940);
        assert!(bounds.contains(9_640));
        assert!(bounds.contains(9_940));
        assert!(!bounds.contains(9_639));
        assert!(!bounds.contains(9_941));
    }

    #[test]
    fn test_zero_ack_delay() {
        let bounds = WindowBounds::new(10, 100, 0);
        assert!(bounds.contains(100));
        assert!(bounds.contains(90));
        assert!(!bounds.contains(89));
    }

    #[test]
    fn test_report_windows_sorted_and_deduplicated() {
        let windows = ReportWindows::new(vec![3600, 300, 3600]).unwrap();
        assert_eq!(windows.iter().collect::<Vec<_>>(), vec![300, 3600]);
    }

    #[test]
    fn test_report_windows_rejects_empty_and_zero() {
        assert!(matches!(
            ReportWindows::new(Vec::new()),
            Err(ReportError::InvalidWindow(_))
        ));
        assert!(ReportWindows::new(vec![0, 300]).is_err());
    }

    #[test]
    fn test_report_windows_parse() {
        let windows = ReportWindows::parse("300, 3600").unwrap();
        assert_eq!(windows.len(), 2);
        assert!(ReportWindows::parse("300,abc").is_err());
        assert!(ReportWindows::parse("").is_err());
    }
}
