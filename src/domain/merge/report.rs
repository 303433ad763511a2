//! Report module.
//!
//! This module contains the progress and summary types produced by
//! merge runs, plus the pre-run duration estimate shown before a batch
//! starts.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::{RunOutcome, SendMode};

fn date<S: Serializer>(date: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.to_rfc3339())
}

/// Represents the progress of a run, published once per successful
/// send.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Progress {
    pub sent: usize,
    pub total: usize,
    /// Fraction of rows processed, between 0 and 1.
    pub fraction: f64,
    /// Estimated remaining time in seconds, extrapolated from the
    /// average time per sent row.
    pub eta_secs: f64,
}

impl Progress {
    pub fn compute(sent: usize, total: usize, elapsed: Duration) -> Self {
        let fraction = if total > 0 {
            sent as f64 / total as f64
        } else {
            1.0
        };
        let eta_secs = if sent > 0 {
            (total - sent) as f64 * elapsed.as_secs_f64() / sent as f64
        } else {
            0.0
        };

        Self {
            sent,
            total,
            fraction,
            eta_secs,
        }
    }
}

/// Represents the outcome ledger of one run. Skipped and failed rows
/// are always part of the summary, never silently dropped.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// Represents how the loop ended. A failed run surfaces as an
    /// error instead of a report.
    pub outcome: RunOutcome,
    /// Represents the mode the run was sent with.
    pub mode: SendMode,
    /// Represents the number of messages sent or drafted.
    pub sent: usize,
    /// Represents the raw cell values of rows without a valid address.
    pub skipped: Vec<String>,
    /// Represents the addresses paired with the error that failed
    /// their row.
    pub failures: Vec<(String, String)>,
    #[serde(serialize_with = "date")]
    pub started_at: DateTime<Local>,
    /// Represents the total run duration in seconds.
    pub elapsed_secs: f64,
}

/// Represents the pre-run duration estimate for a batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EtaEstimate {
    pub total_rows: usize,
    /// Estimated duration in seconds, before the pacing jitter of
    /// roughly ten percent.
    pub duration_secs: u64,
    #[serde(serialize_with = "date")]
    pub window_start: DateTime<Local>,
    #[serde(serialize_with = "date")]
    pub window_end: DateTime<Local>,
}

impl EtaEstimate {
    /// Estimates the duration of a batch of `total_rows` rows paced by
    /// `delay` seconds, as a local-time window starting now.
    pub fn compute(total_rows: usize, delay: u64) -> Self {
        Self::compute_from(total_rows, delay, Local::now())
    }

    pub fn compute_from(total_rows: usize, delay: u64, start: DateTime<Local>) -> Self {
        let duration_secs = total_rows as u64 * delay;
        Self {
            total_rows,
            duration_secs,
            window_start: start,
            window_end: start + chrono::Duration::seconds(duration_secs as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_compute() {
        let progress = Progress::compute(2, 4, Duration::from_secs(60));

        assert_eq!(2, progress.sent);
        assert_eq!(4, progress.total);
        assert_eq!(0.5, progress.fraction);
        // 2 rows left at 30s per row
        assert_eq!(60.0, progress.eta_secs);
    }

    #[test]
    fn test_progress_compute_without_sends() {
        let progress = Progress::compute(0, 4, Duration::from_secs(60));

        assert_eq!(0.0, progress.fraction);
        assert_eq!(0.0, progress.eta_secs);
    }

    #[test]
    fn test_progress_compute_empty_table() {
        let progress = Progress::compute(0, 0, Duration::from_secs(0));

        assert_eq!(1.0, progress.fraction);
    }

    #[test]
    fn test_eta_estimate_window() {
        let start = Local::now();
        let eta = EtaEstimate::compute_from(10, 20, start);

        assert_eq!(10, eta.total_rows);
        assert_eq!(200, eta.duration_secs);
        assert_eq!(start, eta.window_start);
        assert_eq!(
            chrono::Duration::seconds(200),
            eta.window_end - eta.window_start
        );
    }
}
