//! Throughput estimation for import job progress
//!
//! The poll loop feeds `(elapsed ms, processed rows)` samples into a sliding
//! window; the window derives a rows-per-second rate and a remaining-time
//! estimate. Estimates err on the side of silence — a stale or nonsensical
//! ETA is worse than none.

use std::collections::VecDeque;
use std::time::Duration;

use crate::types::JobStatus;

/// Samples older than this (relative to the newest sample) are pruned.
const WINDOW_MS: u64 = 60_000;

/// Estimates below this are suppressed to avoid jitter on near-complete
/// imports.
const MIN_ETA_SECONDS: f64 = 5.0;

/// One `(timestamp, processed-row-count)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    /// Milliseconds since the poll session started.
    pub at_ms: u64,
    pub processed: u64,
}

/// Sliding window of progress samples for one import session.
///
/// Owned exclusively by that session's poll loop; a new submission gets a
/// fresh, empty window.
#[derive(Debug, Default)]
pub struct ProgressWindow {
    samples: VecDeque<ProgressSample>,
}

impl ProgressWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, then prune everything older than the 60 s window
    /// behind it.
    pub fn record(&mut self, at_ms: u64, processed: u64) {
        self.samples.push_back(ProgressSample { at_ms, processed });
        let cutoff = at_ms.saturating_sub(WINDOW_MS);
        while let Some(front) = self.samples.front() {
            if front.at_ms < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of retained samples (for testing)
    #[cfg(test)]
    fn len(&self) -> usize {
        self.samples.len()
    }

    /// Observed throughput across the window. `None` until two samples with
    /// distinct timestamps and forward motion exist.
    pub fn rows_per_second(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let earliest = self.samples.front()?;
        let latest = self.samples.back()?;
        if latest.at_ms == earliest.at_ms {
            return None;
        }

        let rows = latest.processed as f64 - earliest.processed as f64;
        let seconds = (latest.at_ms - earliest.at_ms) as f64 / 1000.0;
        let rate = rows / seconds;
        if rate <= 0.0 {
            return None;
        }
        Some(rate)
    }

    /// Estimated time remaining to reach `total_rows`, or `None` when the
    /// estimate would be unreliable (too few samples, no forward motion) or
    /// too jittery (under 5 s remaining).
    pub fn eta(&self, total_rows: u64) -> Option<Duration> {
        let rate = self.rows_per_second()?;
        let processed = self.samples.back()?.processed;
        let remaining = total_rows.saturating_sub(processed) as f64;
        let eta_seconds = remaining / rate;
        if eta_seconds < MIN_ETA_SECONDS {
            return None;
        }
        Some(Duration::from_secs_f64(eta_seconds))
    }
}

/// Percent complete for display.
///
/// 100 is reserved for the terminal `completed` status; while the job is
/// still running the value is clamped to 99 so the UI never shows a
/// premature "done". `None` means indeterminate — show a spinner, not a
/// number.
pub fn percent_complete(
    status: JobStatus,
    processed_rows: Option<u64>,
    total_rows: Option<u64>,
) -> Option<u8> {
    if status == JobStatus::Completed {
        return Some(100);
    }
    let processed = processed_rows?;
    let total = total_rows.filter(|t| *t > 0)?;
    let percent = (100 * processed / total).min(99) as u8;
    Some(percent)
}

/// Human-readable label for the current processing stage.
///
/// Backend phase strings are free-form snake_case; prettify them, falling
/// back to a per-status default when absent.
pub fn phase_label(status: JobStatus, phase: Option<&str>) -> String {
    if let Some(phase) = phase.map(str::trim).filter(|p| !p.is_empty()) {
        let mut label = String::with_capacity(phase.len());
        for c in phase.chars() {
            label.push(if c == '_' || c == '-' { ' ' } else { c });
        }
        let mut chars = label.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => label,
        };
    }

    match status {
        JobStatus::Pending => "Waiting in queue".to_string(),
        JobStatus::Processing => "Processing rows".to_string(),
        JobStatus::Completed => "Import complete".to_string(),
        JobStatus::Failed => "Import failed".to_string(),
    }
}

/// Format an ETA as `minutes:seconds`, e.g. `1:30`.
pub fn format_eta(eta: Duration) -> String {
    let total_seconds = eta.as_secs();
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
