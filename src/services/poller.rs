//! Adaptive job status polling
//!
//! One poll task per import session. The task owns the attempt counter and
//! the progress window exclusively; observers consume `ProgressReport`
//! snapshots through the handle. At most one status request is ever in
//! flight — the next tick is scheduled strictly after the prior response is
//! processed, so reports and progress samples arrive in time order.
//!
//! Cadence backs off by attempt count, not elapsed time: fast feedback for
//! the likely-short common case, reduced backend load for long imports.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api_client::ImportBackend;
use super::progress::{self, ProgressWindow};
use crate::types::{ImportError, ImportJob, JobStatus};

const FAST_POLL: Duration = Duration::from_millis(1_000);
const STEADY_POLL: Duration = Duration::from_millis(2_500);
const SLOW_POLL: Duration = Duration::from_millis(8_000);

/// Delay scheduled after the poll with the given attempt index.
pub fn delay_for_attempt(attempt: u32) -> Duration {
    match attempt {
        0..=9 => FAST_POLL,
        10..=19 => STEADY_POLL,
        _ => SLOW_POLL,
    }
}

/// Snapshot of displayable progress derived from one poll response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub status: JobStatus,
    /// `None` means indeterminate — render a spinner, not a number.
    pub percent: Option<u8>,
    pub phase: String,
    pub eta: Option<Duration>,
    pub processed_rows: Option<u64>,
    pub total_rows: Option<u64>,
    /// Zero-based poll attempt that produced this report.
    pub attempt: u32,
}

/// Owner handle for a running poll task.
///
/// Dropping the handle cancels the task, so tearing down the importing UI
/// cannot leak a scheduled poll. An already-in-flight request is not
/// aborted; its response is detected as stale and discarded.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    refresh: Arc<Notify>,
    latest: Arc<Mutex<Option<ProgressReport>>>,
    reports: mpsc::UnboundedReceiver<ProgressReport>,
    join: Option<JoinHandle<Result<ImportJob, ImportError>>>,
}

impl PollHandle {
    /// Stop polling. The backend job keeps running server-side.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Force one immediate extra poll. Advances the attempt count by one but
    /// does not reset the backoff schedule.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Most recent report, if any poll has completed yet.
    pub fn latest(&self) -> Option<ProgressReport> {
        self.latest.lock().clone()
    }

    /// Next report from the poll task; `None` once the task has finished.
    pub async fn next_report(&mut self) -> Option<ProgressReport> {
        self.reports.recv().await
    }

    /// Wait for the poll task to finish and return the terminal result.
    pub async fn outcome(mut self) -> Result<ImportJob, ImportError> {
        let join = self.join.take().expect("outcome polled twice");
        match join.await {
            Ok(result) => result,
            Err(err) => {
                warn!("Poll task aborted: {}", err);
                Err(ImportError::Cancelled)
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The poll task state for one import session.
pub struct JobPoller {
    backend: Arc<dyn ImportBackend>,
    session_id: Uuid,
    job_id: String,
    token: CancellationToken,
    refresh: Arc<Notify>,
    latest: Arc<Mutex<Option<ProgressReport>>>,
    reports: mpsc::UnboundedSender<ProgressReport>,
}

impl JobPoller {
    /// Spawn the poll loop for `job_id`. The first poll is issued
    /// immediately; the attempt counter and sample window start from zero.
    pub fn spawn(backend: Arc<dyn ImportBackend>, session_id: Uuid, job_id: String) -> PollHandle {
        let token = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let latest = Arc::new(Mutex::new(None));
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        let poller = JobPoller {
            backend,
            session_id,
            job_id,
            token: token.clone(),
            refresh: Arc::clone(&refresh),
            latest: Arc::clone(&latest),
            reports: reports_tx,
        };
        let join = tokio::spawn(poller.run());

        PollHandle {
            token,
            refresh,
            latest,
            reports: reports_rx,
            join: Some(join),
        }
    }

    async fn run(self) -> Result<ImportJob, ImportError> {
        let started = tokio::time::Instant::now();
        let mut window = ProgressWindow::new();
        let mut attempt: u32 = 0;

        loop {
            if self.token.is_cancelled() {
                debug!("Session {}: poll loop cancelled", self.session_id);
                return Err(ImportError::Cancelled);
            }

            // One request in flight at a time; everything below runs before
            // the next tick is scheduled.
            let polled = self.backend.get_job(&self.job_id).await;

            if self.token.is_cancelled() {
                debug!(
                    "Session {}: discarding stale poll response for job {}",
                    self.session_id, self.job_id
                );
                return Err(ImportError::Cancelled);
            }

            let job = match polled {
                Ok(job) => job,
                Err(err) => {
                    warn!(
                        "Session {}: poll {} for job {} failed: {}",
                        self.session_id, attempt, self.job_id, err
                    );
                    return Err(err);
                }
            };

            if let Some(processed) = job.progress().and_then(|p| p.processed_rows) {
                window.record(started.elapsed().as_millis() as u64, processed);
            }

            let report = build_report(&job, &window, attempt);
            *self.latest.lock() = Some(report.clone());
            // Receiver may be gone if the caller only cares about the outcome.
            let _ = self.reports.send(report);

            match job.status {
                JobStatus::Completed => {
                    info!(
                        "Session {}: import job {} completed after {} polls",
                        self.session_id,
                        self.job_id,
                        attempt + 1
                    );
                    return Ok(job);
                }
                JobStatus::Failed => {
                    let message = job
                        .error
                        .clone()
                        .unwrap_or_else(|| ImportError::UNKNOWN_JOB_FAILURE.to_string());
                    warn!(
                        "Session {}: import job {} failed: {}",
                        self.session_id, self.job_id, message
                    );
                    return Err(ImportError::JobFailed { message });
                }
                JobStatus::Pending | JobStatus::Processing => {}
            }

            let delay = delay_for_attempt(attempt);
            attempt += 1;

            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!("Session {}: pending poll timer cancelled", self.session_id);
                    return Err(ImportError::Cancelled);
                }
                _ = self.refresh.notified() => {
                    debug!("Session {}: manual status refresh", self.session_id);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Derive the displayable snapshot for a job observation. Exposed so a
/// one-shot status read renders identically to the poll loop.
pub fn build_report(job: &ImportJob, window: &ProgressWindow, attempt: u32) -> ProgressReport {
    let progress = job.progress();
    let processed_rows = progress.and_then(|p| p.processed_rows);
    let total_rows = progress.and_then(|p| p.total_rows);

    ProgressReport {
        status: job.status,
        percent: progress::percent_complete(job.status, processed_rows, total_rows),
        phase: progress::phase_label(job.status, progress.and_then(|p| p.phase.as_deref())),
        eta: total_rows.and_then(|total| window.eta(total)),
        processed_rows,
        total_rows,
        attempt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobMetadata, JobProgress, SubmitReceipt, VoterDraft};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that serves a fixed script of poll responses and counts calls.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<ImportJob, ImportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<ImportJob, ImportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImportBackend for ScriptedBackend {
        async fn submit_voters_json(
            &self,
            _voters: &[VoterDraft],
        ) -> Result<SubmitReceipt, ImportError> {
            unimplemented!("not used by poller tests")
        }

        async fn upload_voters_file(
            &self,
            _filename: &str,
            _bytes: Vec<u8>,
        ) -> Result<SubmitReceipt, ImportError> {
            unimplemented!("not used by poller tests")
        }

        async fn get_job(&self, _job_id: &str) -> Result<ImportJob, ImportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .pop_front()
                .expect("poll issued after the scripted terminal response")
        }

        async fn open_merge_alert_count(&self) -> Result<u64, ImportError> {
            Ok(0)
        }
    }

    fn job(status: JobStatus) -> ImportJob {
        ImportJob {
            id: "job-1".to_string(),
            status,
            error: None,
            metadata: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn processing(processed: u64, total: u64) -> ImportJob {
        let mut j = job(JobStatus::Processing);
        j.metadata = Some(JobMetadata {
            progress: Some(JobProgress {
                phase: Some("upserting_voters".to_string()),
                processed_rows: Some(processed),
                total_rows: Some(total),
            }),
        });
        j
    }

    fn spawn(backend: &Arc<ScriptedBackend>) -> PollHandle {
        JobPoller::spawn(
            Arc::clone(backend) as Arc<dyn ImportBackend>,
            Uuid::new_v4(),
            "job-1".to_string(),
        )
    }

    #[test]
    fn test_backoff_tiers_by_attempt_index() {
        for attempt in 0..=9 {
            assert_eq!(delay_for_attempt(attempt), Duration::from_millis(1_000));
        }
        assert_eq!(delay_for_attempt(10), Duration::from_millis(2_500));
        assert_eq!(delay_for_attempt(15), Duration::from_millis(2_500));
        assert_eq!(delay_for_attempt(19), Duration::from_millis(2_500));
        assert_eq!(delay_for_attempt(20), Duration::from_millis(8_000));
        assert_eq!(delay_for_attempt(25), Duration::from_millis(8_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_completed_then_stop() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(0, 10_000)),
            Ok(processing(100, 10_000)),
            Ok(job(JobStatus::Completed)),
        ]);

        let handle = spawn(&backend);
        let finished = handle.outcome().await.unwrap();

        assert_eq!(finished.status, JobStatus::Completed);
        // Terminal state reached on the third poll; nothing further was
        // scheduled (a fourth poll would panic the scripted backend).
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_carry_percent_eta_and_phase() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(0, 10_000)),
            Ok(processing(100, 10_000)),
            Ok(job(JobStatus::Completed)),
        ]);

        let mut handle = spawn(&backend);

        let first = handle.next_report().await.unwrap();
        assert_eq!(first.attempt, 0);
        assert_eq!(first.percent, Some(0));
        assert_eq!(first.phase, "Upserting voters");
        assert_eq!(first.eta, None); // single sample

        let second = handle.next_report().await.unwrap();
        assert_eq!(second.attempt, 1);
        assert_eq!(second.percent, Some(1));
        // 100 rows over the 1s fast-poll gap => 100 rows/s; 9900 left => 99s.
        assert_eq!(second.eta, Some(Duration::from_secs(99)));

        let last = handle.next_report().await.unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(last.percent, Some(100));
        assert!(handle.next_report().await.is_none());

        handle.outcome().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_percent_clamped_while_processing() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(1_000, 1_000)),
            Ok(job(JobStatus::Completed)),
        ]);

        let mut handle = spawn(&backend);
        let report = handle.next_report().await.unwrap();
        assert_eq!(report.status, JobStatus::Processing);
        assert_eq!(report.percent, Some(99));

        handle.outcome().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_surfaces_backend_error_verbatim() {
        let mut failed = job(JobStatus::Failed);
        failed.error = Some("row 12: zip is not numeric".to_string());
        let backend = ScriptedBackend::new(vec![Ok(failed)]);

        let err = spawn(&backend).outcome().await.unwrap_err();
        match err {
            ImportError::JobFailed { message } => {
                assert_eq!(message, "row 12: zip is not numeric");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_without_message_gets_fallback() {
        let backend = ScriptedBackend::new(vec![Ok(job(JobStatus::Failed))]);

        let err = spawn(&backend).outcome().await.unwrap_err();
        match err {
            ImportError::JobFailed { message } => {
                assert_eq!(message, ImportError::UNKNOWN_JOB_FAILURE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_terminates_polling() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(10, 100)),
            Err(ImportError::ConnectionLost {
                detail: "connection reset".to_string(),
            }),
        ]);

        let err = spawn(&backend).outcome().await.unwrap_err();
        assert!(matches!(err, ImportError::ConnectionLost { .. }));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_poll_issues_no_request() {
        let backend = ScriptedBackend::new(vec![]);

        let handle = spawn(&backend);
        handle.cancel();

        let err = handle.outcome().await.unwrap_err();
        assert!(matches!(err, ImportError::Cancelled));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep_stops_polling() {
        let backend = ScriptedBackend::new(vec![Ok(processing(10, 100))]);

        let mut handle = spawn(&backend);
        let report = handle.next_report().await.unwrap();
        assert_eq!(report.attempt, 0);

        // The poll task is parked on its backoff sleep now; cancelling must
        // clear that pending tick rather than let it fire.
        handle.cancel();
        let err = handle.outcome().await.unwrap_err();
        assert!(matches!(err, ImportError::Cancelled));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_poll() {
        let backend = ScriptedBackend::new(vec![Ok(processing(10, 100))]);

        let mut handle = spawn(&backend);
        let _ = handle.next_report().await.unwrap();
        drop(handle);

        // Let the poll task observe the cancellation; no second request may
        // be issued (the scripted backend would panic).
        tokio::task::yield_now().await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_polls_immediately_without_waiting_backoff() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(10, 100)),
            Ok(processing(20, 100)),
        ]);

        let start = tokio::time::Instant::now();
        let mut handle = spawn(&backend);
        let first = handle.next_report().await.unwrap();
        assert_eq!(first.attempt, 0);

        handle.refresh();
        let second = handle.next_report().await.unwrap();

        // The forced poll happened with zero elapsed time (the paused clock
        // never advanced through the 1s backoff sleep) and advanced the
        // attempt counter by one.
        assert_eq!(second.attempt, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);

        handle.cancel();
        let err = handle.outcome().await.unwrap_err();
        assert!(matches!(err, ImportError::Cancelled));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_snapshot_tracks_newest_report() {
        let backend = ScriptedBackend::new(vec![
            Ok(processing(5, 100)),
            Ok(job(JobStatus::Completed)),
        ]);

        let mut handle = spawn(&backend);
        let report = handle.next_report().await.unwrap();
        assert_eq!(handle.latest(), Some(report));

        handle.next_report().await.unwrap();
        assert_eq!(handle.latest().unwrap().status, JobStatus::Completed);

        handle.outcome().await.unwrap();
    }
}
