//! Import job resource types for async backend processing
//!
//! These mirror the Canvass REST backend's job resource: the client only
//! ever reads job state, the backend is the sole writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an import job.
///
/// Strictly forward-moving: once `Completed` or `Failed` is observed the
/// poll loop stops and no further transition is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Wire name, e.g. `processing`.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Backend-reported progress counters nested under job metadata.
/// All fields are optional; counts may be absent entirely for backends that
/// do not report row-level progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Free-form processing-stage label, e.g. `parsing_rows`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
}

/// Optional metadata envelope on the job resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
}

/// One in-flight or completed import operation, as read from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    /// Opaque backend-assigned identifier.
    pub id: String,
    pub status: JobStatus,
    /// Human-readable failure message, present only when status is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JobMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    /// Convenience accessor for the nested progress object.
    pub fn progress(&self) -> Option<&JobProgress> {
        self.metadata.as_ref().and_then(|m| m.progress.as_ref())
    }
}

/// Response to a successful job submission (JSON batch or file upload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: String,
    pub status: JobStatus,
    /// Set when the backend recognizes the uploaded file as previously
    /// imported. An idempotency signal, not a failure: re-import updates
    /// existing voters without duplicating interaction history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_job_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&JobStatus::Failed).unwrap(), "\"failed\"");
    }

    #[test]
    fn test_job_status_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_import_job_deserializes_minimal_shape() {
        let json = r#"{"id":"job-42","status":"pending"}"#;
        let job: ImportJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "job-42");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
        assert!(job.progress().is_none());
    }

    #[test]
    fn test_import_job_deserializes_nested_progress() {
        let json = r#"{
            "id": "job-42",
            "status": "processing",
            "metadata": {"progress": {"phase": "geocoding_addresses", "processed_rows": 250, "total_rows": 1000}}
        }"#;
        let job: ImportJob = serde_json::from_str(json).unwrap();
        let progress = job.progress().unwrap();
        assert_eq!(progress.phase.as_deref(), Some("geocoding_addresses"));
        assert_eq!(progress.processed_rows, Some(250));
        assert_eq!(progress.total_rows, Some(1000));
    }

    #[test]
    fn test_submit_receipt_deserializes_duplicate_flag() {
        let json = r#"{"id":"job-7","status":"pending","duplicate_of_job_id":"job-3"}"#;
        let receipt: SubmitReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.duplicate_of_job_id.as_deref(), Some("job-3"));

        let plain: SubmitReceipt =
            serde_json::from_str(r#"{"id":"job-8","status":"processing"}"#).unwrap();
        assert!(plain.duplicate_of_job_id.is_none());
    }
}
