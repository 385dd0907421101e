//! Error taxonomy for the import pipeline
//!
//! Every failure mode is converted to user-facing text at the CLI boundary;
//! nothing propagates as a panic.

use thiserror::Error;

/// Errors surfaced by the import pipeline.
#[derive(Debug, Error)]
pub enum ImportError {
    /// File exceeded a byte-size ceiling. Detected before any network call.
    #[error(
        "file exceeds the {} MB limit (current: {:.2} MB) — split the file or contact support for bulk ingestion",
        .limit_bytes / 1_048_576,
        *.actual_bytes as f64 / 1_048_576.0
    )]
    FileTooLarge { actual_bytes: u64, limit_bytes: u64 },

    /// Too many non-blank lines for the client-side parse path.
    #[error("file contains {actual} rows, which exceeds the import limit of {limit} — split the file")]
    TooManyRows { actual: usize, limit: usize },

    /// Extension not on the upload allow-list.
    #[error("unsupported file type for '{filename}' (accepted: .csv, .xlsx)")]
    UnsupportedExtension { filename: String },

    /// Nothing importable: missing data rows, or no cell survived mapping.
    #[error("{0}")]
    EmptyImport(String),

    /// Non-success HTTP response from the backend.
    #[error("API error {status} ({method} {url}): {body}")]
    Api {
        status: u16,
        method: &'static str,
        url: String,
        body: String,
    },

    /// Network or decode failure talking to the backend. During polling this
    /// terminates the loop — only backend-reported non-terminal statuses are
    /// retried, never transport failures.
    #[error("lost connection to the job server ({detail})")]
    ConnectionLost { detail: String },

    /// Backend-reported terminal job failure, verbatim.
    #[error("{message}")]
    JobFailed { message: String },

    /// The poll handle was cancelled before the job reached a terminal state.
    /// The job itself keeps running server-side.
    #[error("import polling cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Fallback message when a failed job carries no error text.
    pub const UNKNOWN_JOB_FAILURE: &'static str = "Unknown job failure";

    pub fn from_transport(err: reqwest::Error) -> Self {
        ImportError::ConnectionLost {
            detail: err.to_string(),
        }
    }
}
