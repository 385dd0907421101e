//! Import session orchestration
//!
//! Ties the pipeline together for the two import strategies:
//!
//! - `upload_file` (canonical): validate ceilings, ship the raw file to the
//!   backend worker, poll the resulting job.
//! - `import_parsed` (legacy): parse and map rows client-side, submit the
//!   drafts as a JSON batch, poll the resulting job.
//!
//! Each call is one session: fresh session id, fresh poller state.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::api_client::ImportBackend;
use super::csv::{normalize_header, parse_csv_line};
use super::field_mapper::smart_map;
use super::poller::{JobPoller, PollHandle};
use super::validator;
use crate::types::{HeaderMapping, ImportError, JobStatus, VoterDraft, VoterField};

/// A user decision about one header: map it to a field, or ignore it.
/// Overrides are applied on top of the smart mapping before any row is
/// converted.
pub type MappingOverride = (String, Option<VoterField>);

/// Everything derived from a file on the client-parse path, before any
/// network call. Kept separate from submission so the mapping can be
/// previewed and overridden.
#[derive(Debug, Clone)]
pub struct ParsePlan {
    /// Cleaned header labels, in column order.
    pub headers: Vec<String>,
    /// Raw (pre-cleanup) header cells, for preview display.
    pub raw_headers: Vec<String>,
    pub mapping: HeaderMapping,
    /// Headers auto-matched by the smart mapper, before overrides.
    pub smart_matched: usize,
    pub drafts: Vec<VoterDraft>,
}

/// Outcome of starting an import: the job is submitted and a poller is
/// already attached.
#[derive(Debug)]
pub struct ImportStarted {
    pub session_id: Uuid,
    pub job_id: String,
    pub initial_status: JobStatus,
    /// Present when the backend flagged the upload as previously imported.
    /// Informational: re-import updates existing voters without duplicating
    /// interaction history.
    pub duplicate_of_job_id: Option<String>,
    pub handle: PollHandle,
}

/// One import attempt against a backend adapter.
pub struct ImportSession {
    backend: Arc<dyn ImportBackend>,
    session_id: Uuid,
}

impl ImportSession {
    pub fn new(backend: Arc<dyn ImportBackend>) -> Self {
        Self {
            backend,
            session_id: Uuid::new_v4(),
        }
    }

    /// Canonical path: upload the raw file for server-side parsing.
    pub async fn upload_file(&self, path: &Path) -> Result<ImportStarted, ImportError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = tokio::fs::metadata(path).await?.len();
        validator::validate_upload(&filename, size)?;

        let bytes = tokio::fs::read(path).await?;
        info!(
            "Session {}: uploading {} ({} bytes)",
            self.session_id, filename, size
        );

        let receipt = self.backend.upload_voters_file(&filename, bytes).await?;
        if let Some(original) = &receipt.duplicate_of_job_id {
            warn!(
                "Session {}: file was previously imported as job {} — re-import updates existing voters",
                self.session_id, original
            );
        }

        Ok(self.start_polling(receipt.id, receipt.status, receipt.duplicate_of_job_id))
    }

    /// Legacy path: parse rows client-side and submit the drafts as JSON.
    pub async fn import_parsed(
        &self,
        path: &Path,
        overrides: &[MappingOverride],
    ) -> Result<ImportStarted, ImportError> {
        let size = tokio::fs::metadata(path).await?.len();
        validator::validate_parse_size(size)?;

        let text = tokio::fs::read_to_string(path).await?;
        let plan = build_parse_plan(&text, overrides)?;
        info!(
            "Session {}: submitting {} voter drafts ({} of {} headers mapped)",
            self.session_id,
            plan.drafts.len(),
            plan.mapping.len(),
            plan.headers.len()
        );

        let receipt = self.backend.submit_voters_json(&plan.drafts).await?;
        Ok(self.start_polling(receipt.id, receipt.status, receipt.duplicate_of_job_id))
    }

    fn start_polling(
        &self,
        job_id: String,
        initial_status: JobStatus,
        duplicate_of_job_id: Option<String>,
    ) -> ImportStarted {
        info!(
            "Session {}: job {} accepted with status {}",
            self.session_id,
            job_id,
            initial_status.as_str()
        );
        let handle = JobPoller::spawn(Arc::clone(&self.backend), self.session_id, job_id.clone());
        ImportStarted {
            session_id: self.session_id,
            job_id,
            initial_status,
            duplicate_of_job_id,
            handle,
        }
    }
}

/// Build the client-parse plan for a file's text: split rows, clean headers,
/// smart-map, apply overrides, convert data rows to drafts.
///
/// Fails when the row ceiling is exceeded, when there is no data row, or
/// when no cell survives the mapping.
pub fn build_parse_plan(
    text: &str,
    overrides: &[MappingOverride],
) -> Result<ParsePlan, ImportError> {
    let rows = validator::non_blank_lines(text);
    validator::validate_row_count(&rows)?;
    if rows.len() < 2 {
        return Err(ImportError::EmptyImport(
            "CSV file appears to be empty or missing data rows.".to_string(),
        ));
    }

    let raw_headers = parse_csv_line(rows[0]);
    let headers: Vec<String> = raw_headers.iter().map(|h| normalize_header(h)).collect();

    let smart = smart_map(&headers);
    let mut mapping = smart.mapping;
    for (header, decision) in overrides {
        match decision {
            Some(field) => {
                mapping.insert(header.clone(), *field);
            }
            None => {
                mapping.remove(header);
            }
        }
    }

    let mut drafts = Vec::new();
    for line in &rows[1..] {
        let values = parse_csv_line(line);
        if values.is_empty() {
            continue;
        }

        let mut draft = VoterDraft::default();
        for (idx, header) in headers.iter().enumerate() {
            if let (Some(field), Some(value)) = (mapping.get(header), values.get(idx)) {
                draft.set(*field, value);
            }
        }
        if !draft.is_empty() {
            drafts.push(draft);
        }
    }

    if drafts.is_empty() {
        return Err(ImportError::EmptyImport(
            "No valid voter data found after mapping.".to_string(),
        ));
    }

    Ok(ParsePlan {
        headers,
        raw_headers,
        mapping,
        smart_matched: smart.matched,
        drafts,
    })
}
