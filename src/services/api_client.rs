//! Canvass REST backend client for voter imports
//!
//! `ImportBackend` is the explicit capability surface the import pipeline
//! needs from the backend: submission (JSON batch or multipart file),
//! idempotent job reads, and the open merge-alert count shown after a
//! completed import. `CanvassApi` is the HTTP adapter; tests substitute
//! their own implementations of the trait.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::types::{ImportError, ImportJob, SubmitReceipt, VoterDraft};

/// Operations the import pipeline requires from a backend adapter.
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// Submit pre-parsed voter drafts as one batch (legacy client-parse path).
    async fn submit_voters_json(&self, voters: &[VoterDraft]) -> Result<SubmitReceipt, ImportError>;

    /// Upload a raw voter file for server-side parsing (canonical path).
    async fn upload_voters_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmitReceipt, ImportError>;

    /// Idempotent read of one job's current state.
    async fn get_job(&self, job_id: &str) -> Result<ImportJob, ImportError>;

    /// Number of unresolved likely-duplicate alerts awaiting human review.
    async fn open_merge_alert_count(&self) -> Result<u64, ImportError>;
}

/// HTTP adapter for the Canvass REST API.
///
/// The bearer credential is injected at construction rather than read from
/// ambient storage, so the adapter can be exercised in isolation.
pub struct CanvassApi {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MergeAlertCount {
    open_count: u64,
}

impl CanvassApi {
    /// Create a client against an API origin, e.g. `http://localhost:3001`.
    pub fn new(origin: &str, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("canvass-import/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base: format!("{}/api/v1", origin.trim_end_matches('/')),
            token,
            client,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map a non-success response into the API error shape, keeping the
    /// backend-provided body as context.
    async fn read_success(
        method: &'static str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::Api {
                status: status.as_u16(),
                method,
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ImportBackend for CanvassApi {
    async fn submit_voters_json(&self, voters: &[VoterDraft]) -> Result<SubmitReceipt, ImportError> {
        let url = format!("{}/jobs/import-voters", self.api_base);
        debug!("Submitting {} voter drafts to {}", voters.len(), url);

        let response = self
            .authorize(self.client.post(&url))
            .json(voters)
            .send()
            .await
            .map_err(ImportError::from_transport)?;

        let response = Self::read_success("POST", &url, response).await?;
        response.json().await.map_err(ImportError::from_transport)
    }

    async fn upload_voters_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmitReceipt, ImportError> {
        let url = format!("{}/imports/voters", self.api_base);
        debug!("Uploading {} ({} bytes) to {}", filename, bytes.len(), url);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(ImportError::from_transport)?;

        let response = Self::read_success("POST", &url, response).await?;
        response.json().await.map_err(ImportError::from_transport)
    }

    async fn get_job(&self, job_id: &str) -> Result<ImportJob, ImportError> {
        let url = format!("{}/jobs/{}", self.api_base, urlencoding::encode(job_id));

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(ImportError::from_transport)?;

        let response = Self::read_success("GET", &url, response).await?;
        response.json().await.map_err(ImportError::from_transport)
    }

    async fn open_merge_alert_count(&self) -> Result<u64, ImportError> {
        let url = format!("{}/merge-alerts/count", self.api_base);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(ImportError::from_transport)?;

        let response = Self::read_success("GET", &url, response).await?;
        let count: MergeAlertCount = response.json().await.map_err(ImportError::from_transport)?;
        Ok(count.open_count)
    }
}
