//! Client for the external analysis service.
//!
//! Uploads one multipart form per submission (`image` + `variables`) to
//! `/api/analyze-image` and adopts the first entry of the returned result list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inkcalc_core::{AnalysisResult, SubmissionState};
use inkcalc_renderer::Payload;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path appended to a bare service host.
pub const ANALYZE_PATH: &str = "/api/analyze-image";

/// Shown when the service rejects a request without saying why.
pub const GENERIC_SERVICE_MESSAGE: &str = "Failed to analyze image";

/// Shown when the service could not be reached or answered garbage.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze drawing";

/// Shown when the service returned an empty result list.
pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// Errors that can occur when talking to the analysis service.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The service URL provided is invalid.
    #[error("invalid analysis service URL: {0}")]
    InvalidUrl(String),
    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    Busy,
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("analysis request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("analysis service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Service-provided message, or the generic fallback.
        message: String,
    },
    /// The success body was not the expected JSON.
    #[error("failed to parse analysis response: {0}")]
    Json(#[from] serde_json::Error),
    /// The service answered successfully with no results.
    #[error("analysis returned no results")]
    NoResults,
}

impl AnalysisError {
    /// Text suitable for a user notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Service { message, .. } => message.clone(),
            Self::NoResults => NO_RESULTS_MESSAGE.to_string(),
            Self::Busy => "A calculation is already in progress".to_string(),
            Self::InvalidUrl(_) | Self::Http(_) | Self::Json(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// One entry of the service's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResult {
    /// Recognised expression.
    pub expr: String,
    /// Evaluated result. Numeric results are kept in their JSON text form.
    #[serde(deserialize_with = "string_or_number")]
    pub result: String,
    /// Whether this result binds a variable for later submissions.
    #[serde(default)]
    pub assigned: bool,
}

impl ServiceResult {
    /// The overlay-facing form of this result.
    #[must_use]
    pub fn to_analysis_result(&self) -> AnalysisResult {
        AnalysisResult::new(self.expr.clone(), self.result.clone())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    results: Option<Vec<ServiceResult>>,
}

/// Only `error` is read from a failed response; other fields may be anything.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the analysis service.
///
/// Cloning is cheap; clones share the connection pool and the in-flight flag,
/// so at most one submission runs across all of them.
#[derive(Clone)]
pub struct AnalysisClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Url,
    in_flight: AtomicBool,
}

impl AnalysisClient {
    /// Create a client without a request timeout.
    ///
    /// `base_url` may be either the analyze endpoint itself or just the host
    /// (in which case `/api/analyze-image` is appended).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidUrl`] if the URL is malformed.
    /// Returns [`AnalysisError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, AnalysisError> {
        Self::build(base_url, None)
    }

    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`AnalysisClient::new`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self, AnalysisError> {
        let mut url = Url::parse(base_url).map_err(|e| AnalysisError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalysisError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        if url.path().is_empty() || url.path() == "/" {
            url.set_path(ANALYZE_PATH);
        }

        let mut builder =
            Client::builder().user_agent(concat!("inkcalc/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(InnerClient {
                http: builder.build()?,
                endpoint: url,
                in_flight: AtomicBool::new(false),
            }),
        })
    }

    /// The resolved analyze endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        if self.inner.in_flight.load(Ordering::Acquire) {
            SubmissionState::Loading
        } else {
            SubmissionState::Idle
        }
    }

    /// Move to `Loading`, returning a guard that moves back to `Idle` on drop.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Busy`] if a submission is already in flight.
    pub fn begin(&self) -> Result<InFlight, AnalysisError> {
        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AnalysisError::Busy)?;
        tracing::debug!("Submission state: loading");
        Ok(InFlight {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Send a payload and await the first result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Busy`] if another submission is in flight, or
    /// any error from [`InFlight::send`].
    pub async fn submit(&self, payload: Payload) -> Result<ServiceResult, AnalysisError> {
        self.begin()?.send(payload).await
    }
}

/// Proof that this holder owns the single in-flight submission slot.
#[must_use = "dropping the guard returns the client to Idle"]
pub struct InFlight {
    inner: Arc<InnerClient>,
}

impl InFlight {
    /// Perform the exchange. The slot is released when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] on network failure,
    /// [`AnalysisError::Service`] on a non-success status,
    /// [`AnalysisError::Json`] on an undecodable success body and
    /// [`AnalysisError::NoResults`] on an empty result list.
    pub async fn send(self, payload: Payload) -> Result<ServiceResult, AnalysisError> {
        let image = Part::bytes(payload.image)
            .file_name(payload.file_name)
            .mime_str(payload.mime)?;
        let form = Form::new()
            .part("image", image)
            .text("variables", payload.variables_json);

        tracing::info!("Submitting drawing to {}", self.inner.endpoint);
        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|r| r.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_SERVICE_MESSAGE.to_string());
            tracing::warn!("Analysis service returned {}: {}", status, message);
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnalysisResponse = serde_json::from_slice(&body)?;
        let results = parsed.results.unwrap_or_default();
        tracing::debug!("Analysis returned {} result(s)", results.len());
        results.into_iter().next().ok_or(AnalysisError::NoResults)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::Release);
        tracing::debug!("Submission state: idle");
    }
}
