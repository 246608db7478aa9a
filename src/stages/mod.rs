pub mod bdd;
pub mod codegen;
pub mod normalizer;
pub mod pipeline;

pub use bdd::*;
pub use codegen::*;
pub use normalizer::*;
pub use pipeline::*;

use std::error::Error as _;

use chrono::Utc;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::llm::LlmError;
use crate::models::{ErrorBody, Language, StageResponse, UNKNOWN_REQUEST_ID};
use crate::storage::StorageError;
use crate::text::ValidationError;

/// Why a stage invocation failed
///
/// Input problems map to 400 responses; upstream LLM and storage faults map to 500.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("malformed request payload: {0}")]
    InvalidRequest(#[source] serde_json::Error),
    #[error("{field} is required")]
    MissingField {
        /// Error label reported to the caller, e.g. "Missing context"
        label: &'static str,
        field: &'static str,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("this stage only generates {expected} code, got {actual:?}")]
    WrongLanguage { expected: Language, actual: String },
    #[error("language must be one of: {supported}; got {actual:?}")]
    UnsupportedLanguage { actual: String, supported: String },
    #[error("LLM invocation failed: {0}")]
    Llm(#[from] LlmError),
    #[error("artifact storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl StageError {
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StageError::InvalidRequest(_)
                | StageError::MissingField { .. }
                | StageError::Validation(_)
                | StageError::WrongLanguage { .. }
                | StageError::UnsupportedLanguage { .. }
        )
    }

    /// Short label placed in the `error` field of the response
    pub fn label(&self) -> &'static str {
        match self {
            StageError::InvalidRequest(_) => "Invalid request",
            StageError::MissingField { label, .. } => *label,
            StageError::Validation(_) => "Validation failed",
            StageError::WrongLanguage { .. } => "Wrong language",
            StageError::UnsupportedLanguage { .. } => "Unsupported language",
            StageError::Llm(_) | StageError::Storage(_) => "Internal server error",
        }
    }

    /// Error message followed by every `caused by:` in its source chain
    pub fn trace(&self) -> String {
        let mut lines = vec![self.to_string()];
        let mut source = self.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        lines.join("\n")
    }
}

/// Turn a stage result into the response envelope, logging the outcome
pub(crate) fn finish<T>(
    stage: &str,
    request_id: &str,
    result: Result<T, StageError>,
) -> StageResponse<T> {
    match result {
        Ok(body) => {
            info!("{} completed for request {}", stage, request_id);
            StageResponse::ok(body)
        }
        Err(e) if e.is_client_error() => {
            warn!("{} rejected request {}: {}", stage, request_id, e);
            StageResponse::error(
                e.status_code(),
                ErrorBody {
                    error: e.label().to_string(),
                    message: e.to_string(),
                    request_id: request_id.to_string(),
                    timestamp: None,
                    trace: None,
                },
            )
        }
        Err(e) => {
            let trace = e.trace();
            error!("{} failed for request {}: {}", stage, request_id, e);
            error!("Trace: {}", trace);
            StageResponse::error(
                e.status_code(),
                ErrorBody {
                    error: e.label().to_string(),
                    message: e.to_string(),
                    request_id: request_id.to_string(),
                    timestamp: Some(now_rfc3339()),
                    trace: Some(trace),
                },
            )
        }
    }
}

/// Decode a raw JSON payload into a stage request
///
/// A payload that does not decode yields the 400 response to return instead, carrying
/// the payload's `requestId` when one can still be read from it.
pub(crate) fn decode_request<T: DeserializeOwned, R>(
    stage: &str,
    raw: &str,
) -> Result<T, StageResponse<R>> {
    serde_json::from_str(raw).map_err(|e| {
        let request_id = raw_request_id(raw);
        finish(stage, &request_id, Err(StageError::InvalidRequest(e)))
    })
}

/// `requestId` of a payload that failed to decode, if it is a JSON object with a string id
fn raw_request_id(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| value.get("requestId")?.as_str().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_REQUEST_ID.to_string())
}

/// Current UTC time as RFC 3339
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
