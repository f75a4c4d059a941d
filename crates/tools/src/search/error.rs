//! Error types for the search client.

use retail_agents_core::DecodeError;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Engine unreachable, or credentials missing or rejected.
    #[error("connection error: {0}")]
    Connection(String),

    /// Target index does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Point lookup found no document.
    #[error("document {id} not found in {index}")]
    NotFound {
        /// Index searched.
        index: String,
        /// Requested id.
        id: String,
    },

    /// Engine rejected the request.
    #[error("search error ({status}): {message}")]
    Search {
        /// HTTP status.
        status: u16,
        /// Engine-reported reason.
        message: String,
    },

    /// Response did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<DecodeError> for SearchError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl SearchError {
    /// Classify a transport failure.
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }

    /// Classify an error status and its body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<EngineErrorResponse>(body).ok();
        let (error_type, reason, index, cause) = match parsed.map(|r| r.error) {
            Some(EngineErrorBody::Detailed(detail)) => {
                let cause = detail.underlying_cause();
                (detail.error_type, detail.reason, detail.index, cause)
            }
            Some(EngineErrorBody::Plain(reason)) => (None, Some(reason), None, None),
            None => (None, None, None, None),
        };

        if error_type.as_deref() == Some("index_not_found_exception") {
            return Self::IndexNotFound(index.or(reason).unwrap_or_else(|| body.to_string()));
        }
        if status == 401 || status == 403 {
            return Self::Connection(format!(
                "authentication failed ({status}): {}",
                reason.unwrap_or_else(|| "credentials rejected".to_string())
            ));
        }

        let message = match (error_type, reason) {
            (Some(t), Some(r)) => format!("{t}: {r}"),
            (Some(t), None) => t,
            (None, Some(r)) => r,
            (None, None) if body.trim().is_empty() => "empty error response".to_string(),
            (None, None) => body.to_string(),
        };
        let message = match cause {
            Some(cause) => format!("{message} (caused by {cause})"),
            None => message,
        };
        Self::Search { status, message }
    }
}

/// Error response body from the engine.
#[derive(Debug, Deserialize)]
struct EngineErrorResponse {
    error: EngineErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EngineErrorBody {
    Detailed(EngineErrorDetail),
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct EngineErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    reason: Option<String>,
    index: Option<String>,
    #[serde(default)]
    root_cause: Vec<EngineErrorDetail>,
    caused_by: Option<Box<EngineErrorDetail>>,
}

impl EngineErrorDetail {
    /// First root cause, else the nested cause, when it adds to the top-level reason.
    fn underlying_cause(&self) -> Option<String> {
        let cause = self
            .root_cause
            .first()
            .or(self.caused_by.as_deref())?;
        if cause.error_type == self.error_type && cause.reason == self.reason {
            return None;
        }
        match (&cause.error_type, &cause.reason) {
            (Some(t), Some(r)) => Some(format!("{t}: {r}")),
            (Some(t), None) => Some(t.clone()),
            (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        }
    }
}
