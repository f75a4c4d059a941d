//! The uniform result wrapper returned by every tool.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Failure category reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Credentials missing or rejected, or the engine is unreachable.
    ConnectionError,
    /// A parameter was missing or malformed; nothing was sent.
    ValidationError,
    /// A point lookup found nothing.
    NotFoundError,
    /// The engine rejected the query or failed while answering it.
    SearchError,
}

impl ErrorKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionError => "ConnectionError",
            Self::ValidationError => "ValidationError",
            Self::NotFoundError => "NotFoundError",
            Self::SearchError => "SearchError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable explanation.
    pub message: String,
    /// Offending parameter or id, when one can be named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ErrorInfo {
    /// Error with no parameter attached.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            parameter: None,
        }
    }

    /// Attach the offending parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }
}

impl From<ValidationError> for ErrorInfo {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorKind::ValidationError, err.message).with_parameter(err.parameter)
    }
}

/// `{ok, data, error?, errors?}` wrapper.
///
/// When `ok` is false `data` is empty. Partial success is `ok: true` with the
/// per-item failures in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Whether the operation produced data.
    pub ok: bool,
    /// Domain-specific payload.
    pub data: Map<String, Value>,
    /// Why the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Per-item failures of a partially successful operation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorInfo>,
}

impl ResultEnvelope {
    /// Successful result. Non-object payloads are placed under `result`.
    #[must_use]
    pub fn success(data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self {
            ok: true,
            data,
            error: None,
            errors: Vec::new(),
        }
    }

    /// Success carrying per-item failures.
    #[must_use]
    pub fn partial(data: Value, errors: Vec<ErrorInfo>) -> Self {
        Self {
            errors,
            ..Self::success(data)
        }
    }

    /// Failed result with empty data.
    #[must_use]
    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            ok: false,
            data: Map::new(),
            error: Some(error),
            errors: Vec::new(),
        }
    }

    /// Kind of the top-level error, if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Serialize to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
