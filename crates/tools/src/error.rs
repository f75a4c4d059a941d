//! Tool-level errors and their mapping onto result envelope errors.

use retail_agents_core::{DecodeError, ErrorInfo, ErrorKind, ValidationError};
use thiserror::Error;

use crate::search::SearchError;

/// Errors a tool operation can fail with.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A parameter was missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine failed or could not be reached.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// The engine's response did not have the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The lookup matched nothing.
    #[error("{message}")]
    NotFound {
        /// What was not found.
        message: String,
        /// Parameter naming the missing item.
        parameter: Option<String>,
    },
}

impl ToolError {
    /// Category reported in the envelope.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::UnknownTool(_) => ErrorKind::ValidationError,
            Self::Search(SearchError::Connection(_)) => ErrorKind::ConnectionError,
            Self::Search(SearchError::NotFound { .. }) | Self::NotFound { .. } => {
                ErrorKind::NotFoundError
            }
            Self::Search(_) | Self::Decode(_) => ErrorKind::SearchError,
        }
    }

    /// Envelope error detail.
    #[must_use]
    pub fn to_info(&self) -> ErrorInfo {
        match self {
            Self::Validation(err) => ErrorInfo::from(err.clone()),
            Self::UnknownTool(_) => {
                ErrorInfo::new(self.kind(), self.to_string()).with_parameter("tool")
            }
            Self::Search(SearchError::NotFound { id, .. }) => {
                ErrorInfo::new(self.kind(), self.to_string()).with_parameter(id.clone())
            }
            Self::NotFound {
                message,
                parameter: Some(parameter),
            } => ErrorInfo::new(self.kind(), message.clone()).with_parameter(parameter.clone()),
            _ => ErrorInfo::new(self.kind(), self.to_string()),
        }
    }
}
