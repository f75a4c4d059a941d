//! Errors raised while building requests or decoding responses.

use thiserror::Error;

/// A caller-supplied parameter was missing or malformed.
///
/// Always detected before any request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter `{parameter}`: {message}")]
pub struct ValidationError {
    /// Name of the offending parameter (or field, for clause-level errors).
    pub parameter: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `parameter`.
    #[must_use]
    pub fn new(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a required parameter that was absent or blank.
    #[must_use]
    pub fn missing(parameter: impl Into<String>) -> Self {
        Self::new(parameter, "is required")
    }
}

/// The engine's response did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Response had no `aggregations` object although some were requested.
    #[error("response contains no aggregations")]
    MissingAggregations,

    /// A requested aggregation was absent from the response.
    #[error("aggregation `{0}` missing from response")]
    MissingAggregation(String),

    /// An aggregation was present but malformed.
    #[error("aggregation `{name}` is malformed: {message}")]
    Malformed {
        /// Aggregation name.
        name: String,
        /// What was wrong with it.
        message: String,
    },

    /// The hits section could not be parsed.
    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("min_inventory", "must not exceed max_inventory");
        assert_eq!(
            err.to_string(),
            "invalid parameter `min_inventory`: must not exceed max_inventory"
        );
    }

    #[test]
    fn test_missing_shorthand() {
        let err = ValidationError::missing("product_id");
        assert_eq!(err.parameter, "product_id");
        assert_eq!(err.message, "is required");
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::MissingAggregation("total_inventory".to_string());
        assert_eq!(
            err.to_string(),
            "aggregation `total_inventory` missing from response"
        );
    }
}
