//! Retail assistant tools organized by domain.
//!
//! Every operation validates its parameters, builds one request, runs it
//! through the [`SearchBackend`], classifies the result and wraps it in a
//! [`ResultEnvelope`]. Failures never escape as `Err`; they become the
//! envelope's `error`.
//!
//! Domains:
//! - **inventory**: stock levels, alerts, forecasts (7 tools)
//! - **shopping**: transaction analytics (7 tools)
//! - **products**: catalog search and comparison (5 tools)
//! - **reviews**: semantic and rating-based review lookup (5 tools)
//! - **support**: FAQ search (5 tools)

mod executor;
mod inventory;
mod products;
mod reviews;
mod shopping;
mod support;

pub use inventory::{
    CategoryInventoryParams, DemandForecastParams, InventoryStatisticsParams, LowStockParams,
    ProductInventoryParams, RegionInventoryParams, SeasonalAnalysisParams, inventory_tools,
};
pub use products::{
    CompareProductsParams, ProductByIdParams, ProductCategoryParams, ProductSearchParams,
    SimilarProductsParams, product_tools,
};
pub use reviews::{
    RatingStatisticsParams, ReviewsByClassParams, ReviewsByDepartmentParams, ReviewsByRatingParams,
    SemanticReviewParams, review_tools,
};
pub use shopping::{
    CustomerHistoryParams, DateRangeParams, GenderTrendsParams, HighValueParams,
    MallPerformanceParams, PaymentAnalyticsParams, ShoppingCategoryParams, shopping_tools,
};
pub use support::{
    FaqByIdParams, FaqSearchParams, FaqStatisticsParams, FaqTopicParams, RecentFaqParams,
    support_tools,
};

use retail_agents_core::aggregation::{DecodedAggs, decode};
use retail_agents_core::query::QueryRequest;
use retail_agents_core::{ErrorInfo, HitRecord, ResultEnvelope, SearchResult, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ToolSettings;
use crate::error::ToolError;
use crate::search::SearchBackend;

/// Upper bound on any requested result size.
pub const MAX_RESULT_SIZE: usize = 500;

/// Tool definition exposed to the orchestration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
    /// Domain the tool belongs to (internal, not sent to the model).
    #[serde(skip)]
    pub domain: Option<String>,
}

/// Get all tools (29 total).
#[must_use]
pub fn all_retail_tools() -> Vec<Tool> {
    let mut tools = Vec::with_capacity(29);
    tools.extend(inventory_tools());
    tools.extend(shopping_tools());
    tools.extend(product_tools());
    tools.extend(review_tools());
    tools.extend(support_tools());
    tools
}

/// Get a tool by name.
#[must_use]
pub fn get_tool_by_name(name: &str) -> Option<Tool> {
    all_retail_tools().into_iter().find(|t| t.name == name)
}

/// Get all tools for a specific domain.
#[must_use]
pub fn get_tools_by_domain(domain: &str) -> Vec<Tool> {
    all_retail_tools()
        .into_iter()
        .filter(|t| t.domain.as_deref() == Some(domain))
        .collect()
}

// =============================================================================
// Façade
// =============================================================================

/// The retail tool façade over a search backend.
#[derive(Clone)]
pub struct RetailTools<B> {
    backend: B,
    settings: ToolSettings,
}

impl<B: SearchBackend> RetailTools<B> {
    /// Create the façade.
    pub const fn new(backend: B, settings: ToolSettings) -> Self {
        Self { backend, settings }
    }

    /// Index names, field tables and thresholds in use.
    pub const fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Underlying backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a search and decode its aggregations.
    async fn run(&self, request: &QueryRequest) -> Result<(SearchResult, DecodedAggs), ToolError> {
        let result = self.backend.search(request).await?;
        let aggs = decode(&result.aggregations, &request.aggregations)?;
        Ok((result, aggs))
    }
}

/// Payload of a successful operation plus per-item failures.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    data: Value,
    errors: Vec<ErrorInfo>,
}

impl ToolOutput {
    pub(crate) const fn partial(data: Value, errors: Vec<ErrorInfo>) -> Self {
        Self { data, errors }
    }
}

impl From<Value> for ToolOutput {
    fn from(data: Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }
}

/// Convert an operation result into its envelope, logging failures.
pub(crate) fn finish(tool: &str, result: Result<ToolOutput, ToolError>) -> ResultEnvelope {
    match result {
        Ok(output) if output.errors.is_empty() => ResultEnvelope::success(output.data),
        Ok(output) => {
            tracing::warn!(
                tool,
                failures = output.errors.len(),
                "Tool completed with partial failures"
            );
            ResultEnvelope::partial(output.data, output.errors)
        }
        Err(err) => {
            let info = err.to_info();
            tracing::error!(tool, kind = %info.kind, error = %err, "Tool failed");
            ResultEnvelope::failure(info)
        }
    }
}

// =============================================================================
// Parameter helpers
// =============================================================================

/// Deserialize tool input, mapping serde failures to `ValidationError`.
///
/// `null` input counts as an empty object so parameterless tools accept it.
pub(crate) fn parse_input<T: DeserializeOwned>(input: &Value) -> Result<T, ValidationError> {
    let input = if input.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        input.clone()
    };
    serde_json::from_value(input).map_err(|e| {
        let message = e.to_string();
        let parameter = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
            .map_or_else(|| "input".to_string(), str::to_string);
        ValidationError::new(parameter, message)
    })
}

/// Clamp a requested size to `1..=MAX_RESULT_SIZE`, `default` when absent.
pub(crate) fn clamp_size(requested: Option<i64>, default: usize) -> usize {
    requested.map_or(default, |n| {
        usize::try_from(n.max(1))
            .unwrap_or(MAX_RESULT_SIZE)
            .min(MAX_RESULT_SIZE)
    })
}

/// Trimmed, non-blank required text.
pub(crate) fn require_text(value: &str, parameter: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::missing(parameter))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Blank optional text counts as absent.
pub(crate) fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Output helpers
// =============================================================================

/// JSON number, rendered as an integer when it has no fractional part.
pub(crate) fn number_json(value: f64) -> Value {
    #[allow(clippy::cast_possible_truncation)]
    let truncated = value as i64;
    #[allow(clippy::cast_precision_loss)]
    let integral = value.is_finite() && (truncated as f64 - value).abs() < f64::EPSILON;
    if integral {
        Value::from(truncated)
    } else if value.is_finite() {
        Value::from(value)
    } else {
        Value::from(0)
    }
}

/// Source number of `field`, 0 when absent.
pub(crate) fn hit_number(hit: &HitRecord, field: &str) -> Value {
    number_json(hit.number(field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        product_id: String,
        #[serde(default)]
        size: Option<i64>,
    }

    #[test]
    fn test_all_tools_have_unique_names() {
        let tools = all_retail_tools();
        assert_eq!(tools.len(), 29);
        let mut names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_every_tool_has_object_schema_and_domain() {
        for tool in all_retail_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.domain.is_some(), "{}", tool.name);
            assert!(!tool.description.is_empty(), "{}", tool.name);
        }
    }

    #[test]
    fn test_domain_lookup() {
        assert_eq!(get_tools_by_domain("inventory").len(), 7);
        assert_eq!(get_tools_by_domain("shopping").len(), 7);
        assert_eq!(get_tools_by_domain("products").len(), 5);
        assert_eq!(get_tools_by_domain("reviews").len(), 5);
        assert_eq!(get_tools_by_domain("support").len(), 5);
        assert!(get_tools_by_domain("payroll").is_empty());
    }

    #[test]
    fn test_get_tool_by_name() {
        let tool = get_tool_by_name("compare_products").unwrap();
        assert_eq!(tool.domain.as_deref(), Some("products"));
        assert!(get_tool_by_name("drop_index").is_none());
    }

    #[test]
    fn test_tool_serialization_skips_domain() {
        let tool = get_tool_by_name("search_faqs").unwrap();
        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("domain").is_none());
        assert_eq!(value["name"], "search_faqs");
    }

    #[test]
    fn test_parse_input_missing_field_names_parameter() {
        let err = parse_input::<Sample>(&json!({ "size": 3 })).unwrap_err();
        assert_eq!(err.parameter, "product_id");
    }

    #[test]
    fn test_parse_input_wrong_type() {
        let err = parse_input::<Sample>(&json!({ "product_id": 5 })).unwrap_err();
        assert_eq!(err.parameter, "input");
        let ok = parse_input::<Sample>(&json!({ "product_id": "P1" })).unwrap();
        assert_eq!(ok.product_id, "P1");
        assert!(ok.size.is_none());
    }

    #[test]
    fn test_clamp_size() {
        assert_eq!(clamp_size(None, 50), 50);
        assert_eq!(clamp_size(Some(0), 50), 1);
        assert_eq!(clamp_size(Some(-4), 50), 1);
        assert_eq!(clamp_size(Some(20), 50), 20);
        assert_eq!(clamp_size(Some(10_000), 50), MAX_RESULT_SIZE);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("  Toys ", "category").unwrap(), "Toys");
        assert_eq!(
            require_text("   ", "category").unwrap_err().parameter,
            "category"
        );
        assert_eq!(optional_text(Some(&" ".to_string())), None);
        assert_eq!(
            optional_text(Some(&"North".to_string())).as_deref(),
            Some("North")
        );
    }

    #[test]
    fn test_number_json() {
        assert_eq!(number_json(150.0), json!(150));
        assert_eq!(number_json(12.5), json!(12.5));
        assert_eq!(number_json(f64::NAN), json!(0));
    }
}
