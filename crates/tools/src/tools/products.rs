//! Product catalog tools.

use futures::stream::{self, StreamExt};
use retail_agents_core::query::{
    Clause, MatchKind, MoreLikeThis, MultiMatch, QueryRequest, RangeBounds, SortClause, SortOrder,
};
use retail_agents_core::{ErrorInfo, ResultEnvelope, ValidationError};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::error::ToolError;
use crate::search::{SearchBackend, SearchError};

use super::{RetailTools, Tool, ToolOutput, clamp_size, finish, require_text};

const DOMAIN: &str = "products";

/// Most products one comparison may request.
const MAX_COMPARED_PRODUCTS: usize = 20;

/// Lookups in flight at once during a comparison.
const COMPARISON_CONCURRENCY: usize = 5;

/// Get all product tools (5 total).
#[must_use]
pub fn product_tools() -> Vec<Tool> {
    vec![
        search_products_tool(),
        search_products_by_category_tool(),
        get_product_by_id_tool(),
        compare_products_tool(),
        search_similar_products_tool(),
    ]
}

// =============================================================================
// Tool Definitions
// =============================================================================

fn search_products_tool() -> Tool {
    Tool {
        name: "search_products".to_string(),
        description: "Full-text product search over name, description, category, brand and \
            tags (typo tolerant), best matches first, then most popular. Optional exact or \
            range filters per field."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What the customer is looking for" },
                "size": { "type": "integer", "description": "Max products (default 10)", "minimum": 1, "maximum": 500 },
                "filters": {
                    "type": "object",
                    "description": "Field filters: a scalar for an exact match, or {\"gte\": x, \"lte\": y} for a range. E.g. {\"brand\": \"Acme\", \"price\": {\"lte\": 50}}"
                }
            },
            "required": ["query"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_products_by_category_tool() -> Tool {
    Tool {
        name: "search_products_by_category".to_string(),
        description: "Products in a category, optionally within a price range, most popular \
            first."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "category": { "type": "string" },
                "min_price": { "type": "number", "minimum": 0 },
                "max_price": { "type": "number", "minimum": 0 },
                "size": { "type": "integer", "description": "Max products (default 20)", "minimum": 1, "maximum": 500 }
            },
            "required": ["category"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_product_by_id_tool() -> Tool {
    Tool {
        name: "get_product_by_id".to_string(),
        description: "Fetch one product by its ID.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_id": { "type": "string" }
            },
            "required": ["product_id"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn compare_products_tool() -> Tool {
    Tool {
        name: "compare_products".to_string(),
        description: "Fetch several products side by side. Returns the products found, in the \
            order requested, the union of their fields, and an error for each ID that was not \
            found."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_ids": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "maxItems": MAX_COMPARED_PRODUCTS
                }
            },
            "required": ["product_ids"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_similar_products_tool() -> Tool {
    Tool {
        name: "search_similar_products".to_string(),
        description: "Products similar to a given product, based on name, description, \
            category and tags."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_id": { "type": "string" },
                "size": { "type": "integer", "description": "Max products (default 5)", "minimum": 1, "maximum": 500 }
            },
            "required": ["product_id"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Input of `search_products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSearchParams {
    pub query: String,
    #[serde(default)]
    pub size: Option<i64>,
    /// Field name to a scalar (exact match) or `{gte, lte}` (range).
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
}

/// Input of `search_products_by_category`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductCategoryParams {
    pub category: String,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_product_by_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductByIdParams {
    pub product_id: String,
}

/// Input of `compare_products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareProductsParams {
    pub product_ids: Vec<String>,
}

/// Input of `search_similar_products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilarProductsParams {
    pub product_id: String,
    #[serde(default)]
    pub size: Option<i64>,
}

// =============================================================================
// Operations
// =============================================================================

impl<B: SearchBackend> RetailTools<B> {
    /// Free-text product search.
    #[instrument(skip(self, params), fields(tool = "search_products"))]
    pub async fn search_products(&self, params: ProductSearchParams) -> ResultEnvelope {
        finish("search_products", self.product_search(params).await)
    }

    /// Products in a category and price range.
    #[instrument(skip(self, params), fields(tool = "search_products_by_category"))]
    pub async fn search_products_by_category(
        &self,
        params: ProductCategoryParams,
    ) -> ResultEnvelope {
        finish(
            "search_products_by_category",
            self.products_by_category(params).await,
        )
    }

    /// One product by id.
    #[instrument(skip(self, params), fields(tool = "get_product_by_id", product_id = %params.product_id))]
    pub async fn get_product_by_id(&self, params: ProductByIdParams) -> ResultEnvelope {
        finish("get_product_by_id", self.product_by_id(params).await)
    }

    /// Several products side by side.
    #[instrument(skip(self, params), fields(tool = "compare_products", count = params.product_ids.len()))]
    pub async fn compare_products(&self, params: CompareProductsParams) -> ResultEnvelope {
        finish("compare_products", self.product_comparison(params).await)
    }

    /// Products resembling one product.
    #[instrument(skip(self, params), fields(tool = "search_similar_products", product_id = %params.product_id))]
    pub async fn search_similar_products(&self, params: SimilarProductsParams) -> ResultEnvelope {
        finish("search_similar_products", self.similar_products(params).await)
    }

    async fn product_search(&self, params: ProductSearchParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.products;
        let query = require_text(&params.query, "query")?;
        let filters = params.filters.unwrap_or_default();

        let mut request = QueryRequest::new(&self.settings.indices.products)
            .must(
                MultiMatch::new(query.as_str(), f.search_fields())
                    .kind(MatchKind::BestFields)
                    .fuzzy(),
            )
            .sort(SortClause::Score)
            .sort(SortClause::field(&f.popularity, SortOrder::Desc))
            .size(clamp_size(params.size, 10));
        for (field, value) in &filters {
            request = request.filter(filter_clause(field, value)?);
        }

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "query": query,
            "total": result.total,
            "products": result.hits.iter().map(|h| h.flatten()).collect::<Vec<_>>(),
            "filters_applied": filters,
        })
        .into())
    }

    async fn products_by_category(
        &self,
        params: ProductCategoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.products;
        let category = require_text(&params.category, "category")?.to_lowercase();
        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                return Err(ValidationError::new(
                    "min_price",
                    format!("{min} exceeds max_price {max}"),
                )
                .into());
            }
        }
        let price = if params.min_price.is_some() || params.max_price.is_some() {
            Some(Clause::range(
                &f.price,
                RangeBounds::between(params.min_price, params.max_price),
            )?)
        } else {
            None
        };

        let request = QueryRequest::new(&self.settings.indices.products)
            .filter(Clause::term(&f.category, category.as_str()))
            .filter_opt(price)
            .sort(SortClause::field(&f.popularity, SortOrder::Desc))
            .size(clamp_size(params.size, 20));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "category": category,
            "total": result.total,
            "products": result.hits.iter().map(|h| h.flatten()).collect::<Vec<_>>(),
            "filters_applied": {
                "min_price": params.min_price,
                "max_price": params.max_price,
            },
        })
        .into())
    }

    async fn product_by_id(&self, params: ProductByIdParams) -> Result<ToolOutput, ToolError> {
        let id = require_text(&params.product_id, "product_id")?;
        let hit = self
            .backend
            .get_by_id(&self.settings.indices.products, &id)
            .await?;
        Ok(hit.flatten().into())
    }

    async fn product_comparison(
        &self,
        params: CompareProductsParams,
    ) -> Result<ToolOutput, ToolError> {
        let ids: Vec<String> = params
            .product_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(ValidationError::missing("product_ids").into());
        }
        if ids.len() > MAX_COMPARED_PRODUCTS {
            return Err(ValidationError::new(
                "product_ids",
                format!(
                    "at most {MAX_COMPARED_PRODUCTS} products can be compared, got {}",
                    ids.len()
                ),
            )
            .into());
        }

        let index = &self.settings.indices.products;
        let results: Vec<_> = stream::iter(&ids)
            .map(|id| self.backend.get_by_id(index, id))
            .buffered(COMPARISON_CONCURRENCY)
            .collect()
            .await;

        let mut products = Vec::new();
        let mut failures: Vec<(String, ToolError)> = Vec::new();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(hit) => products.push(hit.flatten()),
                Err(err) => {
                    tracing::warn!(product_id = %id, error = %err, "Product lookup failed");
                    failures.push((id.clone(), ToolError::from(err)));
                }
            }
        }

        if products.is_empty() {
            // Report a real engine failure over plain misses.
            if let Some(pos) = failures
                .iter()
                .position(|(_, e)| !matches!(e, ToolError::Search(SearchError::NotFound { .. })))
            {
                return Err(failures.swap_remove(pos).1);
            }
            return Err(ToolError::NotFound {
                message: "No valid products found for comparison".to_string(),
                parameter: Some("product_ids".to_string()),
            });
        }

        let errors: Vec<ErrorInfo> = failures
            .iter()
            .map(|(id, err)| {
                let mut info = err.to_info();
                info.parameter.get_or_insert_with(|| id.clone());
                info
            })
            .collect();
        let comparison_fields = comparison_fields(&products);

        Ok(ToolOutput::partial(
            json!({
                "product_count": products.len(),
                "products": products,
                "comparison_fields": comparison_fields,
            }),
            errors,
        ))
    }

    async fn similar_products(
        &self,
        params: SimilarProductsParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.products;
        let id = require_text(&params.product_id, "product_id")?;
        let index = &self.settings.indices.products;

        let request = QueryRequest::new(index)
            .must(MoreLikeThis::document(f.similarity_fields(), index, id.as_str()))
            .size(clamp_size(params.size, 5));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "original_product_id": id,
            "count": result.hits.len(),
            "similar_products": result.hits.iter().map(|h| h.flatten()).collect::<Vec<_>>(),
        })
        .into())
    }
}

/// A scalar filter value is an exact match, an object is a range.
fn filter_clause(field: &str, value: &Value) -> Result<Clause, ValidationError> {
    let field_name = field.trim();
    if field_name.is_empty() {
        return Err(ValidationError::new("filters", "filter field name is blank"));
    }
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Ok(Clause::term(field_name, value.clone()))
        }
        Value::Object(_) => {
            let bounds: RangeBounds = serde_json::from_value(value.clone()).map_err(|e| {
                ValidationError::new("filters", format!("invalid range for `{field}`: {e}"))
            })?;
            Clause::range(field_name, bounds)
                .map_err(|e| ValidationError::new("filters", format!("`{field}`: {}", e.message)))
        }
        Value::Null | Value::Array(_) => Err(ValidationError::new(
            "filters",
            format!("`{field}` must be a scalar or a {{gte, lte}} range"),
        )),
    }
}

/// Sorted union of the keys of every product.
fn comparison_fields(products: &[Value]) -> Vec<String> {
    let mut fields: Vec<String> = products
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|p| p.keys().cloned())
        .collect();
    fields.sort_unstable();
    fields.dedup();
    fields
}
