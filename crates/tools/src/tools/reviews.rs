//! Customer review tools: semantic lookup, rating filters, distributions.

use retail_agents_core::aggregation::{AggSpec, Bucket, TermsAgg, TermsOrder};
use retail_agents_core::classify::{percentage_share, round2};
use retail_agents_core::fields::ReviewFields;
use retail_agents_core::query::{Clause, Knn, QueryRequest, RangeBounds};
use retail_agents_core::{HitRecord, ResultEnvelope, ValidationError};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ToolError;
use crate::search::SearchBackend;

use super::{RetailTools, Tool, ToolOutput, clamp_size, finish, number_json, require_text};

const DOMAIN: &str = "reviews";

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// Get all review tools (5 total).
#[must_use]
pub fn review_tools() -> Vec<Tool> {
    vec![
        fetch_reviews_by_semantic_search_tool(),
        fetch_reviews_by_rating_tool(),
        aggregate_rating_statistics_tool(),
        fetch_reviews_by_department_tool(),
        fetch_reviews_by_class_tool(),
    ]
}

// =============================================================================
// Tool Definitions
// =============================================================================

fn fetch_reviews_by_semantic_search_tool() -> Tool {
    Tool {
        name: "fetch_reviews_by_semantic_search".to_string(),
        description: "Reviews closest in meaning to a free-text query (vector search). Use \
            for questions like 'reviews complaining about sizing'."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What the reviews should talk about" },
                "max_results": { "type": "integer", "description": "Reviews returned (default 10)", "minimum": 1, "maximum": 500 },
                "query_vector": {
                    "type": "array",
                    "items": { "type": "number" },
                    "description": "Precomputed embedding; skips server-side embedding of the query"
                }
            },
            "required": ["query"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn fetch_reviews_by_rating_tool() -> Tool {
    Tool {
        name: "fetch_reviews_by_rating".to_string(),
        description: "Reviews with a star rating between min_rating and max_rating \
            (inclusive, 1-5)."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "min_rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                "max_rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                "max_results": { "type": "integer", "description": "Reviews returned (default 10)", "minimum": 1, "maximum": 500 }
            },
            "required": ["min_rating", "max_rating"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn aggregate_rating_statistics_tool() -> Tool {
    Tool {
        name: "aggregate_rating_statistics".to_string(),
        description: "Overall review statistics: count, average rating, average reviewer \
            age, helpful votes, and rating, department and class distributions."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn fetch_reviews_by_department_tool() -> Tool {
    Tool {
        name: "fetch_reviews_by_department".to_string(),
        description: "Reviews for a department, e.g. 'Tops', 'Dresses', 'Bottoms'.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "department": { "type": "string" },
                "max_results": { "type": "integer", "description": "Reviews returned (default 10)", "minimum": 1, "maximum": 500 }
            },
            "required": ["department"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn fetch_reviews_by_class_tool() -> Tool {
    Tool {
        name: "fetch_reviews_by_class".to_string(),
        description: "Reviews for a product class, e.g. 'Knits', 'Blouses', 'Jeans'."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "class_name": { "type": "string" },
                "max_results": { "type": "integer", "description": "Reviews returned (default 10)", "minimum": 1, "maximum": 500 }
            },
            "required": ["class_name"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Input of `fetch_reviews_by_semantic_search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticReviewParams {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<i64>,
    #[serde(default)]
    pub query_vector: Option<Vec<f32>>,
}

/// Input of `fetch_reviews_by_rating`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsByRatingParams {
    pub min_rating: i64,
    pub max_rating: i64,
    #[serde(default)]
    pub max_results: Option<i64>,
}

/// Input of `aggregate_rating_statistics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingStatisticsParams {}

/// Input of `fetch_reviews_by_department`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsByDepartmentParams {
    pub department: String,
    #[serde(default)]
    pub max_results: Option<i64>,
}

/// Input of `fetch_reviews_by_class`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsByClassParams {
    pub class_name: String,
    #[serde(default)]
    pub max_results: Option<i64>,
}

// =============================================================================
// Operations
// =============================================================================

impl<B: SearchBackend> RetailTools<B> {
    /// Reviews nearest to a query in embedding space.
    #[instrument(skip(self, params), fields(tool = "fetch_reviews_by_semantic_search"))]
    pub async fn fetch_reviews_by_semantic_search(
        &self,
        params: SemanticReviewParams,
    ) -> ResultEnvelope {
        finish(
            "fetch_reviews_by_semantic_search",
            self.semantic_reviews(params).await,
        )
    }

    /// Reviews within a rating band.
    #[instrument(skip(self, params), fields(tool = "fetch_reviews_by_rating", min = params.min_rating, max = params.max_rating))]
    pub async fn fetch_reviews_by_rating(&self, params: ReviewsByRatingParams) -> ResultEnvelope {
        finish("fetch_reviews_by_rating", self.reviews_by_rating(params).await)
    }

    /// Rating, department and class distributions.
    #[instrument(skip(self, _params), fields(tool = "aggregate_rating_statistics"))]
    pub async fn aggregate_rating_statistics(
        &self,
        _params: RatingStatisticsParams,
    ) -> ResultEnvelope {
        finish("aggregate_rating_statistics", self.rating_statistics().await)
    }

    /// Reviews in one department.
    #[instrument(skip(self, params), fields(tool = "fetch_reviews_by_department"))]
    pub async fn fetch_reviews_by_department(
        &self,
        params: ReviewsByDepartmentParams,
    ) -> ResultEnvelope {
        let result = match require_text(&params.department, "department") {
            Ok(department) => {
                let field = self.settings.fields.reviews.department_name.clone();
                self.reviews_by_term(&field, "department", department, params.max_results)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        finish("fetch_reviews_by_department", result)
    }

    /// Reviews in one product class.
    #[instrument(skip(self, params), fields(tool = "fetch_reviews_by_class"))]
    pub async fn fetch_reviews_by_class(&self, params: ReviewsByClassParams) -> ResultEnvelope {
        let result = match require_text(&params.class_name, "class_name") {
            Ok(class_name) => {
                let field = self.settings.fields.reviews.class_name.clone();
                self.reviews_by_term(&field, "class_name", class_name, params.max_results)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        finish("fetch_reviews_by_class", result)
    }

    async fn semantic_reviews(
        &self,
        params: SemanticReviewParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.reviews;
        let query = require_text(&params.query, "query")?;
        let size = clamp_size(params.max_results, 10);
        let k = u32::try_from(size).unwrap_or(u32::MAX);

        let knn = match params.query_vector {
            Some(vector) => Knn::with_vector(&f.embedding, vector, k)?,
            None => Knn::with_text(
                &f.embedding,
                &self.settings.embedding_model_id,
                query.as_str(),
                k,
            )?,
        };
        let request = QueryRequest::new(&self.settings.indices.reviews)
            .must(knn)
            .size(size);

        let result = self.backend.search(&request).await?;
        let reviews: Vec<Value> = result.hits.iter().map(|hit| review_record(hit, f)).collect();
        Ok(json!({
            "query": query,
            "total_found": reviews.len(),
            "reviews": reviews,
        })
        .into())
    }

    async fn reviews_by_rating(
        &self,
        params: ReviewsByRatingParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.reviews;
        let (min, max) = validate_rating_band(params.min_rating, params.max_rating)?;

        let request = QueryRequest::new(&self.settings.indices.reviews)
            .filter(Clause::range(
                &f.rating,
                RangeBounds::between(Some(min), Some(max)),
            )?)
            .size(clamp_size(params.max_results, 10));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "rating_range": { "min": min, "max": max },
            "total_found": result.total,
            "reviews": result.hits.iter().map(|hit| review_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn rating_statistics(&self) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.reviews;
        let request = QueryRequest::new(&self.settings.indices.reviews)
            .aggregate("avg_rating", AggSpec::avg(&f.rating))
            .aggregate("avg_age", AggSpec::avg(&f.age))
            .aggregate("total_feedback", AggSpec::sum(&f.alike_feedback_count))
            .aggregate(
                "ratings",
                TermsAgg::new(&f.rating, 5).order(TermsOrder::KeyAsc).into(),
            )
            .aggregate("departments", AggSpec::terms(&f.department_name, 20))
            .aggregate("classes", AggSpec::terms(&f.class_name, 30))
            .size(0);

        let (result, aggs) = self.run(&request).await?;
        #[allow(clippy::cast_precision_loss)]
        let total = result.total as f64;
        let ratings: Vec<Value> = aggs
            .bucket_slice("ratings")
            .iter()
            .map(|b| {
                #[allow(clippy::cast_precision_loss)]
                let count = b.doc_count as f64;
                json!({
                    "rating": rating_key(b),
                    "count": b.doc_count,
                    "percentage": percentage_share(count, total),
                })
            })
            .collect();

        Ok(json!({
            "total_reviews": result.total,
            "average_rating": aggs.value_opt("avg_rating").map(round2),
            "average_age": aggs.value_opt("avg_age").map(round2),
            "total_alike_feedback": number_json(aggs.value("total_feedback")),
            "rating_distribution": ratings,
            "department_distribution": distribution(aggs.bucket_slice("departments"), "department"),
            "class_distribution": distribution(aggs.bucket_slice("classes"), "class_name"),
        })
        .into())
    }

    async fn reviews_by_term(
        &self,
        field: &str,
        label: &str,
        value: String,
        max_results: Option<i64>,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.reviews;
        let request = QueryRequest::new(&self.settings.indices.reviews)
            .filter(Clause::term(field, value.as_str()))
            .size(clamp_size(max_results, 10));

        let (result, _) = self.run(&request).await?;
        let mut data = json!({
            "total_found": result.total,
            "reviews": result.hits.iter().map(|hit| review_record(hit, f)).collect::<Vec<_>>(),
        });
        data[label] = Value::String(value);
        Ok(data.into())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_rating_band(min: i64, max: i64) -> Result<(i64, i64), ValidationError> {
    let in_scale = |r: i64| (MIN_RATING..=MAX_RATING).contains(&r);
    if !in_scale(min) {
        return Err(ValidationError::new(
            "min_rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }
    if !in_scale(max) {
        return Err(ValidationError::new(
            "max_rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }
    if min > max {
        return Err(ValidationError::new(
            "min_rating",
            format!("{min} exceeds max_rating {max}"),
        ));
    }
    Ok((min, max))
}

fn review_record(hit: &HitRecord, f: &ReviewFields) -> Value {
    json!({
        "id": hit.id,
        "score": hit.score,
        "rating": hit.value(&f.rating),
        "title": hit.value(&f.title),
        "review_text": hit.value(&f.review_text),
        "department_name": hit.value(&f.department_name),
        "class_name": hit.value(&f.class_name),
        "age": hit.value(&f.age),
        "alike_feedback_count": hit.value(&f.alike_feedback_count),
    })
}

/// Numeric rating keys render as integers.
fn rating_key(bucket: &Bucket) -> Value {
    bucket
        .numeric_key
        .map_or_else(|| Value::String(bucket.key.clone()), number_json)
}

fn distribution(buckets: &[Bucket], key_name: &str) -> Vec<Value> {
    buckets
        .iter()
        .map(|b| {
            let mut entry = json!({ "count": b.doc_count });
            entry[key_name] = Value::String(b.key.clone());
            entry
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use retail_agents_core::aggregation::DecodedAggs;
    use serde_json::Map;

    use super::*;

    #[test]
    fn test_rating_band_validation() {
        assert_eq!(validate_rating_band(4, 5).unwrap(), (4, 5));
        assert_eq!(validate_rating_band(3, 3).unwrap(), (3, 3));
        assert_eq!(validate_rating_band(0, 5).unwrap_err().parameter, "min_rating");
        assert_eq!(validate_rating_band(1, 6).unwrap_err().parameter, "max_rating");
        assert_eq!(validate_rating_band(5, 2).unwrap_err().parameter, "min_rating");
    }

    #[test]
    fn test_rating_key_prefers_numeric() {
        let bucket = Bucket {
            key: "4".to_string(),
            numeric_key: Some(4.0),
            doc_count: 12,
            sub: DecodedAggs::default(),
        };
        assert_eq!(rating_key(&bucket), json!(4));
    }

    #[test]
    fn test_review_record_maps_fields() {
        let mut source = Map::new();
        source.insert("rating".to_string(), json!(5));
        source.insert("department_name".to_string(), json!("Tops"));
        let hit = HitRecord {
            id: "r1".to_string(),
            score: Some(0.9),
            source,
        };
        let record = review_record(&hit, &ReviewFields::default());
        assert_eq!(record["id"], "r1");
        assert_eq!(record["rating"], 5);
        assert_eq!(record["department"], "Tops");
        assert_eq!(record["title"], Value::Null);
    }
}
