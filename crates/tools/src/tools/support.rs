//! Customer support FAQ tools.

use retail_agents_core::aggregation::{AggSpec, Bucket, CalendarInterval, DateHistogramAgg};
use retail_agents_core::classify::round1;
use retail_agents_core::fields::FaqFields;
use retail_agents_core::query::{
    Clause, MultiMatch, QueryRequest, RangeBounds, SortClause, SortOrder,
};
use retail_agents_core::{HitRecord, ResultEnvelope, ValidationError};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ToolError;
use crate::search::SearchBackend;

use super::{RetailTools, Tool, ToolOutput, clamp_size, finish, require_text};

const DOMAIN: &str = "support";

/// Months of modification history reported by `get_faq_statistics`.
const RECENT_PERIODS: usize = 12;

/// Get all support tools (5 total).
#[must_use]
pub fn support_tools() -> Vec<Tool> {
    vec![
        search_faqs_tool(),
        search_faqs_by_topic_tool(),
        get_faq_by_id_tool(),
        search_faqs_recent_tool(),
        get_faq_statistics_tool(),
    ]
}

// =============================================================================
// Tool Definitions
// =============================================================================

fn search_faqs_tool() -> Tool {
    Tool {
        name: "search_faqs".to_string(),
        description: "Search the FAQ knowledge base (typo tolerant). Use for customer \
            questions about shipping, returns, payments, accounts."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The customer's question" },
                "size": { "type": "integer", "description": "FAQs returned (default 5)", "minimum": 1, "maximum": 500 }
            },
            "required": ["query"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_faqs_by_topic_tool() -> Tool {
    Tool {
        name: "search_faqs_by_topic".to_string(),
        description: "FAQs that match a topic and, optionally, a list of keywords.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "topic": { "type": "string", "description": "e.g. 'returns', 'shipping'" },
                "keywords": { "type": "array", "items": { "type": "string" } },
                "size": { "type": "integer", "description": "FAQs returned (default 10)", "minimum": 1, "maximum": 500 }
            },
            "required": ["topic"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_faq_by_id_tool() -> Tool {
    Tool {
        name: "get_faq_by_id".to_string(),
        description: "Fetch one FAQ entry by its ID.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "faq_id": { "type": "string" }
            },
            "required": ["faq_id"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_faqs_recent_tool() -> Tool {
    Tool {
        name: "search_faqs_recent".to_string(),
        description: "FAQs modified within the last N days, newest first.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "days": { "type": "integer", "description": "Look-back window (default 30)", "minimum": 1 },
                "size": { "type": "integer", "description": "FAQs returned (default 10)", "minimum": 1, "maximum": 500 }
            }
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_faq_statistics_tool() -> Tool {
    Tool {
        name: "get_faq_statistics".to_string(),
        description: "Knowledge base overview: entry count, content types, languages, \
            formats, average length and monthly modification activity."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Input of `search_faqs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqSearchParams {
    pub query: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `search_faqs_by_topic`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqTopicParams {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_faq_by_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqByIdParams {
    pub faq_id: String,
}

/// Input of `search_faqs_recent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentFaqParams {
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_faq_statistics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqStatisticsParams {}

// =============================================================================
// Operations
// =============================================================================

impl<B: SearchBackend> RetailTools<B> {
    /// Free-text FAQ search.
    #[instrument(skip(self, params), fields(tool = "search_faqs"))]
    pub async fn search_faqs(&self, params: FaqSearchParams) -> ResultEnvelope {
        finish("search_faqs", self.faq_search(params).await)
    }

    /// FAQs matching a topic and keywords.
    #[instrument(skip(self, params), fields(tool = "search_faqs_by_topic", topic = %params.topic))]
    pub async fn search_faqs_by_topic(&self, params: FaqTopicParams) -> ResultEnvelope {
        finish("search_faqs_by_topic", self.faqs_by_topic(params).await)
    }

    /// One FAQ by id.
    #[instrument(skip(self, params), fields(tool = "get_faq_by_id", faq_id = %params.faq_id))]
    pub async fn get_faq_by_id(&self, params: FaqByIdParams) -> ResultEnvelope {
        finish("get_faq_by_id", self.faq_by_id(params).await)
    }

    /// Recently modified FAQs.
    #[instrument(skip(self, params), fields(tool = "search_faqs_recent"))]
    pub async fn search_faqs_recent(&self, params: RecentFaqParams) -> ResultEnvelope {
        finish("search_faqs_recent", self.recent_faqs(params).await)
    }

    /// Knowledge base overview.
    #[instrument(skip(self, _params), fields(tool = "get_faq_statistics"))]
    pub async fn get_faq_statistics(&self, _params: FaqStatisticsParams) -> ResultEnvelope {
        finish("get_faq_statistics", self.faq_statistics().await)
    }

    async fn faq_search(&self, params: FaqSearchParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.faqs;
        let query = require_text(&params.query, "query")?;

        let request = QueryRequest::new(&self.settings.indices.faqs)
            .must(MultiMatch::new(query.as_str(), [f.content.as_str()]).fuzzy())
            .size(clamp_size(params.size, 5));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "query": query,
            "total_found": result.total,
            "faqs": result.hits.iter().map(|hit| faq_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn faqs_by_topic(&self, params: FaqTopicParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.faqs;
        let topic = require_text(&params.topic, "topic")?;
        let keywords = keyword_text(&params.keywords);

        let mut request = QueryRequest::new(&self.settings.indices.faqs)
            .must(MultiMatch::new(topic.as_str(), [f.content.as_str()]).fuzzy());
        if let Some(keywords) = &keywords {
            request = request.must(MultiMatch::new(keywords.as_str(), [f.content.as_str()]));
        }
        let request = request.size(clamp_size(params.size, 10));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "topic": topic,
            "keywords": keywords,
            "total_found": result.total,
            "faqs": result.hits.iter().map(|hit| faq_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn faq_by_id(&self, params: FaqByIdParams) -> Result<ToolOutput, ToolError> {
        let id = require_text(&params.faq_id, "faq_id")?;
        let hit = self.backend.get_by_id(&self.settings.indices.faqs, &id).await?;
        Ok(hit.flatten().into())
    }

    async fn recent_faqs(&self, params: RecentFaqParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.faqs;
        let days = params.days.unwrap_or(30);
        if days < 1 {
            return Err(ValidationError::new("days", "must be at least 1").into());
        }

        let request = QueryRequest::new(&self.settings.indices.faqs)
            .filter(Clause::range(
                &f.modified,
                RangeBounds::at_least(format!("now-{days}d/d")),
            )?)
            .sort(SortClause::field(&f.modified, SortOrder::Desc))
            .size(clamp_size(params.size, 10));

        let result = self.backend.search(&request).await?;
        Ok(json!({
            "days": days,
            "total_found": result.total,
            "faqs": result.hits.iter().map(|hit| faq_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn faq_statistics(&self) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.faqs;
        let request = QueryRequest::new(&self.settings.indices.faqs)
            .aggregate("content_types", AggSpec::terms(&f.content_type, 10))
            .aggregate("languages", AggSpec::terms(&f.language, 10))
            .aggregate("formats", AggSpec::terms(&f.format, 10))
            .aggregate("avg_content_length", AggSpec::avg(&f.content_length))
            .aggregate(
                "monthly",
                DateHistogramAgg::new(&f.modified, CalendarInterval::Month)
                    .format("yyyy-MM")
                    .into(),
            )
            .size(0);

        let (result, aggs) = self.run(&request).await?;
        Ok(json!({
            "total_faqs": result.total,
            "content_types": counts(aggs.bucket_slice("content_types"), "content_type"),
            "languages": counts(aggs.bucket_slice("languages"), "language"),
            "formats": counts(aggs.bucket_slice("formats"), "format"),
            "average_content_length": aggs.value_opt("avg_content_length").map(round1),
            "recent_activity": recent_periods(aggs.bucket_slice("monthly"), RECENT_PERIODS),
        })
        .into())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn faq_record(hit: &HitRecord, f: &FaqFields) -> Value {
    json!({
        "id": hit.id,
        "score": hit.score,
        "content": hit.value(&f.content),
        "content_type": hit.value(&f.content_type),
        "content_length": hit.value(&f.content_length),
        "language": hit.value(&f.language),
        "format": hit.value(&f.format),
        "date": hit.value(&f.date),
        "modified": hit.value(&f.modified),
    })
}

/// Non-blank keywords joined by spaces, `None` when there are none.
fn keyword_text(keywords: &[String]) -> Option<String> {
    let words: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

fn counts(buckets: &[Bucket], key_name: &str) -> Vec<Value> {
    buckets
        .iter()
        .map(|b| {
            let mut entry = json!({ "count": b.doc_count });
            entry[key_name] = Value::String(b.key.clone());
            entry
        })
        .collect()
}

/// The latest `limit` non-empty histogram periods, oldest first.
fn recent_periods(buckets: &[Bucket], limit: usize) -> Vec<Value> {
    let active: Vec<&Bucket> = buckets.iter().filter(|b| b.doc_count > 0).collect();
    let skip = active.len().saturating_sub(limit);
    active
        .into_iter()
        .skip(skip)
        .map(|b| json!({ "period": b.key, "count": b.doc_count }))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use retail_agents_core::aggregation::DecodedAggs;

    use super::*;

    fn bucket(key: &str, doc_count: u64) -> Bucket {
        Bucket {
            key: key.to_string(),
            numeric_key: None,
            doc_count,
            sub: DecodedAggs::default(),
        }
    }

    #[test]
    fn test_keyword_text() {
        let words = vec![" refund ".to_string(), String::new(), "card".to_string()];
        assert_eq!(keyword_text(&words).as_deref(), Some("refund card"));
        assert_eq!(keyword_text(&[" ".to_string()]), None);
        assert_eq!(keyword_text(&[]), None);
    }

    #[test]
    fn test_recent_periods_keeps_latest_active() {
        let buckets = vec![
            bucket("2024-01", 3),
            bucket("2024-02", 0),
            bucket("2024-03", 5),
            bucket("2024-04", 2),
        ];
        let periods = recent_periods(&buckets, 2);
        assert_eq!(
            periods,
            vec![
                json!({ "period": "2024-03", "count": 5 }),
                json!({ "period": "2024-04", "count": 2 }),
            ]
        );
        assert_eq!(recent_periods(&buckets, 12).len(), 3);
    }

    #[test]
    fn test_counts_names_key() {
        let out = counts(&[bucket("en", 7)], "language");
        assert_eq!(out, vec![json!({ "language": "en", "count": 7 })]);
    }
}
