//! Query clauses and their Query DSL rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ValidationError;

/// Largest `num_candidates` the engine accepts for a kNN clause.
const MAX_NUM_CANDIDATES: u32 = 10_000;

/// A single match or filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact equality on an untokenized field.
    Term {
        /// Field name, verbatim.
        field: String,
        /// Value the field must equal.
        value: Value,
    },
    /// Inclusive bounds on a numeric or date field.
    Range {
        /// Field name, verbatim.
        field: String,
        /// At least one bound is always set.
        bounds: RangeBounds,
    },
    /// Full-text match across several fields.
    MultiMatch(MultiMatch),
    /// Nearest-neighbour search over a dense vector field.
    Knn(Knn),
    /// Matches every document.
    MatchAll,
    /// Documents resembling the referenced ones.
    MoreLikeThis(MoreLikeThis),
    /// Painless predicate evaluated per document.
    Script(Script),
}

impl Clause {
    /// Exact match of `field` against `value`.
    #[must_use]
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Range clause on `field`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the field when neither bound is set.
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Result<Self, ValidationError> {
        let field = field.into();
        if bounds.is_unbounded() {
            return Err(ValidationError::new(
                field,
                "range requires at least one of gte or lte",
            ));
        }
        Ok(Self::Range { field, bounds })
    }

    /// Render this clause as a Query DSL object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Self::Range { field, bounds } => {
                json!({ "range": { field.as_str(): bounds.to_json() } })
            }
            Self::MultiMatch(m) => m.to_json(),
            Self::Knn(k) => k.to_json(),
            Self::MatchAll => json!({ "match_all": {} }),
            Self::MoreLikeThis(m) => m.to_json(),
            Self::Script(s) => json!({ "script": { "script": s.to_json() } }),
        }
    }
}

impl From<MultiMatch> for Clause {
    fn from(value: MultiMatch) -> Self {
        Self::MultiMatch(value)
    }
}

impl From<Knn> for Clause {
    fn from(value: Knn) -> Self {
        Self::Knn(value)
    }
}

impl From<MoreLikeThis> for Clause {
    fn from(value: MoreLikeThis) -> Self {
        Self::MoreLikeThis(value)
    }
}

impl From<Script> for Clause {
    fn from(value: Script) -> Self {
        Self::Script(value)
    }
}

// =============================================================================
// Range
// =============================================================================

/// Inclusive bounds for a range clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    /// Lower bound (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    /// Upper bound (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    /// Date format the bounds are written in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl RangeBounds {
    /// Bounds from two optional values.
    #[must_use]
    pub fn between<T: Into<Value>>(gte: Option<T>, lte: Option<T>) -> Self {
        Self {
            gte: gte.map(Into::into),
            lte: lte.map(Into::into),
            format: None,
        }
    }

    /// Only a lower bound.
    #[must_use]
    pub fn at_least(gte: impl Into<Value>) -> Self {
        Self {
            gte: Some(gte.into()),
            ..Self::default()
        }
    }

    /// Only an upper bound.
    #[must_use]
    pub fn at_most(lte: impl Into<Value>) -> Self {
        Self {
            lte: Some(lte.into()),
            ..Self::default()
        }
    }

    /// Attach a date format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// `true` when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.lte.is_none()
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(gte) = &self.gte {
            body.insert("gte".to_string(), gte.clone());
        }
        if let Some(lte) = &self.lte {
            body.insert("lte".to_string(), lte.clone());
        }
        if let Some(format) = &self.format {
            body.insert("format".to_string(), Value::String(format.clone()));
        }
        Value::Object(body)
    }
}

// =============================================================================
// Multi-match
// =============================================================================

/// How per-field scores combine in a multi-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchKind {
    /// Highest-scoring field wins.
    #[default]
    BestFields,
    /// Field scores are summed.
    MostFields,
}

impl MatchKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::BestFields => "best_fields",
            Self::MostFields => "most_fields",
        }
    }
}

/// Edit-distance tolerance for text matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuzziness {
    /// Engine picks the distance from term length.
    Auto,
    /// Fixed maximum edit distance.
    Edits(u8),
}

impl Fuzziness {
    fn to_json(self) -> Value {
        match self {
            Self::Auto => Value::String("AUTO".to_string()),
            Self::Edits(n) => Value::from(n),
        }
    }
}

/// Full-text query across several fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMatch {
    /// Query text.
    pub query: String,
    /// Fields to search, optionally boosted (`name^3`).
    pub fields: Vec<String>,
    /// Score combination.
    pub kind: MatchKind,
    /// Typo tolerance.
    pub fuzziness: Option<Fuzziness>,
}

impl MultiMatch {
    /// Best-fields match with no fuzziness.
    #[must_use]
    pub fn new<I, S>(query: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            kind: MatchKind::BestFields,
            fuzziness: None,
        }
    }

    /// Enable `AUTO` fuzziness.
    #[must_use]
    pub const fn fuzzy(mut self) -> Self {
        self.fuzziness = Some(Fuzziness::Auto);
        self
    }

    /// Override the score combination.
    #[must_use]
    pub const fn kind(mut self, kind: MatchKind) -> Self {
        self.kind = kind;
        self
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(self.query.clone()));
        body.insert("fields".to_string(), json!(self.fields));
        body.insert(
            "type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        if let Some(fuzziness) = self.fuzziness {
            body.insert("fuzziness".to_string(), fuzziness.to_json());
        }
        json!({ "multi_match": body })
    }
}

// =============================================================================
// kNN
// =============================================================================

/// What a kNN clause searches near.
#[derive(Debug, Clone, PartialEq)]
pub enum KnnTarget {
    /// Explicit query vector.
    Vector(Vec<f32>),
    /// Text embedded server-side by an inference model.
    Text {
        /// Deployed embedding model id.
        model_id: String,
        /// Text to embed.
        text: String,
    },
}

/// Nearest-neighbour clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Knn {
    /// Dense vector field.
    pub field: String,
    /// Exactly one of vector or text.
    pub target: KnnTarget,
    /// Neighbours to return.
    pub k: u32,
    /// Candidates examined per shard.
    pub num_candidates: u32,
}

impl Knn {
    /// kNN over an explicit vector.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the vector is empty or `k` is zero.
    pub fn with_vector(
        field: impl Into<String>,
        vector: Vec<f32>,
        k: u32,
    ) -> Result<Self, ValidationError> {
        if vector.is_empty() {
            return Err(ValidationError::new("query_vector", "must not be empty"));
        }
        Self::build(field.into(), KnnTarget::Vector(vector), k)
    }

    /// kNN over text embedded by `model_id`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the text is blank or `k` is zero.
    pub fn with_text(
        field: impl Into<String>,
        model_id: impl Into<String>,
        text: impl Into<String>,
        k: u32,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::missing("query"));
        }
        Self::build(
            field.into(),
            KnnTarget::Text {
                model_id: model_id.into(),
                text,
            },
            k,
        )
    }

    fn build(field: String, target: KnnTarget, k: u32) -> Result<Self, ValidationError> {
        if k == 0 {
            return Err(ValidationError::new("k", "must be at least 1"));
        }
        let num_candidates = k.saturating_mul(10).clamp(k, MAX_NUM_CANDIDATES.max(k));
        Ok(Self {
            field,
            target,
            k,
            num_candidates,
        })
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("field".to_string(), Value::String(self.field.clone()));
        match &self.target {
            KnnTarget::Vector(vector) => {
                body.insert("query_vector".to_string(), json!(vector));
            }
            KnnTarget::Text { model_id, text } => {
                body.insert(
                    "query_vector_builder".to_string(),
                    json!({
                        "text_embedding": {
                            "model_id": model_id,
                            "model_text": text
                        }
                    }),
                );
            }
        }
        body.insert("k".to_string(), Value::from(self.k));
        body.insert("num_candidates".to_string(), Value::from(self.num_candidates));
        json!({ "knn": body })
    }
}

// =============================================================================
// More-like-this
// =============================================================================

/// Documents resembling one or more indexed documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreLikeThis {
    /// Text fields compared.
    pub fields: Vec<String>,
    /// `(index, id)` pairs of the reference documents.
    pub like: Vec<(String, String)>,
    /// Minimum term frequency in the reference document.
    pub min_term_freq: u32,
    /// Minimum number of documents a term must appear in.
    pub min_doc_freq: u32,
    /// Cap on selected query terms.
    pub max_query_terms: u32,
}

impl MoreLikeThis {
    /// Documents like `id` in `index`, compared on `fields`.
    #[must_use]
    pub fn document<I, S>(fields: I, index: impl Into<String>, id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            like: vec![(index.into(), id.into())],
            min_term_freq: 1,
            min_doc_freq: 1,
            max_query_terms: 12,
        }
    }

    fn to_json(&self) -> Value {
        let like: Vec<Value> = self
            .like
            .iter()
            .map(|(index, id)| json!({ "_index": index, "_id": id }))
            .collect();
        json!({
            "more_like_this": {
                "fields": self.fields,
                "like": like,
                "min_term_freq": self.min_term_freq,
                "min_doc_freq": self.min_doc_freq,
                "max_query_terms": self.max_query_terms
            }
        })
    }
}

// =============================================================================
// Script
// =============================================================================

/// Painless script with parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Script source.
    pub source: String,
    /// Named parameters.
    pub params: Map<String, Value>,
}

impl Script {
    /// Script with no parameters.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            params: Map::new(),
        }
    }

    /// Add a named parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Script body (`{source, params?}`).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("source".to_string(), Value::String(self.source.clone()));
        if !self.params.is_empty() {
            body.insert("params".to_string(), Value::Object(self.params.clone()));
        }
        Value::Object(body)
    }
}

/// Painless expression multiplying two numeric doc values.
#[must_use]
pub fn product_expression(left: &str, right: &str) -> String {
    format!("doc['{left}'].value * doc['{right}'].value")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_term_keeps_field_name_verbatim() {
        let clause = Clause::term("Product ID", "P0001");
        assert_eq!(clause.to_json(), json!({ "term": { "Product ID": "P0001" } }));
    }

    #[test]
    fn test_range_requires_a_bound() {
        let err = Clause::range("Inventory Level", RangeBounds::default()).unwrap_err();
        assert_eq!(err.parameter, "Inventory Level");
    }

    #[test]
    fn test_range_renders_inclusive_bounds() {
        let clause = Clause::range("price", RangeBounds::between(Some(10), Some(20))).unwrap();
        assert_eq!(
            clause.to_json(),
            json!({ "range": { "price": { "gte": 10, "lte": 20 } } })
        );
    }

    #[test]
    fn test_range_single_bound_and_format() {
        let clause = Clause::range(
            "invoice_date",
            RangeBounds::at_least("01/01/2022").with_format("dd/MM/yyyy"),
        )
        .unwrap();
        assert_eq!(
            clause.to_json(),
            json!({ "range": { "invoice_date": { "gte": "01/01/2022", "format": "dd/MM/yyyy" } } })
        );
    }

    #[test]
    fn test_multi_match_defaults_to_best_fields() {
        let clause: Clause = MultiMatch::new("shoes", ["name^3", "tags"]).fuzzy().into();
        assert_eq!(
            clause.to_json(),
            json!({
                "multi_match": {
                    "query": "shoes",
                    "fields": ["name^3", "tags"],
                    "type": "best_fields",
                    "fuzziness": "AUTO"
                }
            })
        );
    }

    #[test]
    fn test_multi_match_summed_only_when_requested() {
        let clause: Clause = MultiMatch::new("x", ["a"]).kind(MatchKind::MostFields).into();
        assert_eq!(clause.to_json()["multi_match"]["type"], "most_fields");
        assert!(clause.to_json()["multi_match"].get("fuzziness").is_none());
    }

    #[test]
    fn test_knn_text_uses_vector_builder() {
        let knn = Knn::with_text("review_embedding", "e5-small", "comfortable fabric", 5).unwrap();
        let body = Clause::from(knn).to_json();
        assert_eq!(
            body["knn"]["query_vector_builder"]["text_embedding"]["model_text"],
            "comfortable fabric"
        );
        assert_eq!(body["knn"]["k"], 5);
        assert_eq!(body["knn"]["num_candidates"], 50);
        assert!(body["knn"].get("query_vector").is_none());
    }

    #[test]
    fn test_knn_rejects_empty_inputs() {
        assert!(Knn::with_vector("v", Vec::new(), 3).is_err());
        assert!(Knn::with_text("v", "m", "   ", 3).is_err());
        assert!(Knn::with_vector("v", vec![0.1], 0).is_err());
    }

    #[test]
    fn test_knn_candidates_capped() {
        let knn = Knn::with_vector("v", vec![1.0, 0.0], 5_000).unwrap();
        assert_eq!(knn.num_candidates, 10_000);
    }

    #[test]
    fn test_more_like_this_document() {
        let clause: Clause = MoreLikeThis::document(["name", "tags"], "products", "p1").into();
        let body = clause.to_json();
        assert_eq!(body["more_like_this"]["like"][0]["_id"], "p1");
        assert_eq!(body["more_like_this"]["max_query_terms"], 12);
    }

    #[test]
    fn test_script_clause_with_params() {
        let script = Script::new("doc['price'].value >= params.min").param("min", 100.0);
        let clause = Clause::from(script);
        assert_eq!(
            clause.to_json(),
            json!({
                "script": {
                    "script": {
                        "source": "doc['price'].value >= params.min",
                        "params": { "min": 100.0 }
                    }
                }
            })
        );
    }

    #[test]
    fn test_product_expression() {
        assert_eq!(
            product_expression("price", "quantity"),
            "doc['price'].value * doc['quantity'].value"
        );
    }
}
