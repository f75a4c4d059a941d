//! Boolean query composition and the search request body.

use serde_json::{Map, Value, json};

use crate::aggregation::{AggSpec, Aggregations};

use super::clause::{Clause, Script};

/// Compose `must` and `filter` clauses into a single query.
///
/// `must` clauses contribute to relevance; `filter` clauses only gate
/// inclusion. With no clauses at all the result is `match_all`.
#[must_use]
pub fn build_bool_query(must: &[Clause], filter: &[Clause]) -> Value {
    if must.is_empty() && filter.is_empty() {
        return Clause::MatchAll.to_json();
    }

    let mut bool_body = Map::new();
    if !must.is_empty() {
        bool_body.insert(
            "must".to_string(),
            Value::Array(must.iter().map(Clause::to_json).collect()),
        );
    }
    if !filter.is_empty() {
        bool_body.insert(
            "filter".to_string(),
            Value::Array(filter.iter().map(Clause::to_json).collect()),
        );
    }
    json!({ "bool": bool_body })
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One entry of the `sort` list.
#[derive(Debug, Clone, PartialEq)]
pub enum SortClause {
    /// Relevance score, descending.
    Score,
    /// A document field.
    Field {
        /// Field name, verbatim.
        field: String,
        /// Direction.
        order: SortOrder,
    },
    /// A numeric value computed by a script.
    Script {
        /// Script producing the sort value.
        script: Script,
        /// Direction.
        order: SortOrder,
    },
}

impl SortClause {
    /// Sort by `field`.
    #[must_use]
    pub fn field(field: impl Into<String>, order: SortOrder) -> Self {
        Self::Field {
            field: field.into(),
            order,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Score => Value::String("_score".to_string()),
            Self::Field { field, order } => {
                json!({ field.as_str(): { "order": order.as_str() } })
            }
            Self::Script { script, order } => json!({
                "_script": {
                    "type": "number",
                    "script": script.to_json(),
                    "order": order.as_str()
                }
            }),
        }
    }
}

/// A complete search request against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Target index.
    pub index: String,
    /// Relevance-affecting clauses, in order.
    pub must: Vec<Clause>,
    /// Score-independent gates.
    pub filter: Vec<Clause>,
    /// Named aggregations.
    pub aggregations: Aggregations,
    /// Sort keys, in priority order.
    pub sort: Vec<SortClause>,
    /// Maximum hits returned.
    pub size: usize,
}

impl QueryRequest {
    /// Default hit count when none is set.
    pub const DEFAULT_SIZE: usize = 10;

    /// Empty request (match-all, default size) against `index`.
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            must: Vec::new(),
            filter: Vec::new(),
            aggregations: Aggregations::new(),
            sort: Vec::new(),
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Add a relevance clause.
    #[must_use]
    pub fn must(mut self, clause: impl Into<Clause>) -> Self {
        self.must.push(clause.into());
        self
    }

    /// Add a filter clause.
    #[must_use]
    pub fn filter(mut self, clause: impl Into<Clause>) -> Self {
        self.filter.push(clause.into());
        self
    }

    /// Add a filter clause when present.
    #[must_use]
    pub fn filter_opt(self, clause: Option<Clause>) -> Self {
        match clause {
            Some(clause) => self.filter(clause),
            None => self,
        }
    }

    /// Add a named aggregation.
    #[must_use]
    pub fn aggregate(mut self, name: impl Into<String>, spec: AggSpec) -> Self {
        self.aggregations.insert(name, spec);
        self
    }

    /// Append a sort key.
    #[must_use]
    pub fn sort(mut self, sort: SortClause) -> Self {
        self.sort.push(sort);
        self
    }

    /// Set the hit count.
    #[must_use]
    pub const fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// The `query` part of the body.
    #[must_use]
    pub fn query(&self) -> Value {
        build_bool_query(&self.must, &self.filter)
    }

    /// Render the plain `{query, size, sort, aggs}` body.
    ///
    /// The retriever wrapper is never used, so relevance ranking and an
    /// explicit sort can coexist in one request.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query());
        body.insert("size".to_string(), Value::from(self.size));
        body.insert("track_total_hits".to_string(), Value::Bool(true));
        if !self.sort.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sort.iter().map(SortClause::to_json).collect()),
            );
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), self.aggregations.to_json());
        }
        Value::Object(body)
    }
}
