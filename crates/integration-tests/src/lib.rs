//! Integration test support for the retail assistant tools.
//!
//! [`MockBackend`] stands in for the search cluster: it answers searches
//! with canned engine responses per index, serves point lookups from an
//! in-memory document map, and records every request it receives.
//!
//! ```rust,ignore
//! let backend = MockBackend::new()
//!     .with_search_response("products", search_response(&[("P1", json!({"name": "Lamp"}))], None));
//! let tools = retail_tools(backend);
//! let envelope = tools.execute("search_products", &json!({"query": "lamp"})).await;
//! assert!(envelope.ok);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use retail_agents_core::query::QueryRequest;
use retail_agents_core::{HitRecord, SearchResult};
use retail_agents_tools::{RetailTools, SearchBackend, SearchError, ToolSettings};
use serde_json::{Map, Value, json};

/// In-memory [`SearchBackend`].
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    documents: HashMap<(String, String), Map<String, Value>>,
    failing_ids: HashSet<(String, String)>,
    unavailable: Option<String>,
    requests: Mutex<Vec<Value>>,
    lookups: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Backend with no data; every search hits a missing index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw `_search` response body for `index`.
    ///
    /// Responses are served in order; the last one is repeated.
    #[must_use]
    pub fn with_search_response(self, index: &str, body: Value) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.entry(index.to_string()).or_default().push_back(body);
        }
        self
    }

    /// Store a document for point lookups.
    #[must_use]
    pub fn with_document(mut self, index: &str, id: &str, source: Value) -> Self {
        let source = source.as_object().cloned().unwrap_or_default();
        self.documents
            .insert((index.to_string(), id.to_string()), source);
        self
    }

    /// Make lookups of `id` fail with an engine error.
    #[must_use]
    pub fn with_failing_id(mut self, index: &str, id: &str) -> Self {
        self.failing_ids.insert((index.to_string(), id.to_string()));
        self
    }

    /// Fail every call with a connection error.
    #[must_use]
    pub fn unavailable(mut self, message: &str) -> Self {
        self.unavailable = Some(message.to_string());
        self
    }

    /// Number of backend calls made (searches plus lookups).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Request bodies of every search, in call order, each with its `index`.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The most recent search body.
    pub fn last_request(&self) -> Option<Value> {
        self.requests().pop()
    }

    /// `(index, id)` of every point lookup, in call order.
    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn next_response(&self, index: &str) -> Option<Value> {
        let mut responses = self.responses.lock().ok()?;
        let queue = responses.get_mut(index)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl SearchBackend for MockBackend {
    async fn search(&self, request: &QueryRequest) -> Result<SearchResult, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut body = request.to_body();
        body["index"] = Value::String(request.index.clone());
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(body);
        }

        if let Some(message) = &self.unavailable {
            return Err(SearchError::Connection(message.clone()));
        }
        let response = self
            .next_response(&request.index)
            .ok_or_else(|| SearchError::IndexNotFound(request.index.clone()))?;
        Ok(SearchResult::from_response(&response)?)
    }

    async fn get_by_id(&self, index: &str, id: &str) -> Result<HitRecord, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push((index.to_string(), id.to_string()));
        }

        if let Some(message) = &self.unavailable {
            return Err(SearchError::Connection(message.clone()));
        }
        let key = (index.to_string(), id.to_string());
        if self.failing_ids.contains(&key) {
            return Err(SearchError::Search {
                status: 500,
                message: format!("shard failure reading {id}"),
            });
        }
        self.documents
            .get(&key)
            .map(|source| HitRecord {
                id: id.to_string(),
                score: None,
                source: source.clone(),
            })
            .ok_or_else(|| SearchError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            })
    }
}

/// Façade over `backend` with default settings.
pub fn retail_tools(backend: MockBackend) -> RetailTools<MockBackend> {
    RetailTools::new(backend, ToolSettings::default())
}

/// A `_search` response body with `hits` and optional `aggregations`.
///
/// `hits.total.value` is the number of hits given.
pub fn search_response(hits: &[(&str, Value)], aggregations: Option<Value>) -> Value {
    search_response_with_total(hits, hits.len() as u64, aggregations)
}

/// Like [`search_response`] with an explicit total.
pub fn search_response_with_total(
    hits: &[(&str, Value)],
    total: u64,
    aggregations: Option<Value>,
) -> Value {
    let hits: Vec<Value> = hits
        .iter()
        .map(|(id, source)| json!({ "_id": id, "_score": 1.0, "_source": source }))
        .collect();
    let mut body = json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "hits": hits,
        }
    });
    if let Some(aggs) = aggregations {
        body["aggregations"] = aggs;
    }
    body
}

/// Terms or histogram buckets from `(key, doc_count, sub-aggregations)`.
pub fn buckets(items: &[(&str, u64, Value)]) -> Value {
    let buckets: Vec<Value> = items
        .iter()
        .map(|(key, count, sub)| {
            let mut bucket = sub.as_object().cloned().unwrap_or_default();
            bucket.insert("key".to_string(), json!(key));
            bucket.insert("doc_count".to_string(), json!(count));
            Value::Object(bucket)
        })
        .collect();
    json!({ "doc_count_error_upper_bound": 0, "sum_other_doc_count": 0, "buckets": buckets })
}
