//! Parsed search hits.

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// One document returned by a search or point lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    /// Document id.
    pub id: String,
    /// Relevance score; absent for point lookups and sorted searches.
    pub score: Option<f64>,
    /// Stored document.
    pub source: Map<String, Value>,
}

impl HitRecord {
    /// Parse a `hits.hits[]` element or a `GET _doc` body.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidResponse` when `_id` is missing.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let id = match value.get("_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(DecodeError::InvalidResponse("hit without _id".to_string())),
        };
        let source = match value.get("_source") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        Ok(Self {
            id,
            score: value.get("_score").and_then(Value::as_f64),
            source,
        })
    }

    /// Raw source value, `Null` when absent.
    #[must_use]
    pub fn value(&self, field: &str) -> Value {
        self.source.get(field).cloned().unwrap_or(Value::Null)
    }

    /// Source value as text. Numbers are rendered, anything else is `None`.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.source.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Source value as a number, `0` when absent or non-numeric.
    ///
    /// Numeric strings (CSV imports often store them that way) are parsed.
    #[must_use]
    pub fn number(&self, field: &str) -> f64 {
        self.number_or(field, 0.0)
    }

    /// Source value as a number, `default` when absent or non-numeric.
    #[must_use]
    pub fn number_or(&self, field: &str, default: f64) -> f64 {
        match self.source.get(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// `{id, score, ..source}` as returned to callers.
    #[must_use]
    pub fn flatten(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(score) = self.score {
            map.insert("score".to_string(), Value::from(score));
        }
        for (key, value) in &self.source {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(map)
    }
}

/// Parsed search response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Exact count of matching documents.
    pub total: u64,
    /// Returned hits, in engine order.
    pub hits: Vec<HitRecord>,
    /// Raw `aggregations` object, `Null` when none were requested.
    pub aggregations: Value,
}

impl SearchResult {
    /// Parse a `_search` response body.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidResponse` when `hits` is missing or a hit
    /// cannot be parsed.
    pub fn from_response(body: &Value) -> Result<Self, DecodeError> {
        let hits_section = body
            .get("hits")
            .ok_or_else(|| DecodeError::InvalidResponse("missing hits section".to_string()))?;

        let hits = match hits_section.get("hits") {
            Some(Value::Array(items)) => items
                .iter()
                .map(HitRecord::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(DecodeError::InvalidResponse(
                    "hits.hits is not an array".to_string(),
                ));
            }
        };

        // `total` is an object since 7.x; older clusters send a bare number.
        let total = match hits_section.get("total") {
            Some(Value::Object(t)) => t.get("value").and_then(Value::as_u64),
            Some(v) => v.as_u64(),
            None => None,
        }
        .unwrap_or(hits.len() as u64);

        Ok(Self {
            total,
            hits,
            aggregations: body.get("aggregations").cloned().unwrap_or(Value::Null),
        })
    }

    /// Empty result.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total: 0,
            hits: Vec::new(),
            aggregations: Value::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "hits": [
                    { "_id": "a", "_score": 1.5, "_source": { "name": "Lamp", "price": 20 } },
                    { "_id": "b", "_score": null, "_source": { "name": "Desk" } }
                ]
            },
            "aggregations": { "total": { "value": 3.0 } }
        });
        let result = SearchResult::from_response(&body).unwrap();
        assert_eq!(result.total, 42);
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].score, Some(1.5));
        assert_eq!(result.hits[1].score, None);
        assert_eq!(result.aggregations["total"]["value"], 3.0);
    }

    #[test]
    fn test_zero_hits_is_not_an_error() {
        let body = json!({ "hits": { "total": { "value": 0 }, "hits": [] } });
        let result = SearchResult::from_response(&body).unwrap();
        assert_eq!(result.total, 0);
        assert!(result.hits.is_empty());
        assert!(result.aggregations.is_null());
    }

    #[test]
    fn test_legacy_numeric_total() {
        let body = json!({ "hits": { "total": 7, "hits": [] } });
        assert_eq!(SearchResult::from_response(&body).unwrap().total, 7);
    }

    #[test]
    fn test_missing_hits_section() {
        assert!(SearchResult::from_response(&json!({ "took": 1 })).is_err());
    }

    #[test]
    fn test_hit_accessors() {
        let hit = HitRecord::from_value(&json!({
            "_id": "1",
            "_source": { "Inventory Level": 12, "price": "9.5", "Region": "North" }
        }))
        .unwrap();
        assert!((hit.number("Inventory Level") - 12.0).abs() < f64::EPSILON);
        assert!((hit.number("price") - 9.5).abs() < f64::EPSILON);
        assert!(hit.number("missing").abs() < f64::EPSILON);
        assert!((hit.number_or("quantity", 1.0) - 1.0).abs() < f64::EPSILON);
        assert_eq!(hit.text("Region").as_deref(), Some("North"));
        assert_eq!(hit.text("Inventory Level").as_deref(), Some("12"));
        assert_eq!(hit.value("missing"), Value::Null);
    }

    #[test]
    fn test_flatten_puts_id_and_score_first() {
        let hit = HitRecord {
            id: "p1".to_string(),
            score: Some(2.0),
            source: json!({ "name": "Lamp", "id": "shadowed" })
                .as_object()
                .cloned()
                .unwrap(),
        };
        let flat = hit.flatten();
        assert_eq!(flat["id"], "p1");
        assert_eq!(flat["score"], 2.0);
        assert_eq!(flat["name"], "Lamp");
    }
}
