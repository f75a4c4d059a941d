//! Flattening of aggregation responses.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::DecodeError;

use super::spec::{AggSpec, Aggregations, TermsOrder};

/// count/min/max/avg/sum summary. Extremes are `None` for empty sets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsValue {
    /// Documents with a value.
    pub count: u64,
    /// Smallest value.
    pub min: Option<f64>,
    /// Largest value.
    pub max: Option<f64>,
    /// Mean value.
    pub avg: Option<f64>,
    /// Sum of values.
    pub sum: f64,
}

/// One terms or histogram bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Display key (`key_as_string` when the engine provides one).
    pub key: String,
    /// Numeric key, for numeric and date buckets.
    pub numeric_key: Option<f64>,
    /// Documents in the bucket.
    pub doc_count: u64,
    /// Sub-aggregation results.
    pub sub: DecodedAggs,
}

/// Ordered buckets plus what the engine left out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BucketList {
    /// Buckets in their declared order.
    pub buckets: Vec<Bucket>,
    /// Documents in values that did not make it into a bucket.
    pub other_doc_count: u64,
    /// Bucket limit of the request, for terms aggregations.
    pub requested_size: Option<usize>,
}

impl BucketList {
    /// Number of buckets returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// `true` when no buckets were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate buckets in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Whether distinct values may exist beyond the returned buckets.
    ///
    /// `false` is the only claim of completeness this type ever makes.
    #[must_use]
    pub fn may_be_truncated(&self) -> bool {
        self.other_doc_count > 0
            || self
                .requested_size
                .is_some_and(|size| self.buckets.len() >= size)
    }

    /// Documents across all returned buckets.
    #[must_use]
    pub fn total_doc_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.doc_count).sum()
    }

    /// Sum of a scalar sub-aggregation across buckets.
    #[must_use]
    pub fn sum_of(&self, sub_name: &str) -> f64 {
        self.buckets.iter().map(|b| b.sub.value(sub_name)).sum()
    }
}

impl<'a> IntoIterator for &'a BucketList {
    type Item = &'a Bucket;
    type IntoIter = std::slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// A decoded aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedAgg {
    /// Sum, average or scripted metric. `None` when no document had a value.
    Value(Option<f64>),
    /// Cardinality or filtered count.
    Count(u64),
    /// Stats summary.
    Stats(StatsValue),
    /// Terms or date-histogram buckets.
    Buckets(BucketList),
}

/// Decoded aggregations keyed by request name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedAggs(BTreeMap<String, DecodedAgg>);

impl DecodedAggs {
    /// Raw decoded entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DecodedAgg> {
        self.0.get(name)
    }

    /// Scalar value, `None` if absent or empty.
    #[must_use]
    pub fn value_opt(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            DecodedAgg::Value(v) => *v,
            #[allow(clippy::cast_precision_loss)]
            DecodedAgg::Count(c) => Some(*c as f64),
            DecodedAgg::Stats(_) | DecodedAgg::Buckets(_) => None,
        }
    }

    /// Scalar value, 0 if absent or empty.
    #[must_use]
    pub fn value(&self, name: &str) -> f64 {
        self.value_opt(name).unwrap_or(0.0)
    }

    /// Count value, 0 if absent.
    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        match self.0.get(name) {
            Some(DecodedAgg::Count(c)) => *c,
            Some(DecodedAgg::Stats(s)) => s.count,
            Some(DecodedAgg::Buckets(b)) => b.total_doc_count(),
            Some(DecodedAgg::Value(_)) | None => 0,
        }
    }

    /// Stats summary, if `name` is a stats aggregation.
    #[must_use]
    pub fn stats(&self, name: &str) -> Option<&StatsValue> {
        match self.0.get(name)? {
            DecodedAgg::Stats(s) => Some(s),
            _ => None,
        }
    }

    /// Bucket list, if `name` is a bucketing aggregation.
    #[must_use]
    pub fn buckets(&self, name: &str) -> Option<&BucketList> {
        match self.0.get(name)? {
            DecodedAgg::Buckets(b) => Some(b),
            _ => None,
        }
    }

    /// Buckets of `name`, or an empty slice.
    #[must_use]
    pub fn bucket_slice(&self, name: &str) -> &[Bucket] {
        self.buckets(name).map_or(&[], |b| b.buckets.as_slice())
    }
}

/// Decode `response_aggs` (the `aggregations` object) against `specs`.
///
/// # Errors
///
/// Returns `DecodeError` when a requested aggregation is missing or does not
/// have the shape its spec implies.
pub fn decode(response_aggs: &Value, specs: &Aggregations) -> Result<DecodedAggs, DecodeError> {
    if specs.is_empty() {
        return Ok(DecodedAggs::default());
    }
    let Some(object) = response_aggs.as_object() else {
        return Err(DecodeError::MissingAggregations);
    };

    let mut decoded = BTreeMap::new();
    for (name, spec) in specs.iter() {
        let raw = object
            .get(name)
            .ok_or_else(|| DecodeError::MissingAggregation(name.clone()))?;
        decoded.insert(name.clone(), decode_one(name, raw, spec)?);
    }
    Ok(DecodedAggs(decoded))
}

fn decode_one(name: &str, raw: &Value, spec: &AggSpec) -> Result<DecodedAgg, DecodeError> {
    if !raw.is_object() {
        return Err(malformed(name, "expected an object"));
    }
    match spec {
        AggSpec::Sum(_) | AggSpec::Avg(_) | AggSpec::ScriptedSum(_) | AggSpec::ScriptedAvg(_) => {
            Ok(DecodedAgg::Value(raw.get("value").and_then(Value::as_f64)))
        }
        AggSpec::Cardinality(_) => raw
            .get("value")
            .and_then(as_count)
            .map(DecodedAgg::Count)
            .ok_or_else(|| malformed(name, "cardinality has no numeric value")),
        AggSpec::FilteredCount(_) => raw
            .get("doc_count")
            .and_then(as_count)
            .map(DecodedAgg::Count)
            .ok_or_else(|| malformed(name, "filter has no doc_count")),
        AggSpec::Stats(_) => Ok(DecodedAgg::Stats(StatsValue {
            count: raw.get("count").and_then(as_count).unwrap_or(0),
            min: raw.get("min").and_then(Value::as_f64),
            max: raw.get("max").and_then(Value::as_f64),
            avg: raw.get("avg").and_then(Value::as_f64),
            sum: raw.get("sum").and_then(Value::as_f64).unwrap_or(0.0),
        })),
        AggSpec::Terms(terms) => {
            let mut buckets = decode_buckets(name, raw, &terms.sub)?;
            match terms.order {
                TermsOrder::CountDesc => buckets.sort_by(|a, b| {
                    b.doc_count
                        .cmp(&a.doc_count)
                        .then_with(|| compare_keys(a, b))
                }),
                TermsOrder::KeyAsc => buckets.sort_by(compare_keys),
            }
            Ok(DecodedAgg::Buckets(BucketList {
                buckets,
                other_doc_count: raw
                    .get("sum_other_doc_count")
                    .and_then(as_count)
                    .unwrap_or(0),
                requested_size: Some(terms.size),
            }))
        }
        AggSpec::DateHistogram(histogram) => {
            let mut buckets = decode_buckets(name, raw, &histogram.sub)?;
            buckets.sort_by(compare_keys);
            Ok(DecodedAgg::Buckets(BucketList {
                buckets,
                other_doc_count: 0,
                requested_size: None,
            }))
        }
    }
}

fn decode_buckets(name: &str, raw: &Value, sub: &Aggregations) -> Result<Vec<Bucket>, DecodeError> {
    let Some(items) = raw.get("buckets").and_then(Value::as_array) else {
        return Err(malformed(name, "missing buckets array"));
    };

    items
        .iter()
        .map(|item| {
            let (key, numeric_key) = match item.get("key") {
                Some(Value::String(s)) => (s.clone(), None),
                Some(Value::Number(n)) => (n.to_string(), n.as_f64()),
                Some(Value::Bool(b)) => (b.to_string(), None),
                _ => return Err(malformed(name, "bucket without key")),
            };
            let key = item
                .get("key_as_string")
                .and_then(Value::as_str)
                .map_or(key, str::to_string);
            let doc_count = item
                .get("doc_count")
                .and_then(as_count)
                .ok_or_else(|| malformed(name, "bucket without doc_count"))?;
            Ok(Bucket {
                key,
                numeric_key,
                doc_count,
                sub: decode(item, sub)?,
            })
        })
        .collect()
}

fn compare_keys(a: &Bucket, b: &Bucket) -> Ordering {
    match (a.numeric_key, b.numeric_key) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.key.cmp(&b.key),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|f| f.max(0.0).round() as u64))
}

fn malformed(name: &str, message: &str) -> DecodeError {
    DecodeError::Malformed {
        name: name.to_string(),
        message: message.to_string(),
    }
}
