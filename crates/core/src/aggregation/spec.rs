//! Aggregation requests.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::query::{Clause, Script, product_expression};

/// One named aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum AggSpec {
    /// Sum of a numeric field.
    Sum(String),
    /// Mean of a numeric field.
    Avg(String),
    /// Approximate distinct count of a field.
    Cardinality(String),
    /// count/min/max/avg/sum of a numeric field.
    Stats(String),
    /// One bucket per distinct value.
    Terms(TermsAgg),
    /// One bucket per calendar period.
    DateHistogram(DateHistogramAgg),
    /// Number of documents matching a clause.
    FilteredCount(Box<Clause>),
    /// Σ(a × b) over matching documents.
    ScriptedSum(FieldProduct),
    /// Mean of a × b over matching documents.
    ScriptedAvg(FieldProduct),
}

impl AggSpec {
    /// Sum of `field`.
    #[must_use]
    pub fn sum(field: impl Into<String>) -> Self {
        Self::Sum(field.into())
    }

    /// Average of `field`.
    #[must_use]
    pub fn avg(field: impl Into<String>) -> Self {
        Self::Avg(field.into())
    }

    /// Distinct count of `field`.
    #[must_use]
    pub fn cardinality(field: impl Into<String>) -> Self {
        Self::Cardinality(field.into())
    }

    /// Stats over `field`.
    #[must_use]
    pub fn stats(field: impl Into<String>) -> Self {
        Self::Stats(field.into())
    }

    /// Top `size` values of `field` by document count.
    #[must_use]
    pub fn terms(field: impl Into<String>, size: usize) -> Self {
        Self::Terms(TermsAgg::new(field, size))
    }

    /// Documents matching `clause`.
    #[must_use]
    pub fn filtered_count(clause: Clause) -> Self {
        Self::FilteredCount(Box::new(clause))
    }

    /// Σ(left × right).
    #[must_use]
    pub fn scripted_sum(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::ScriptedSum(FieldProduct::new(left, right))
    }

    /// Mean of left × right.
    #[must_use]
    pub fn scripted_avg(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::ScriptedAvg(FieldProduct::new(left, right))
    }

    /// Render as an `aggs` entry.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Sum(field) => json!({ "sum": { "field": field } }),
            Self::Avg(field) => json!({ "avg": { "field": field } }),
            Self::Cardinality(field) => json!({ "cardinality": { "field": field } }),
            Self::Stats(field) => json!({ "stats": { "field": field } }),
            Self::Terms(terms) => terms.to_json(),
            Self::DateHistogram(histogram) => histogram.to_json(),
            Self::FilteredCount(clause) => json!({ "filter": clause.to_json() }),
            Self::ScriptedSum(product) => {
                json!({ "sum": { "script": product.script().to_json() } })
            }
            Self::ScriptedAvg(product) => {
                json!({ "avg": { "script": product.script().to_json() } })
            }
        }
    }
}

impl From<TermsAgg> for AggSpec {
    fn from(value: TermsAgg) -> Self {
        Self::Terms(value)
    }
}

impl From<DateHistogramAgg> for AggSpec {
    fn from(value: DateHistogramAgg) -> Self {
        Self::DateHistogram(value)
    }
}

/// Two numeric fields multiplied per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProduct {
    /// First factor.
    pub left: String,
    /// Second factor.
    pub right: String,
}

impl FieldProduct {
    /// `left × right`.
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Painless script computing the product.
    #[must_use]
    pub fn script(&self) -> Script {
        Script::new(product_expression(&self.left, &self.right))
    }
}

/// Bucket ordering for a terms aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermsOrder {
    /// Most documents first, ties by key ascending.
    #[default]
    CountDesc,
    /// Key ascending.
    KeyAsc,
}

/// Terms aggregation with optional sub-aggregations.
#[derive(Debug, Clone, PartialEq)]
pub struct TermsAgg {
    /// Bucketed field.
    pub field: String,
    /// Maximum buckets returned.
    pub size: usize,
    /// Bucket order.
    pub order: TermsOrder,
    /// Evaluated once per bucket.
    pub sub: Aggregations,
}

impl TermsAgg {
    /// Top `size` values of `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, size: usize) -> Self {
        Self {
            field: field.into(),
            size,
            order: TermsOrder::CountDesc,
            sub: Aggregations::new(),
        }
    }

    /// Set bucket order.
    #[must_use]
    pub const fn order(mut self, order: TermsOrder) -> Self {
        self.order = order;
        self
    }

    /// Add a per-bucket sub-aggregation.
    #[must_use]
    pub fn sub(mut self, name: impl Into<String>, spec: AggSpec) -> Self {
        self.sub.insert(name, spec);
        self
    }

    fn to_json(&self) -> Value {
        let mut terms = Map::new();
        terms.insert("field".to_string(), Value::String(self.field.clone()));
        terms.insert("size".to_string(), Value::from(self.size));
        if self.order == TermsOrder::KeyAsc {
            terms.insert("order".to_string(), json!({ "_key": "asc" }));
        }
        let mut body = Map::new();
        body.insert("terms".to_string(), Value::Object(terms));
        if !self.sub.is_empty() {
            body.insert("aggs".to_string(), self.sub.to_json());
        }
        Value::Object(body)
    }
}

/// Calendar period of a date histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarInterval {
    /// One bucket per day.
    Day,
    /// One bucket per week.
    Week,
    /// One bucket per month.
    Month,
    /// One bucket per quarter.
    Quarter,
    /// One bucket per year.
    Year,
}

impl CalendarInterval {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

/// Date histogram with optional sub-aggregations.
#[derive(Debug, Clone, PartialEq)]
pub struct DateHistogramAgg {
    /// Date field.
    pub field: String,
    /// Bucket width.
    pub interval: CalendarInterval,
    /// Format of `key_as_string`; also how the field is parsed.
    pub format: Option<String>,
    /// Evaluated once per bucket.
    pub sub: Aggregations,
}

impl DateHistogramAgg {
    /// Histogram of `field` per `interval`.
    #[must_use]
    pub fn new(field: impl Into<String>, interval: CalendarInterval) -> Self {
        Self {
            field: field.into(),
            interval,
            format: None,
            sub: Aggregations::new(),
        }
    }

    /// Set the key format.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a per-bucket sub-aggregation.
    #[must_use]
    pub fn sub(mut self, name: impl Into<String>, spec: AggSpec) -> Self {
        self.sub.insert(name, spec);
        self
    }

    fn to_json(&self) -> Value {
        let mut histogram = Map::new();
        histogram.insert("field".to_string(), Value::String(self.field.clone()));
        histogram.insert(
            "calendar_interval".to_string(),
            Value::String(self.interval.as_str().to_string()),
        );
        if let Some(format) = &self.format {
            histogram.insert("format".to_string(), Value::String(format.clone()));
        }
        let mut body = Map::new();
        body.insert("date_histogram".to_string(), Value::Object(histogram));
        if !self.sub.is_empty() {
            body.insert("aggs".to_string(), self.sub.to_json());
        }
        Value::Object(body)
    }
}

/// Named aggregations, rendered in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations(BTreeMap<String, AggSpec>);

impl Aggregations {
    /// No aggregations.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, spec: AggSpec) {
        self.0.insert(name.into(), spec);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, spec: AggSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Look up a spec by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AggSpec> {
        self.0.get(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AggSpec)> {
        self.0.iter()
    }

    /// Number of aggregations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the `aggs` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, spec)| (name.clone(), spec.to_json()))
                .collect(),
        )
    }
}

/// Compose a request's `aggs` object from named specs.
#[must_use]
pub fn build_aggregations(specs: &Aggregations) -> Value {
    specs.to_json()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::RangeBounds;

    #[test]
    fn test_metric_aggregations() {
        assert_eq!(
            AggSpec::avg("Price").to_json(),
            json!({ "avg": { "field": "Price" } })
        );
        assert_eq!(
            AggSpec::cardinality("Store ID").to_json(),
            json!({ "cardinality": { "field": "Store ID" } })
        );
        assert_eq!(
            AggSpec::stats("age").to_json(),
            json!({ "stats": { "field": "age" } })
        );
    }

    #[test]
    fn test_scripted_sum_multiplies_fields() {
        assert_eq!(
            AggSpec::scripted_sum("price", "quantity").to_json(),
            json!({
                "sum": { "script": { "source": "doc['price'].value * doc['quantity'].value" } }
            })
        );
    }

    #[test]
    fn test_terms_with_sub_aggregations() {
        let spec: AggSpec = TermsAgg::new("category", 20)
            .sub("avg_price", AggSpec::avg("price"))
            .sub("total_quantity", AggSpec::sum("quantity"))
            .into();
        let body = spec.to_json();

        assert_eq!(body["terms"], json!({ "field": "category", "size": 20 }));
        assert_eq!(body["aggs"]["avg_price"], json!({ "avg": { "field": "price" } }));
        assert_eq!(
            body["aggs"]["total_quantity"],
            json!({ "sum": { "field": "quantity" } })
        );
    }

    #[test]
    fn test_terms_key_order() {
        let spec: AggSpec = TermsAgg::new("invoice_date", 365)
            .order(TermsOrder::KeyAsc)
            .into();
        assert_eq!(spec.to_json()["terms"]["order"], json!({ "_key": "asc" }));
    }

    #[test]
    fn test_date_histogram() {
        let spec: AggSpec = DateHistogramAgg::new("modified", CalendarInterval::Month)
            .format("yyyy-MM")
            .into();
        assert_eq!(
            spec.to_json(),
            json!({
                "date_histogram": {
                    "field": "modified",
                    "calendar_interval": "month",
                    "format": "yyyy-MM"
                }
            })
        );
    }

    #[test]
    fn test_filtered_count() {
        let clause = Clause::range("Inventory Level", RangeBounds::at_most(10)).unwrap();
        assert_eq!(
            AggSpec::filtered_count(clause).to_json(),
            json!({ "filter": { "range": { "Inventory Level": { "lte": 10 } } } })
        );
    }

    #[test]
    fn test_build_aggregations_keys_by_name() {
        let specs = Aggregations::new()
            .with("total_sold", AggSpec::sum("Units Sold"))
            .with("stores", AggSpec::cardinality("Store ID"));
        let body = build_aggregations(&specs);
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["stores", "total_sold"]);
    }
}
