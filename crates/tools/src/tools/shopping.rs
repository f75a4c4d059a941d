//! Shopping analytics tools over customer transactions.

use chrono::NaiveDate;
use retail_agents_core::aggregation::{
    AggSpec, Bucket, CalendarInterval, DateHistogramAgg, TermsAgg,
};
use retail_agents_core::classify::{percentage_share, round1, round2, safe_ratio};
use retail_agents_core::fields::ShoppingFields;
use retail_agents_core::query::{
    Clause, MultiMatch, QueryRequest, RangeBounds, Script, SortClause, SortOrder,
    product_expression,
};
use retail_agents_core::{HitRecord, ResultEnvelope, ValidationError};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ToolError;
use crate::search::SearchBackend;

use super::{
    RetailTools, Tool, ToolOutput, clamp_size, finish, number_json, optional_text, require_text,
};

const DOMAIN: &str = "shopping";

/// Get all shopping analytics tools (7 total).
#[must_use]
pub fn shopping_tools() -> Vec<Tool> {
    vec![
        search_shopping_data_by_category_tool(),
        get_customer_purchase_history_tool(),
        analyze_shopping_trends_by_gender_tool(),
        get_high_value_transactions_tool(),
        analyze_shopping_mall_performance_tool(),
        get_payment_method_analytics_tool(),
        search_transactions_by_date_range_tool(),
    ]
}

// =============================================================================
// Tool Definitions
// =============================================================================

fn search_shopping_data_by_category_tool() -> Tool {
    Tool {
        name: "search_shopping_data_by_category".to_string(),
        description: "Search transactions in a product category (typo tolerant) with spending \
            analytics: total spending, average price, quantity, malls, payment methods and \
            gender split."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "e.g. 'Clothing', 'Shoes', 'Technology'" },
                "size": { "type": "integer", "description": "Transactions listed (default 20)", "minimum": 1, "maximum": 500 }
            },
            "required": ["category"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_customer_purchase_history_tool() -> Tool {
    Tool {
        name: "get_customer_purchase_history".to_string(),
        description: "Purchase history of one customer, newest first, with total spent, items \
            bought and category, mall and payment preferences."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "customer_id": { "type": "string", "description": "Customer ID, e.g. 'C241288'" },
                "size": { "type": "integer", "description": "Transactions listed (default 50)", "minimum": 1, "maximum": 500 }
            },
            "required": ["customer_id"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn analyze_shopping_trends_by_gender_tool() -> Tool {
    Tool {
        name: "analyze_shopping_trends_by_gender".to_string(),
        description: "Shopping trends for a gender: category preferences with average price and \
            quantity, payment and mall preferences, average age and total spending."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "gender": { "type": "string", "description": "'Male' or 'Female'" },
                "size": { "type": "integer", "description": "Sample size (default 100)", "minimum": 1, "maximum": 500 }
            },
            "required": ["gender"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_high_value_transactions_tool() -> Tool {
    Tool {
        name: "get_high_value_transactions".to_string(),
        description: "Transactions whose total (price x quantity) is at least min_amount, \
            largest first."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "min_amount": { "type": "number", "description": "Minimum transaction total", "minimum": 0 },
                "size": { "type": "integer", "description": "Transactions listed (default 20)", "minimum": 1, "maximum": 500 }
            },
            "required": ["min_amount"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn analyze_shopping_mall_performance_tool() -> Tool {
    Tool {
        name: "analyze_shopping_mall_performance".to_string(),
        description: "Revenue, transaction count, average transaction, customer age, top \
            categories and payment methods per shopping mall, highest revenue first. Omit \
            shopping_mall to compare all malls."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "shopping_mall": { "type": "string", "description": "e.g. 'Kanyon'" },
                "size": { "type": "integer", "description": "Max malls (default 20)", "minimum": 1, "maximum": 500 }
            }
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_payment_method_analytics_tool() -> Tool {
    Tool {
        name: "get_payment_method_analytics".to_string(),
        description: "Usage and revenue per payment method with percentage shares, gender split \
            and customer age statistics."
            .to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_transactions_by_date_range_tool() -> Tool {
    Tool {
        name: "search_transactions_by_date_range".to_string(),
        description: "Transactions between two dates (inclusive) with total revenue, top \
            categories and daily sales."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "start_date": { "type": "string", "description": "YYYY-MM-DD or DD/MM/YYYY" },
                "end_date": { "type": "string", "description": "YYYY-MM-DD or DD/MM/YYYY" },
                "size": { "type": "integer", "description": "Transactions listed (default 50)", "minimum": 1, "maximum": 500 }
            },
            "required": ["start_date", "end_date"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Input of `search_shopping_data_by_category`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShoppingCategoryParams {
    pub category: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_customer_purchase_history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerHistoryParams {
    pub customer_id: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `analyze_shopping_trends_by_gender`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenderTrendsParams {
    pub gender: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_high_value_transactions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HighValueParams {
    pub min_amount: f64,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `analyze_shopping_mall_performance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MallPerformanceParams {
    #[serde(default)]
    pub shopping_mall: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_payment_method_analytics` (none).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentAnalyticsParams {}

/// Input of `search_transactions_by_date_range`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub size: Option<i64>,
}

// =============================================================================
// Operations
// =============================================================================

impl<B: SearchBackend> RetailTools<B> {
    /// Category transactions with spending analytics.
    #[instrument(skip(self, params), fields(tool = "search_shopping_data_by_category"))]
    pub async fn search_shopping_data_by_category(
        &self,
        params: ShoppingCategoryParams,
    ) -> ResultEnvelope {
        finish(
            "search_shopping_data_by_category",
            self.shopping_by_category(params).await,
        )
    }

    /// One customer's purchases.
    #[instrument(skip(self, params), fields(tool = "get_customer_purchase_history"))]
    pub async fn get_customer_purchase_history(
        &self,
        params: CustomerHistoryParams,
    ) -> ResultEnvelope {
        finish(
            "get_customer_purchase_history",
            self.purchase_history(params).await,
        )
    }

    /// Gender-level shopping trends.
    #[instrument(skip(self, params), fields(tool = "analyze_shopping_trends_by_gender"))]
    pub async fn analyze_shopping_trends_by_gender(
        &self,
        params: GenderTrendsParams,
    ) -> ResultEnvelope {
        finish(
            "analyze_shopping_trends_by_gender",
            self.gender_trends(params).await,
        )
    }

    /// Transactions above an amount.
    #[instrument(skip(self, params), fields(tool = "get_high_value_transactions"))]
    pub async fn get_high_value_transactions(&self, params: HighValueParams) -> ResultEnvelope {
        finish(
            "get_high_value_transactions",
            self.high_value_transactions(params).await,
        )
    }

    /// Per-mall performance.
    #[instrument(skip(self, params), fields(tool = "analyze_shopping_mall_performance"))]
    pub async fn analyze_shopping_mall_performance(
        &self,
        params: MallPerformanceParams,
    ) -> ResultEnvelope {
        finish(
            "analyze_shopping_mall_performance",
            self.mall_performance(params).await,
        )
    }

    /// Per-payment-method usage and revenue.
    #[instrument(skip(self, _params), fields(tool = "get_payment_method_analytics"))]
    pub async fn get_payment_method_analytics(
        &self,
        _params: PaymentAnalyticsParams,
    ) -> ResultEnvelope {
        finish(
            "get_payment_method_analytics",
            self.payment_analytics().await,
        )
    }

    /// Transactions in a date range.
    #[instrument(skip(self, params), fields(tool = "search_transactions_by_date_range"))]
    pub async fn search_transactions_by_date_range(
        &self,
        params: DateRangeParams,
    ) -> ResultEnvelope {
        finish(
            "search_transactions_by_date_range",
            self.transactions_by_date(params).await,
        )
    }

    async fn shopping_by_category(
        &self,
        params: ShoppingCategoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let category = require_text(&params.category, "category")?;

        let request = QueryRequest::new(&self.settings.indices.shopping)
            .must(MultiMatch::new(category.as_str(), [f.category.as_str()]).fuzzy())
            .aggregate("total_spending", AggSpec::scripted_sum(&f.price, &f.quantity))
            .aggregate("avg_price", AggSpec::avg(&f.price))
            .aggregate("total_quantity", AggSpec::sum(&f.quantity))
            .aggregate("malls", AggSpec::terms(&f.shopping_mall, 20))
            .aggregate("payment_methods", AggSpec::terms(&f.payment_method, 10))
            .aggregate("genders", AggSpec::terms(&f.gender, 5))
            .size(clamp_size(params.size, 20));

        let (result, aggs) = self.run(&request).await?;
        let malls = bucket_keys(aggs.bucket_slice("malls"));

        Ok(json!({
            "category": category,
            "total_results": result.total,
            "results_shown": result.hits.len(),
            "analytics": {
                "total_spending": round2(aggs.value("total_spending")),
                "average_price": round2(aggs.value("avg_price")),
                "total_quantity": number_json(aggs.value("total_quantity")),
                "unique_malls": malls.len(),
                "malls": malls,
                "payment_methods": bucket_keys(aggs.bucket_slice("payment_methods")),
                "gender_distribution": bucket_counts(aggs.bucket_slice("genders"), "gender", "count"),
            },
            "transactions": result.hits.iter().map(|hit| transaction_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn purchase_history(
        &self,
        params: CustomerHistoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let customer_id = require_text(&params.customer_id, "customer_id")?;

        let request = QueryRequest::new(&self.settings.indices.shopping)
            .filter(Clause::term(&f.customer_id, customer_id.as_str()))
            .sort(SortClause::field(&f.invoice_date, SortOrder::Desc))
            .aggregate("total_spent", AggSpec::scripted_sum(&f.price, &f.quantity))
            .aggregate("total_items", AggSpec::sum(&f.quantity))
            .aggregate("categories", AggSpec::terms(&f.category, 20))
            .aggregate("malls", AggSpec::terms(&f.shopping_mall, 20))
            .aggregate("payment_methods", AggSpec::terms(&f.payment_method, 10))
            .size(clamp_size(params.size, 50));

        let (result, aggs) = self.run(&request).await?;
        let Some(latest) = result.hits.first() else {
            return Ok(json!({
                "customer_id": customer_id,
                "total_purchases": 0,
                "message": "No purchase history found for this customer",
            })
            .into());
        };

        #[allow(clippy::cast_precision_loss)]
        let purchases = result.total as f64;
        let total_spent = aggs.value("total_spent");
        let total_items = aggs.value("total_items");

        Ok(json!({
            "customer_id": customer_id,
            "total_purchases": result.total,
            "purchases_shown": result.hits.len(),
            "customer_profile": {
                "gender": latest.value(&f.gender),
                "age": latest.value(&f.age),
            },
            "spending_analytics": {
                "total_spent": round2(total_spent),
                "average_transaction": round2(safe_ratio(total_spent, purchases)),
                "total_items_purchased": number_json(total_items),
                "average_items_per_transaction": round2(safe_ratio(total_items, purchases)),
            },
            "preferences": {
                "favorite_categories": bucket_counts(aggs.bucket_slice("categories"), "category", "count"),
                "favorite_malls": bucket_counts(aggs.bucket_slice("malls"), "mall", "count"),
                "payment_methods": bucket_counts(aggs.bucket_slice("payment_methods"), "payment_method", "count"),
            },
            "purchase_history": result.hits.iter().map(|hit| transaction_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }

    async fn gender_trends(&self, params: GenderTrendsParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let gender = require_text(&params.gender, "gender")?;

        let request = QueryRequest::new(&self.settings.indices.shopping)
            .filter(Clause::term(&f.gender, gender.as_str()))
            .aggregate(
                "categories",
                TermsAgg::new(&f.category, 20)
                    .sub("avg_price", AggSpec::avg(&f.price))
                    .sub("total_quantity", AggSpec::sum(&f.quantity))
                    .into(),
            )
            .aggregate("payment_methods", AggSpec::terms(&f.payment_method, 10))
            .aggregate("shopping_malls", AggSpec::terms(&f.shopping_mall, 20))
            .aggregate("avg_age", AggSpec::avg(&f.age))
            .aggregate("avg_price", AggSpec::avg(&f.price))
            .aggregate("total_spent", AggSpec::scripted_sum(&f.price, &f.quantity))
            .size(clamp_size(params.size, 100));

        let (result, aggs) = self.run(&request).await?;
        let categories: Vec<Value> = aggs
            .bucket_slice("categories")
            .iter()
            .map(|b| {
                json!({
                    "category": b.key,
                    "purchase_count": b.doc_count,
                    "avg_price": round2(b.sub.value("avg_price")),
                    "total_quantity": number_json(b.sub.value("total_quantity")),
                })
            })
            .collect();

        Ok(json!({
            "gender": gender,
            "total_transactions": result.total,
            "sample_size": result.hits.len(),
            "demographics": { "average_age": round1(aggs.value("avg_age")) },
            "spending_patterns": {
                "average_price": round2(aggs.value("avg_price")),
                "total_spending": round2(aggs.value("total_spent")),
            },
            "category_preferences": categories,
            "payment_preferences": bucket_counts(aggs.bucket_slice("payment_methods"), "payment_method", "usage_count"),
            "shopping_mall_preferences": bucket_counts(aggs.bucket_slice("shopping_malls"), "mall", "visit_count"),
        })
        .into())
    }

    async fn high_value_transactions(
        &self,
        params: HighValueParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let min_amount = params.min_amount;
        if !min_amount.is_finite() || min_amount < 0.0 {
            return Err(ValidationError::new("min_amount", "must be a non-negative number").into());
        }

        let amount = product_expression(&f.price, &f.quantity);
        let request = QueryRequest::new(&self.settings.indices.shopping)
            .filter(
                Script::new(format!("{amount} >= params.min_amount")).param("min_amount", min_amount),
            )
            .sort(SortClause::Script {
                script: Script::new(amount),
                order: SortOrder::Desc,
            })
            .aggregate("total_value", AggSpec::scripted_sum(&f.price, &f.quantity))
            .aggregate("average_value", AggSpec::scripted_avg(&f.price, &f.quantity))
            .size(clamp_size(params.size, 20));

        let (result, aggs) = self.run(&request).await?;
        let transactions: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| transaction_record(hit, f))
            .collect();
        let highest = transactions
            .first()
            .and_then(|t| t["total"].as_f64())
            .unwrap_or(0.0);

        Ok(json!({
            "threshold": number_json(min_amount),
            "total_matching": result.total,
            "transactions_shown": transactions.len(),
            "analytics": {
                "total_value": round2(aggs.value("total_value")),
                "average_value": round2(aggs.value("average_value")),
                "highest_transaction": round2(highest),
            },
            "transactions": transactions,
        })
        .into())
    }

    async fn mall_performance(
        &self,
        params: MallPerformanceParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let mall = optional_text(params.shopping_mall.as_ref());

        let request = QueryRequest::new(&self.settings.indices.shopping)
            .filter_opt(mall.as_deref().map(|m| Clause::term(&f.shopping_mall, m)))
            .aggregate(
                "malls",
                TermsAgg::new(&f.shopping_mall, clamp_size(params.size, 20))
                    .sub("revenue", AggSpec::scripted_sum(&f.price, &f.quantity))
                    .sub("avg_transaction", AggSpec::scripted_avg(&f.price, &f.quantity))
                    .sub("categories", AggSpec::terms(&f.category, 10))
                    .sub("payment_methods", AggSpec::terms(&f.payment_method, 5))
                    .sub("avg_customer_age", AggSpec::avg(&f.age))
                    .into(),
            )
            .size(0);

        let (_, aggs) = self.run(&request).await?;
        let mut malls: Vec<&Bucket> = aggs.bucket_slice("malls").iter().collect();
        malls.sort_by(|a, b| {
            b.sub
                .value("revenue")
                .total_cmp(&a.sub.value("revenue"))
                .then_with(|| a.key.cmp(&b.key))
        });

        let total_revenue: f64 = malls.iter().map(|b| b.sub.value("revenue")).sum();
        let total_transactions: u64 = malls.iter().map(|b| b.doc_count).sum();
        let performance: Vec<Value> = malls
            .iter()
            .map(|b| {
                json!({
                    "mall_name": b.key,
                    "total_transactions": b.doc_count,
                    "total_revenue": round2(b.sub.value("revenue")),
                    "average_transaction_value": round2(b.sub.value("avg_transaction")),
                    "average_customer_age": round1(b.sub.value("avg_customer_age")),
                    "top_categories": bucket_counts(
                        b.sub.bucket_slice("categories").get(..5).unwrap_or(b.sub.bucket_slice("categories")),
                        "category",
                        "count",
                    ),
                    "payment_methods": bucket_counts(b.sub.bucket_slice("payment_methods"), "method", "count"),
                })
            })
            .collect();

        Ok(json!({
            "analysis_type": if mall.is_some() { "specific_mall" } else { "all_malls" },
            "mall_filter": mall,
            "total_malls_analyzed": performance.len(),
            "mall_performance": performance,
            "summary": {
                "highest_revenue_mall": malls.first().map(|b| b.key.clone()),
                "total_combined_revenue": round2(total_revenue),
                "total_transactions": total_transactions,
            },
        })
        .into())
    }

    async fn payment_analytics(&self) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let request = QueryRequest::new(&self.settings.indices.shopping)
            .aggregate(
                "payment_methods",
                TermsAgg::new(&f.payment_method, 10)
                    .sub("total_revenue", AggSpec::scripted_sum(&f.price, &f.quantity))
                    .sub("avg_transaction", AggSpec::scripted_avg(&f.price, &f.quantity))
                    .sub("gender_distribution", AggSpec::terms(&f.gender, 5))
                    .sub("age_stats", AggSpec::stats(&f.age))
                    .into(),
            )
            .size(0);

        let (_, aggs) = self.run(&request).await?;
        let methods = aggs.bucket_slice("payment_methods");
        let total_transactions: u64 = methods.iter().map(|b| b.doc_count).sum();
        let total_revenue: f64 = methods.iter().map(|b| b.sub.value("total_revenue")).sum();
        #[allow(clippy::cast_precision_loss)]
        let transactions_whole = total_transactions as f64;

        let analytics: Vec<Value> = methods
            .iter()
            .map(|b| {
                let revenue = b.sub.value("total_revenue");
                let age = b.sub.stats("age_stats").copied().unwrap_or_default();
                #[allow(clippy::cast_precision_loss)]
                let count = b.doc_count as f64;
                json!({
                    "payment_method": b.key,
                    "transaction_count": b.doc_count,
                    "total_revenue": round2(revenue),
                    "average_transaction_value": round2(b.sub.value("avg_transaction")),
                    "usage_percentage": percentage_share(count, transactions_whole),
                    "revenue_percentage": percentage_share(revenue, total_revenue),
                    "gender_distribution": bucket_counts(b.sub.bucket_slice("gender_distribution"), "gender", "count"),
                    "customer_age_stats": {
                        "average": age.avg.map(round1),
                        "min": age.min,
                        "max": age.max,
                    },
                })
            })
            .collect();

        let highest_revenue = methods
            .iter()
            .max_by(|a, b| a.sub.value("total_revenue").total_cmp(&b.sub.value("total_revenue")))
            .map(|b| b.key.clone());

        Ok(json!({
            "total_transactions_analyzed": total_transactions,
            "total_revenue": round2(total_revenue),
            "payment_methods_count": analytics.len(),
            "payment_method_analytics": analytics,
            "most_popular_method": methods.first().map(|b| b.key.clone()),
            "highest_revenue_method": highest_revenue,
        })
        .into())
    }

    async fn transactions_by_date(&self, params: DateRangeParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.shopping;
        let start = parse_date(&params.start_date, "start_date")?;
        let end = parse_date(&params.end_date, "end_date")?;
        if start > end {
            return Err(ValidationError::new(
                "start_date",
                format!("{start} is after end_date {end}"),
            )
            .into());
        }

        let pattern = chrono_pattern(&f.invoice_date_format);
        let bounds = RangeBounds::between(
            Some(format_date(start, &pattern)?),
            Some(format_date(end, &pattern)?),
        )
        .with_format(&f.invoice_date_format);

        let request = QueryRequest::new(&self.settings.indices.shopping)
            .filter(Clause::range(&f.invoice_date, bounds)?)
            .sort(SortClause::field(&f.invoice_date, SortOrder::Desc))
            .aggregate("total_revenue", AggSpec::scripted_sum(&f.price, &f.quantity))
            .aggregate("categories", AggSpec::terms(&f.category, 10))
            .aggregate(
                "daily",
                DateHistogramAgg::new(&f.invoice_date, CalendarInterval::Day)
                    .format(&f.invoice_date_format)
                    .sub("revenue", AggSpec::scripted_sum(&f.price, &f.quantity))
                    .into(),
            )
            .size(clamp_size(params.size, 50));

        let (result, aggs) = self.run(&request).await?;
        let total_revenue = aggs.value("total_revenue");
        #[allow(clippy::cast_precision_loss)]
        let transactions = result.total as f64;
        let daily: Vec<Value> = aggs
            .bucket_slice("daily")
            .iter()
            .filter(|b| b.doc_count > 0)
            .map(|b| {
                json!({
                    "date": b.key,
                    "transaction_count": b.doc_count,
                    "revenue": round2(b.sub.value("revenue")),
                })
            })
            .collect();

        Ok(json!({
            "date_range": {
                "start": params.start_date.trim(),
                "end": params.end_date.trim(),
            },
            "total_transactions": result.total,
            "transactions_shown": result.hits.len(),
            "analytics": {
                "total_revenue": round2(total_revenue),
                "average_transaction": round2(safe_ratio(total_revenue, transactions)),
                "top_categories": bucket_counts(aggs.bucket_slice("categories"), "category", "count"),
                "daily_sales": daily,
            },
            "transactions": result.hits.iter().map(|hit| transaction_record(hit, f)).collect::<Vec<_>>(),
        })
        .into())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn transaction_record(hit: &HitRecord, f: &ShoppingFields) -> Value {
    let price = hit.number(&f.price);
    let quantity = hit.number_or(&f.quantity, 1.0);
    json!({
        "invoice_no": hit.value(&f.invoice_no),
        "customer_id": hit.value(&f.customer_id),
        "gender": hit.value(&f.gender),
        "age": hit.value(&f.age),
        "date": hit.value(&f.invoice_date),
        "category": hit.value(&f.category),
        "quantity": number_json(quantity),
        "price": number_json(price),
        "total": round2(price * quantity),
        "payment_method": hit.value(&f.payment_method),
        "shopping_mall": hit.value(&f.shopping_mall),
    })
}

fn bucket_keys(buckets: &[Bucket]) -> Vec<String> {
    buckets.iter().map(|b| b.key.clone()).collect()
}

fn bucket_counts(buckets: &[Bucket], key_name: &str, count_name: &str) -> Vec<Value> {
    buckets
        .iter()
        .map(|b| json!({ key_name: b.key, count_name: b.doc_count }))
        .collect()
}

/// Accept `YYYY-MM-DD` or `DD/MM/YYYY`.
fn parse_date(raw: &str, parameter: &str) -> Result<NaiveDate, ValidationError> {
    let raw = require_text(raw, parameter)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&raw, "%d/%m/%Y"))
        .map_err(|_| {
            ValidationError::new(
                parameter,
                format!("'{raw}' is not a YYYY-MM-DD or DD/MM/YYYY date"),
            )
        })
}

fn format_date(date: NaiveDate, pattern: &str) -> Result<String, ValidationError> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).map_err(|_| {
        ValidationError::new(
            "invoice_date_format",
            format!("unsupported date format '{pattern}'"),
        )
    })?;
    Ok(out)
}

/// Translate an index date format (`dd/MM/yyyy` style) to a chrono pattern.
fn chrono_pattern(index_format: &str) -> String {
    index_format
        .replace("yyyy", "%Y")
        .replace("MM", "%m")
        .replace("dd", "%d")
}
