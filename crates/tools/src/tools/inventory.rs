//! Inventory tools: stock levels, alerts, demand forecasts.

use retail_agents_core::ResultEnvelope;
use retail_agents_core::aggregation::{AggSpec, TermsAgg};
use retail_agents_core::classify::{AlertSeverity, Readiness, StockStatus, restock_need, round2};
use retail_agents_core::fields::InventoryFields;
use retail_agents_core::query::{
    Clause, MultiMatch, QueryRequest, RangeBounds, SortClause, SortOrder,
};
use retail_agents_core::{HitRecord, ValidationError};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ToolError;
use crate::search::SearchBackend;

use super::{
    RetailTools, Tool, ToolOutput, clamp_size, finish, hit_number, number_json, optional_text,
    require_text,
};

const DOMAIN: &str = "inventory";

/// Get all inventory tools (7 total).
#[must_use]
pub fn inventory_tools() -> Vec<Tool> {
    vec![
        check_product_inventory_tool(),
        search_inventory_by_category_tool(),
        get_low_stock_alerts_tool(),
        get_inventory_by_region_tool(),
        check_demand_forecast_tool(),
        get_seasonal_inventory_analysis_tool(),
        get_inventory_statistics_tool(),
    ]
}

// =============================================================================
// Tool Definitions
// =============================================================================

fn check_product_inventory_tool() -> Tool {
    Tool {
        name: "check_product_inventory".to_string(),
        description: "Check current inventory for a product across stores. Returns total units, \
            stock status (out_of_stock, low_stock, moderate_stock, in_stock) and a per-store \
            listing. USE THIS for questions like 'is product P0001 in stock?'"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_id": { "type": "string", "description": "Product ID, e.g. 'P0001'" },
                "store_id": { "type": "string", "description": "Limit to one store, e.g. 'S001'" },
                "region": { "type": "string", "description": "Limit to a region (North, South, East, West)" }
            },
            "required": ["product_id"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn search_inventory_by_category_tool() -> Tool {
    Tool {
        name: "search_inventory_by_category".to_string(),
        description: "Search inventory records by product category, optionally limited to a \
            region and an inventory level range. Returns matching records and total units."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Category, e.g. 'Groceries'" },
                "region": { "type": "string" },
                "min_inventory": { "type": "integer", "minimum": 0 },
                "max_inventory": { "type": "integer", "minimum": 0 },
                "size": { "type": "integer", "description": "Max records (default 50)", "minimum": 1, "maximum": 500 }
            },
            "required": ["category"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_low_stock_alerts_tool() -> Tool {
    Tool {
        name: "get_low_stock_alerts".to_string(),
        description: "List products at or below an inventory threshold, lowest first, each with \
            a severity (critical when out of stock, high at or below half the threshold, \
            medium otherwise). USE THIS for restocking priorities."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "threshold": { "type": "number", "description": "Inventory threshold (default: configured low stock threshold)", "minimum": 0 },
                "region": { "type": "string" },
                "category": { "type": "string" },
                "size": { "type": "integer", "description": "Max alerts (default 100)", "minimum": 1, "maximum": 500 }
            }
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_inventory_by_region_tool() -> Tool {
    Tool {
        name: "get_inventory_by_region".to_string(),
        description: "Summarize inventory in a region: total units, units sold, store count and \
            a per-category breakdown."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "region": { "type": "string", "description": "North, South, East or West" },
                "category": { "type": "string" },
                "size": { "type": "integer", "description": "Max records listed (default 100)", "minimum": 1, "maximum": 500 }
            },
            "required": ["region"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn check_demand_forecast_tool() -> Tool {
    Tool {
        name: "check_demand_forecast".to_string(),
        description: "Compare demand forecasts with current inventory and recommend restocking \
            where forecast exceeds stock. At least one of product_id, category or region is \
            required."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_id": { "type": "string" },
                "category": { "type": "string" },
                "region": { "type": "string" },
                "size": { "type": "integer", "description": "Max records (default 50)", "minimum": 1, "maximum": 500 }
            }
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_seasonal_inventory_analysis_tool() -> Tool {
    Tool {
        name: "get_seasonal_inventory_analysis".to_string(),
        description: "Analyze inventory readiness for a season: total inventory against total \
            forecast demand, overall and per category."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "seasonality": { "type": "string", "description": "Spring, Summer, Autumn or Winter" },
                "region": { "type": "string" },
                "size": { "type": "integer", "description": "Max records listed (default 100)", "minimum": 1, "maximum": 500 }
            },
            "required": ["seasonality"]
        }),
        domain: Some(DOMAIN.to_string()),
    }
}

fn get_inventory_statistics_tool() -> Tool {
    Tool {
        name: "get_inventory_statistics".to_string(),
        description: "Overall inventory statistics: totals, averages, store count, low and out \
            of stock counts, and category and region breakdowns."
            .to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
        domain: Some(DOMAIN.to_string()),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Input of `check_product_inventory`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInventoryParams {
    pub product_id: String,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Input of `search_inventory_by_category`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInventoryParams {
    pub category: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub min_inventory: Option<i64>,
    #[serde(default)]
    pub max_inventory: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_low_stock_alerts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LowStockParams {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_inventory_by_region`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionInventoryParams {
    pub region: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `check_demand_forecast`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemandForecastParams {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_seasonal_inventory_analysis`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonalAnalysisParams {
    pub seasonality: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Input of `get_inventory_statistics` (none).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryStatisticsParams {}

// =============================================================================
// Operations
// =============================================================================

impl<B: SearchBackend> RetailTools<B> {
    /// Stock of one product across locations.
    #[instrument(skip(self, params), fields(tool = "check_product_inventory", product_id = %params.product_id))]
    pub async fn check_product_inventory(&self, params: ProductInventoryParams) -> ResultEnvelope {
        finish("check_product_inventory", self.product_inventory(params).await)
    }

    /// Inventory records of a category.
    #[instrument(skip(self, params), fields(tool = "search_inventory_by_category"))]
    pub async fn search_inventory_by_category(
        &self,
        params: CategoryInventoryParams,
    ) -> ResultEnvelope {
        finish(
            "search_inventory_by_category",
            self.category_inventory(params).await,
        )
    }

    /// Records at or below a stock threshold.
    #[instrument(skip(self, params), fields(tool = "get_low_stock_alerts"))]
    pub async fn get_low_stock_alerts(&self, params: LowStockParams) -> ResultEnvelope {
        finish("get_low_stock_alerts", self.low_stock_alerts(params).await)
    }

    /// Regional inventory summary.
    #[instrument(skip(self, params), fields(tool = "get_inventory_by_region", region = %params.region))]
    pub async fn get_inventory_by_region(&self, params: RegionInventoryParams) -> ResultEnvelope {
        finish("get_inventory_by_region", self.region_inventory(params).await)
    }

    /// Forecast demand against stock.
    #[instrument(skip(self, params), fields(tool = "check_demand_forecast"))]
    pub async fn check_demand_forecast(&self, params: DemandForecastParams) -> ResultEnvelope {
        finish("check_demand_forecast", self.demand_forecast(params).await)
    }

    /// Seasonal readiness.
    #[instrument(skip(self, params), fields(tool = "get_seasonal_inventory_analysis"))]
    pub async fn get_seasonal_inventory_analysis(
        &self,
        params: SeasonalAnalysisParams,
    ) -> ResultEnvelope {
        finish(
            "get_seasonal_inventory_analysis",
            self.seasonal_analysis(params).await,
        )
    }

    /// Index-wide statistics.
    #[instrument(skip(self, _params), fields(tool = "get_inventory_statistics"))]
    pub async fn get_inventory_statistics(
        &self,
        _params: InventoryStatisticsParams,
    ) -> ResultEnvelope {
        finish("get_inventory_statistics", self.inventory_statistics().await)
    }

    async fn product_inventory(
        &self,
        params: ProductInventoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let product_id = require_text(&params.product_id, "product_id")?;
        let store_id = optional_text(params.store_id.as_ref());
        let region = optional_text(params.region.as_ref());

        let request = QueryRequest::new(&self.settings.indices.inventory)
            .filter(Clause::term(&f.product_id, product_id.as_str()))
            .filter_opt(store_id.as_deref().map(|s| Clause::term(&f.store_id, s)))
            .filter_opt(region.as_deref().map(|r| Clause::term(&f.region, r)))
            .aggregate("total_inventory", AggSpec::sum(&f.inventory_level))
            .size(100);

        let (result, aggs) = self.run(&request).await?;
        let filters_applied = json!({ "store_id": store_id, "region": region });

        if result.total == 0 {
            return Ok(json!({
                "product_id": product_id,
                "status": "not_found",
                "message": "No inventory records found for this product",
                "filters_applied": filters_applied,
            })
            .into());
        }

        let total_inventory = aggs.value("total_inventory");
        let status = StockStatus::classify(total_inventory, &self.settings.thresholds);
        let locations: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "store_id": hit.value(&f.store_id),
                    "region": hit.value(&f.region),
                    "category": hit.value(&f.category),
                    "inventory_level": hit_number(hit, &f.inventory_level),
                    "units_sold": hit_number(hit, &f.units_sold),
                    "units_ordered": hit_number(hit, &f.units_ordered),
                    "price": hit_number(hit, &f.price),
                    "discount": hit_number(hit, &f.discount),
                    "date": hit.value(&f.date),
                })
            })
            .collect();

        Ok(json!({
            "product_id": product_id,
            "total_inventory": number_json(total_inventory),
            "stock_status": status,
            "record_count": result.total,
            "location_count": locations.len(),
            "locations": locations,
            "filters_applied": filters_applied,
        })
        .into())
    }

    async fn category_inventory(
        &self,
        params: CategoryInventoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let category = require_text(&params.category, "category")?;
        let region = optional_text(params.region.as_ref());
        if let (Some(min), Some(max)) = (params.min_inventory, params.max_inventory) {
            if min > max {
                return Err(ValidationError::new(
                    "min_inventory",
                    format!("{min} exceeds max_inventory {max}"),
                )
                .into());
            }
        }
        let range = if params.min_inventory.is_some() || params.max_inventory.is_some() {
            Some(Clause::range(
                &f.inventory_level,
                RangeBounds::between(params.min_inventory, params.max_inventory),
            )?)
        } else {
            None
        };

        let request = QueryRequest::new(&self.settings.indices.inventory)
            .must(MultiMatch::new(category.as_str(), [f.category.as_str()]))
            .filter_opt(region.as_deref().map(|r| Clause::term(&f.region, r)))
            .filter_opt(range)
            .aggregate("total_inventory", AggSpec::sum(&f.inventory_level))
            .size(clamp_size(params.size, 50));

        let (result, aggs) = self.run(&request).await?;
        let products: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "product_id": hit.value(&f.product_id),
                    "store_id": hit.value(&f.store_id),
                    "category": hit.value(&f.category),
                    "region": hit.value(&f.region),
                    "inventory_level": hit_number(hit, &f.inventory_level),
                    "units_sold": hit_number(hit, &f.units_sold),
                    "units_ordered": hit_number(hit, &f.units_ordered),
                    "price": hit_number(hit, &f.price),
                    "discount": hit_number(hit, &f.discount),
                    "demand_forecast": hit_number(hit, &f.demand_forecast),
                    "date": hit.value(&f.date),
                })
            })
            .collect();

        Ok(json!({
            "category": category,
            "total_results": result.total,
            "total_inventory": number_json(aggs.value("total_inventory")),
            "products": products,
            "filters_applied": {
                "region": region,
                "min_inventory": params.min_inventory,
                "max_inventory": params.max_inventory,
            },
        })
        .into())
    }

    async fn low_stock_alerts(&self, params: LowStockParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let threshold = params.threshold.unwrap_or(self.settings.thresholds.low);
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ValidationError::new("threshold", "must be a non-negative number").into());
        }
        let region = optional_text(params.region.as_ref());
        let category = optional_text(params.category.as_ref());

        // Severity counts cover every match, not only the returned page.
        // Negative stock counts as out of stock, as it does per alert.
        let request = QueryRequest::new(&self.settings.indices.inventory)
            .filter(Clause::range(&f.inventory_level, RangeBounds::at_most(threshold))?)
            .filter_opt(region.as_deref().map(|r| Clause::term(&f.region, r)))
            .filter_opt(
                category
                    .as_deref()
                    .map(|c| MultiMatch::new(c, [f.category.as_str()]).into()),
            )
            .aggregate(
                "out_of_stock",
                AggSpec::filtered_count(Clause::range(
                    &f.inventory_level,
                    RangeBounds::at_most(0.0),
                )?),
            )
            .aggregate(
                "at_or_below_half",
                AggSpec::filtered_count(Clause::range(
                    &f.inventory_level,
                    RangeBounds::at_most(threshold / 2.0),
                )?),
            )
            .sort(SortClause::field(&f.inventory_level, SortOrder::Asc))
            .size(clamp_size(params.size, 100));

        let (result, aggs) = self.run(&request).await?;
        let critical = aggs.count("out_of_stock");
        let high = aggs.count("at_or_below_half").saturating_sub(critical);
        let medium = result
            .total
            .saturating_sub(aggs.count("at_or_below_half"));

        let alerts: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| {
                let units = hit.number(&f.inventory_level);
                json!({
                    "severity": AlertSeverity::classify(units, threshold)
                        .unwrap_or(AlertSeverity::Medium),
                    "product_id": hit.value(&f.product_id),
                    "store_id": hit.value(&f.store_id),
                    "category": hit.value(&f.category),
                    "region": hit.value(&f.region),
                    "inventory_level": number_json(units),
                    "units_sold": hit_number(hit, &f.units_sold),
                    "demand_forecast": hit_number(hit, &f.demand_forecast),
                    "date": hit.value(&f.date),
                })
            })
            .collect();

        Ok(json!({
            "threshold": number_json(threshold),
            "total_alerts": result.total,
            "critical_alerts": critical,
            "high_alerts": high,
            "medium_alerts": medium,
            "alerts": alerts,
            "filters_applied": { "region": region, "category": category },
        })
        .into())
    }

    async fn region_inventory(
        &self,
        params: RegionInventoryParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let region = require_text(&params.region, "region")?;
        let category = optional_text(params.category.as_ref());

        let request = QueryRequest::new(&self.settings.indices.inventory)
            .filter(Clause::term(&f.region, region.as_str()))
            .filter_opt(
                category
                    .as_deref()
                    .map(|c| MultiMatch::new(c, [f.category.as_str()]).into()),
            )
            .aggregate("total_inventory", AggSpec::sum(&f.inventory_level))
            .aggregate("total_units_sold", AggSpec::sum(&f.units_sold))
            .aggregate("store_count", AggSpec::cardinality(&f.store_id))
            .aggregate("stores", AggSpec::terms(&f.store_id, 100))
            .aggregate(
                "categories",
                TermsAgg::new(&f.category, 50)
                    .sub("inventory", AggSpec::sum(&f.inventory_level))
                    .sub("units_sold", AggSpec::sum(&f.units_sold))
                    .into(),
            )
            .size(clamp_size(params.size, 100));

        let (result, aggs) = self.run(&request).await?;
        let stores: Vec<&str> = aggs
            .bucket_slice("stores")
            .iter()
            .map(|b| b.key.as_str())
            .collect();
        let categories: Vec<Value> = aggs
            .bucket_slice("categories")
            .iter()
            .map(|b| {
                json!({
                    "category": b.key,
                    "inventory": number_json(b.sub.value("inventory")),
                    "units_sold": number_json(b.sub.value("units_sold")),
                    "records": b.doc_count,
                })
            })
            .collect();
        let items: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "product_id": hit.value(&f.product_id),
                    "store_id": hit.value(&f.store_id),
                    "category": hit.value(&f.category),
                    "inventory_level": hit_number(hit, &f.inventory_level),
                    "units_sold": hit_number(hit, &f.units_sold),
                    "price": hit_number(hit, &f.price),
                    "date": hit.value(&f.date),
                })
            })
            .collect();

        Ok(json!({
            "region": region,
            "total_inventory": number_json(aggs.value("total_inventory")),
            "total_units_sold": number_json(aggs.value("total_units_sold")),
            "store_count": aggs.count("store_count"),
            "stores": stores,
            "categories": categories,
            "inventory_items": items,
            "total_results": result.total,
        })
        .into())
    }

    async fn demand_forecast(&self, params: DemandForecastParams) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let product_id = optional_text(params.product_id.as_ref());
        let category = optional_text(params.category.as_ref());
        let region = optional_text(params.region.as_ref());
        if product_id.is_none() && category.is_none() && region.is_none() {
            return Err(ValidationError::new(
                "product_id",
                "at least one of product_id, category or region is required",
            )
            .into());
        }

        let request = QueryRequest::new(&self.settings.indices.inventory)
            .filter_opt(product_id.as_deref().map(|p| Clause::term(&f.product_id, p)))
            .filter_opt(
                category
                    .as_deref()
                    .map(|c| MultiMatch::new(c, [f.category.as_str()]).into()),
            )
            .filter_opt(region.as_deref().map(|r| Clause::term(&f.region, r)))
            .size(clamp_size(params.size, 50));

        let (result, _) = self.run(&request).await?;
        let forecasts: Vec<Value> = result.hits.iter().map(|hit| forecast_record(hit, f)).collect();
        let restock: Vec<Value> = forecasts
            .iter()
            .filter(|r| r["needs_restock"].as_bool() == Some(true))
            .cloned()
            .collect();

        Ok(json!({
            "total_products": forecasts.len(),
            "total_matching": result.total,
            "restock_required": restock.len(),
            "forecasts": forecasts,
            "restock_recommendations": restock,
            "filters_applied": {
                "product_id": product_id,
                "category": category,
                "region": region,
            },
        })
        .into())
    }

    async fn seasonal_analysis(
        &self,
        params: SeasonalAnalysisParams,
    ) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let seasonality = require_text(&params.seasonality, "seasonality")?;
        let region = optional_text(params.region.as_ref());

        let request = QueryRequest::new(&self.settings.indices.inventory)
            .filter(Clause::term(&f.seasonality, seasonality.as_str()))
            .filter_opt(region.as_deref().map(|r| Clause::term(&f.region, r)))
            .aggregate("total_inventory", AggSpec::sum(&f.inventory_level))
            .aggregate("total_demand", AggSpec::sum(&f.demand_forecast))
            .aggregate(
                "categories",
                TermsAgg::new(&f.category, 50)
                    .sub("inventory", AggSpec::sum(&f.inventory_level))
                    .sub("demand", AggSpec::sum(&f.demand_forecast))
                    .into(),
            )
            .size(clamp_size(params.size, 100));

        let (result, aggs) = self.run(&request).await?;
        let total_inventory = aggs.value("total_inventory");
        let total_demand = aggs.value("total_demand");
        let readiness = Readiness::assess(total_inventory, total_demand);

        let categories: Vec<Value> = aggs
            .bucket_slice("categories")
            .iter()
            .map(|b| {
                let inventory = b.sub.value("inventory");
                let demand = b.sub.value("demand");
                let readiness = Readiness::assess(inventory, demand);
                json!({
                    "category": b.key,
                    "inventory": number_json(inventory),
                    "demand": number_json(demand),
                    "records": b.doc_count,
                    "readiness_score": readiness.score,
                    "readiness_status": readiness.status,
                })
            })
            .collect();
        let products: Vec<Value> = result
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "product_id": hit.value(&f.product_id),
                    "store_id": hit.value(&f.store_id),
                    "category": hit.value(&f.category),
                    "region": hit.value(&f.region),
                    "inventory_level": hit_number(hit, &f.inventory_level),
                    "demand_forecast": hit_number(hit, &f.demand_forecast),
                    "units_sold": hit_number(hit, &f.units_sold),
                    "price": hit_number(hit, &f.price),
                    "discount": hit_number(hit, &f.discount),
                    "date": hit.value(&f.date),
                })
            })
            .collect();

        Ok(json!({
            "seasonality": seasonality,
            "region": region,
            "total_inventory": number_json(total_inventory),
            "total_demand_forecast": number_json(total_demand),
            "readiness_score": readiness.score,
            "readiness_status": readiness.status,
            "categories": categories,
            "products": products,
            "total_results": result.total,
        })
        .into())
    }

    async fn inventory_statistics(&self) -> Result<ToolOutput, ToolError> {
        let f = &self.settings.fields.inventory;
        let request = QueryRequest::new(&self.settings.indices.inventory)
            .aggregate("total_inventory", AggSpec::sum(&f.inventory_level))
            .aggregate("total_sold", AggSpec::sum(&f.units_sold))
            .aggregate("total_ordered", AggSpec::sum(&f.units_ordered))
            .aggregate("categories", AggSpec::terms(&f.category, 50))
            .aggregate("regions", AggSpec::terms(&f.region, 20))
            .aggregate("stores", AggSpec::cardinality(&f.store_id))
            .aggregate("avg_inventory", AggSpec::avg(&f.inventory_level))
            .aggregate("avg_price", AggSpec::avg(&f.price))
            .aggregate(
                "low_stock",
                AggSpec::filtered_count(Clause::range(
                    &f.inventory_level,
                    RangeBounds::at_most(self.settings.thresholds.low),
                )?),
            )
            .aggregate(
                "out_of_stock",
                AggSpec::filtered_count(Clause::range(
                    &f.inventory_level,
                    RangeBounds::at_most(0.0),
                )?),
            )
            .size(0);

        let (result, aggs) = self.run(&request).await?;
        let breakdown = |name: &str, key: &str| -> Vec<Value> {
            aggs.bucket_slice(name)
                .iter()
                .map(|b| json!({ key: b.key, "product_count": b.doc_count }))
                .collect()
        };

        Ok(json!({
            "total_products": result.total,
            "total_inventory": number_json(aggs.value("total_inventory")),
            "total_units_sold": number_json(aggs.value("total_sold")),
            "total_units_ordered": number_json(aggs.value("total_ordered")),
            "unique_stores": aggs.count("stores"),
            "average_inventory_per_product": round2(aggs.value("avg_inventory")),
            "average_price": round2(aggs.value("avg_price")),
            "low_stock_threshold": number_json(self.settings.thresholds.low),
            "low_stock_products": aggs.count("low_stock"),
            "out_of_stock_products": aggs.count("out_of_stock"),
            "categories": breakdown("categories", "category"),
            "regions": breakdown("regions", "region"),
        })
        .into())
    }
}

fn forecast_record(hit: &HitRecord, f: &InventoryFields) -> Value {
    let inventory = hit.number(&f.inventory_level);
    let forecast = hit.number(&f.demand_forecast);
    let need = restock_need(inventory, forecast);
    json!({
        "product_id": hit.value(&f.product_id),
        "store_id": hit.value(&f.store_id),
        "category": hit.value(&f.category),
        "region": hit.value(&f.region),
        "current_inventory": number_json(inventory),
        "demand_forecast": number_json(forecast),
        "shortage": number_json(need.shortage),
        "needs_restock": need.needs_restock,
        "units_sold": hit_number(hit, &f.units_sold),
        "units_ordered": hit_number(hit, &f.units_ordered),
        "date": hit.value(&f.date),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn hit(source: Value) -> HitRecord {
        HitRecord {
            id: "1".to_string(),
            score: None,
            source: source.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_forecast_record_shortage() {
        let f = InventoryFields::default();
        let record = forecast_record(
            &hit(json!({ "Inventory Level": 12, "Demand Forecast": 20, "Product ID": "P1" })),
            &f,
        );
        assert_eq!(record["shortage"], json!(8));
        assert_eq!(record["needs_restock"], true);
        assert_eq!(record["product_id"], "P1");

        let record = forecast_record(
            &hit(json!({ "Inventory Level": 25, "Demand Forecast": 20 })),
            &f,
        );
        assert_eq!(record["shortage"], json!(0));
        assert_eq!(record["needs_restock"], false);
    }

    #[test]
    fn test_forecast_record_fractional_forecast() {
        let f = InventoryFields::default();
        let record = forecast_record(
            &hit(json!({ "Inventory Level": 100, "Demand Forecast": 112.5 })),
            &f,
        );
        assert_eq!(record["shortage"], json!(12.5));
    }

    #[test]
    fn test_inventory_tool_names() {
        let names: Vec<String> = inventory_tools().into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"check_demand_forecast".to_string()));
        assert_eq!(names.len(), 7);
    }
}
