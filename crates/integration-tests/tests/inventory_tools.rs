//! Inventory tools against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use retail_agents_core::ErrorKind;
use retail_agents_integration_tests::{
    MockBackend, buckets, retail_tools, search_response, search_response_with_total,
};
use serde_json::json;

const INDEX: &str = "retail_store_inventory";

#[tokio::test]
async fn test_demand_forecast_flags_shortages() {
    let hits = [
        (
            "1",
            json!({ "Product ID": "P0001", "Store ID": "S001", "Inventory Level": 12, "Demand Forecast": 20 }),
        ),
        (
            "2",
            json!({ "Product ID": "P0001", "Store ID": "S002", "Inventory Level": 25, "Demand Forecast": 20 }),
        ),
    ];
    let backend = MockBackend::new().with_search_response(INDEX, search_response(&hits, None));
    let tools = retail_tools(backend);

    let envelope = tools
        .execute("check_demand_forecast", &json!({ "product_id": "P0001" }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    let forecasts = envelope.data["forecasts"].as_array().unwrap();
    assert_eq!(forecasts[0]["shortage"], 8);
    assert_eq!(forecasts[0]["needs_restock"], true);
    assert_eq!(forecasts[1]["shortage"], 0);
    assert_eq!(forecasts[1]["needs_restock"], false);
    assert_eq!(envelope.data["restock_required"], 1);

    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["query"]["bool"]["filter"][0],
        json!({ "term": { "Product ID": "P0001" } })
    );
}

#[tokio::test]
async fn test_demand_forecast_without_discriminator_makes_no_call() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute("check_demand_forecast", &json!({ "region": "  " }))
        .await;

    assert!(!envelope.ok);
    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(
        envelope.error.as_ref().unwrap().parameter.as_deref(),
        Some("product_id")
    );
    assert!(envelope.data.is_empty());
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_product_inventory_total_comes_from_sum_aggregation() {
    // Only one location is returned but the sum covers every record.
    let hits = [(
        "1",
        json!({ "Product ID": "P0007", "Store ID": "S001", "Region": "North", "Inventory Level": 40 }),
    )];
    let response = search_response_with_total(
        &hits,
        3,
        Some(json!({ "total_inventory": { "value": 130.0 } })),
    );
    let tools = retail_tools(MockBackend::new().with_search_response(INDEX, response));

    let envelope = tools
        .execute("check_product_inventory", &json!({ "product_id": "P0007" }))
        .await;

    assert!(envelope.ok);
    assert_eq!(envelope.data["total_inventory"], 130);
    assert_eq!(envelope.data["record_count"], 3);
    assert_eq!(envelope.data["location_count"], 1);
    assert_eq!(envelope.data["stock_status"], "in_stock");

    let request = tools.backend().last_request().unwrap();
    assert_eq!(request["track_total_hits"], true);
    assert_eq!(
        request["aggs"]["total_inventory"],
        json!({ "sum": { "field": "Inventory Level" } })
    );
}

#[tokio::test]
async fn test_product_inventory_empty_result_is_not_found_status() {
    let response = search_response(&[], Some(json!({ "total_inventory": { "value": 0.0 } })));
    let tools = retail_tools(MockBackend::new().with_search_response(INDEX, response));

    let envelope = tools
        .execute("check_product_inventory", &json!({ "product_id": "NOPE" }))
        .await;

    assert!(envelope.ok);
    assert_eq!(envelope.data["status"], "not_found");
}

#[tokio::test]
async fn test_region_category_buckets_sum_to_total() {
    let aggregations = json!({
        "total_inventory": { "value": 50.0 },
        "total_units_sold": { "value": 9.0 },
        "store_count": { "value": 2 },
        "stores": buckets(&[("S001", 2, json!({})), ("S002", 1, json!({}))]),
        "categories": buckets(&[
            ("Toys", 2, json!({ "inventory": { "value": 30.0 }, "units_sold": { "value": 5.0 } })),
            ("Groceries", 1, json!({ "inventory": { "value": 20.0 }, "units_sold": { "value": 4.0 } })),
        ]),
    });
    let response = search_response_with_total(&[], 3, Some(aggregations));
    let tools = retail_tools(MockBackend::new().with_search_response(INDEX, response));

    let envelope = tools
        .execute("get_inventory_by_region", &json!({ "region": "North" }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    let categories = envelope.data["categories"].as_array().unwrap();
    let bucket_sum: i64 = categories
        .iter()
        .map(|c| c["inventory"].as_i64().unwrap())
        .sum();
    assert_eq!(bucket_sum, 50);
    assert_eq!(envelope.data["total_inventory"], 50);
    assert_eq!(envelope.data["store_count"], 2);
    assert_eq!(envelope.data["stores"], json!(["S001", "S002"]));
}

#[tokio::test]
async fn test_low_stock_severity_counts_cover_all_matches() {
    let hits = [
        ("1", json!({ "Product ID": "A", "Inventory Level": -2 })),
        ("2", json!({ "Product ID": "B", "Inventory Level": 0 })),
        ("3", json!({ "Product ID": "C", "Inventory Level": 4 })),
    ];
    let aggregations = json!({
        "out_of_stock": { "doc_count": 3 },
        "at_or_below_half": { "doc_count": 7 },
    });
    let response = search_response_with_total(&hits, 10, Some(aggregations));
    let tools = retail_tools(MockBackend::new().with_search_response(INDEX, response));

    let envelope = tools
        .execute("get_low_stock_alerts", &json!({ "threshold": 10, "size": 3 }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["critical_alerts"], 3);
    assert_eq!(envelope.data["high_alerts"], 4);
    assert_eq!(envelope.data["medium_alerts"], 3);
    assert_eq!(envelope.data["alerts"][0]["severity"], "critical");
    assert_eq!(envelope.data["alerts"][1]["severity"], "critical");
    assert_eq!(envelope.data["alerts"][2]["severity"], "high");

    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["sort"],
        json!([{ "Inventory Level": { "order": "asc" } }])
    );
    assert_eq!(request["size"], 3);
    // Stock at or below zero is counted as out of stock, matching the alerts.
    assert_eq!(
        request["aggs"]["out_of_stock"],
        json!({ "filter": { "range": { "Inventory Level": { "lte": 0.0 } } } })
    );
}

#[tokio::test]
async fn test_category_min_above_max_is_rejected() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute(
            "search_inventory_by_category",
            &json!({ "category": "Toys", "min_inventory": 50, "max_inventory": 10 }),
        )
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(tools.backend().call_count(), 0);
}
