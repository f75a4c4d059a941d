//! Shopping analytics tools against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use retail_agents_core::ErrorKind;
use retail_agents_integration_tests::{
    MockBackend, buckets, retail_tools, search_response, search_response_with_total,
};
use serde_json::json;

const INDEX: &str = "customer_shopping_data.csv";

#[tokio::test]
async fn test_date_range_is_sent_in_index_format() {
    let aggregations = json!({
        "total_revenue": { "value": 300.0 },
        "categories": buckets(&[("Shoes", 2, json!({}))]),
        "daily": buckets(&[
            ("01/03/2022", 1, json!({ "revenue": { "value": 100.0 } })),
            ("02/03/2022", 0, json!({ "revenue": { "value": 0.0 } })),
            ("03/03/2022", 1, json!({ "revenue": { "value": 200.0 } })),
        ]),
    });
    let response = search_response_with_total(&[], 2, Some(aggregations));
    let tools = retail_tools(MockBackend::new().with_search_response(INDEX, response));

    let envelope = tools
        .execute(
            "search_transactions_by_date_range",
            &json!({ "start_date": "2022-03-01", "end_date": "2022-03-31" }),
        )
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["analytics"]["average_transaction"], 150.0);
    let daily = envelope.data["analytics"]["daily_sales"].as_array().unwrap();
    assert_eq!(daily.len(), 2, "empty days are skipped");
    assert_eq!(daily[0]["date"], "01/03/2022");

    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["query"]["bool"]["filter"][0],
        json!({
            "range": {
                "invoice_date": { "gte": "01/03/2022", "lte": "31/03/2022", "format": "dd/MM/yyyy" }
            }
        })
    );
    assert_eq!(
        request["aggs"]["daily"]["date_histogram"]["calendar_interval"],
        "day"
    );
}

#[tokio::test]
async fn test_date_range_start_after_end_is_rejected() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute(
            "search_transactions_by_date_range",
            &json!({ "start_date": "2022-04-01", "end_date": "2022-03-01" }),
        )
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(
        envelope.error.as_ref().unwrap().parameter.as_deref(),
        Some("start_date")
    );
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_high_value_transactions_filter_by_script() {
    let hits = [(
        "1",
        json!({ "invoice_no": "I1", "price": 1500.0, "quantity": 3 }),
    )];
    let aggregations = json!({
        "total_value": { "value": 4500.0 },
        "average_value": { "value": 4500.0 },
    });
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&hits, Some(aggregations))),
    );

    let envelope = tools
        .execute("get_high_value_transactions", &json!({ "min_amount": 1000 }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["analytics"]["highest_transaction"], 4500.0);

    let request = tools.backend().last_request().unwrap();
    let script = &request["query"]["bool"]["filter"][0]["script"]["script"];
    assert_eq!(
        script["source"],
        "doc['price'].value * doc['quantity'].value >= params.min_amount"
    );
    assert_eq!(script["params"]["min_amount"], 1000.0);
    assert_eq!(request["sort"][0]["_script"]["type"], "number");
    assert_eq!(request["sort"][0]["_script"]["order"], "desc");
}

#[tokio::test]
async fn test_mall_performance_sorted_by_revenue() {
    let mall = |revenue: f64| {
        json!({
            "revenue": { "value": revenue },
            "avg_transaction": { "value": revenue / 2.0 },
            "categories": buckets(&[]),
            "payment_methods": buckets(&[]),
            "avg_customer_age": { "value": 40.0 },
        })
    };
    let aggregations = json!({
        "malls": buckets(&[
            ("Kanyon", 5, mall(100.0)),
            ("Zorlu", 2, mall(900.0)),
        ]),
    });
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&[], Some(aggregations))),
    );

    let envelope = tools
        .execute("analyze_shopping_mall_performance", &json!({}))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["analysis_type"], "all_malls");
    assert_eq!(envelope.data["mall_performance"][0]["mall_name"], "Zorlu");
    assert_eq!(envelope.data["summary"]["highest_revenue_mall"], "Zorlu");
    assert_eq!(envelope.data["summary"]["total_transactions"], 7);
}

#[tokio::test]
async fn test_missing_aggregation_is_search_error() {
    // The engine answered without the requested aggregations.
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&[], None)),
    );

    let envelope = tools
        .execute("get_payment_method_analytics", &json!({}))
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::SearchError));
}
