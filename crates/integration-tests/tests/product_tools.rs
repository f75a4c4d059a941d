//! Product tools against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use retail_agents_core::ErrorKind;
use retail_agents_integration_tests::{MockBackend, retail_tools, search_response};
use serde_json::json;

const INDEX: &str = "products";

fn catalog() -> MockBackend {
    MockBackend::new()
        .with_document(
            INDEX,
            "A",
            json!({ "name": "Desk Lamp", "price": 30, "brand": "Lumo" }),
        )
        .with_document(
            INDEX,
            "B",
            json!({ "name": "Floor Lamp", "price": 80, "color": "black" }),
        )
}

#[tokio::test]
async fn test_compare_products_partial_success() {
    let tools = retail_tools(catalog());

    let envelope = tools
        .execute(
            "compare_products",
            &json!({ "product_ids": ["A", "B", "missing"] }),
        )
        .await;

    assert!(envelope.ok, "{envelope:?}");
    let products = envelope.data["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], "A");
    assert_eq!(products[1]["id"], "B");
    assert_eq!(envelope.data["product_count"], 2);
    assert_eq!(
        envelope.data["comparison_fields"],
        json!(["brand", "color", "id", "name", "price"])
    );

    assert_eq!(envelope.errors.len(), 1);
    assert_eq!(envelope.errors[0].kind, ErrorKind::NotFoundError);
    assert_eq!(envelope.errors[0].parameter.as_deref(), Some("missing"));

    // Every id is looked up, in input order.
    let ids: Vec<String> = tools
        .backend()
        .lookups()
        .into_iter()
        .map(|(_, id)| id)
        .collect();
    assert_eq!(ids, ["A", "B", "missing"]);
}

#[tokio::test]
async fn test_compare_products_none_found() {
    let tools = retail_tools(catalog());

    let envelope = tools
        .execute("compare_products", &json!({ "product_ids": ["x", "y"] }))
        .await;

    assert!(!envelope.ok);
    assert_eq!(envelope.error_kind(), Some(ErrorKind::NotFoundError));
    assert!(envelope.data.is_empty());
}

#[tokio::test]
async fn test_compare_products_reports_engine_failure_over_misses() {
    let tools = retail_tools(catalog().with_failing_id(INDEX, "broken"));

    let envelope = tools
        .execute(
            "compare_products",
            &json!({ "product_ids": ["nope", "broken"] }),
        )
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::SearchError));
}

#[tokio::test]
async fn test_compare_products_empty_list_is_validation_error() {
    let tools = retail_tools(catalog());

    let envelope = tools
        .execute("compare_products", &json!({ "product_ids": [] }))
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_get_product_by_id() {
    let tools = retail_tools(catalog());

    let found = tools
        .execute("get_product_by_id", &json!({ "product_id": "B" }))
        .await;
    assert!(found.ok);
    assert_eq!(found.data["name"], "Floor Lamp");
    assert_eq!(found.data["id"], "B");

    let missing = tools
        .execute("get_product_by_id", &json!({ "product_id": "Z" }))
        .await;
    assert_eq!(missing.error_kind(), Some(ErrorKind::NotFoundError));
    assert_eq!(
        missing.error.as_ref().unwrap().parameter.as_deref(),
        Some("Z")
    );
}

#[tokio::test]
async fn test_search_products_request_shape() {
    let hits = [("A", json!({ "name": "Desk Lamp", "popularity": 9 }))];
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&hits, None)),
    );

    let envelope = tools
        .execute(
            "search_products",
            &json!({
                "query": "lamp",
                "filters": { "brand": "Lumo", "price": { "gte": 10, "lte": 50 } }
            }),
        )
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["total"], 1);
    assert_eq!(envelope.data["products"][0]["id"], "A");

    let request = tools.backend().last_request().unwrap();
    let multi_match = &request["query"]["bool"]["must"][0]["multi_match"];
    assert_eq!(
        multi_match["fields"],
        json!(["name^3", "description^2", "category", "brand", "tags"])
    );
    assert_eq!(multi_match["type"], "best_fields");
    assert_eq!(multi_match["fuzziness"], "AUTO");
    assert_eq!(
        request["sort"],
        json!(["_score", { "popularity": { "order": "desc" } }])
    );
    assert_eq!(request["size"], 10);

    let filters = request["query"]["bool"]["filter"].as_array().unwrap();
    assert!(filters.contains(&json!({ "term": { "brand": "Lumo" } })));
    assert!(filters.contains(&json!({ "range": { "price": { "gte": 10, "lte": 50 } } })));
}

#[tokio::test]
async fn test_search_products_rejects_array_filter() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute(
            "search_products",
            &json!({ "query": "lamp", "filters": { "tags": ["a"] } }),
        )
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(
        envelope.error.as_ref().unwrap().parameter.as_deref(),
        Some("filters")
    );
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_category_search_lowercases_category() {
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&[], None)),
    );

    let envelope = tools
        .execute(
            "search_products_by_category",
            &json!({ "category": "Lighting", "max_price": 100 }),
        )
        .await;

    assert!(envelope.ok);
    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["query"]["bool"]["filter"],
        json!([
            { "term": { "category": "lighting" } },
            { "range": { "price": { "lte": 100.0 } } }
        ])
    );
    assert_eq!(request["size"], 20);
}

#[tokio::test]
async fn test_similar_products_uses_more_like_this() {
    let hits = [("B", json!({ "name": "Floor Lamp" }))];
    let tools = retail_tools(
        MockBackend::new().with_search_response(INDEX, search_response(&hits, None)),
    );

    let envelope = tools
        .execute("search_similar_products", &json!({ "product_id": "A" }))
        .await;

    assert!(envelope.ok);
    assert_eq!(envelope.data["original_product_id"], "A");
    assert_eq!(envelope.data["count"], 1);

    let request = tools.backend().last_request().unwrap();
    let mlt = &request["query"]["bool"]["must"][0]["more_like_this"];
    assert_eq!(mlt["like"], json!([{ "_index": "products", "_id": "A" }]));
    assert_eq!(mlt["max_query_terms"], 12);
    assert_eq!(request["size"], 5);
}

#[tokio::test]
async fn test_compare_products_rejects_more_than_twenty_ids() {
    let tools = retail_tools(catalog());
    let ids: Vec<String> = (0..21).map(|i| format!("p{i}")).collect();

    let envelope = tools
        .execute("compare_products", &json!({ "product_ids": ids }))
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(
        envelope.error.as_ref().unwrap().parameter.as_deref(),
        Some("product_ids")
    );
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_compare_products_twenty_ids_keep_input_order() {
    let tools = retail_tools(catalog());
    let mut ids: Vec<String> = (0..18).map(|i| format!("p{i}")).collect();
    ids.insert(3, "B".to_string());
    ids.push("A".to_string());

    let envelope = tools
        .execute("compare_products", &json!({ "product_ids": ids }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["products"][0]["id"], "B");
    assert_eq!(envelope.data["products"][1]["id"], "A");
    assert_eq!(envelope.errors.len(), 18);
    assert_eq!(envelope.errors[3].parameter.as_deref(), Some("p3"));
    assert_eq!(tools.backend().call_count(), 20);
}
