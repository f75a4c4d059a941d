//! Review and FAQ tools against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use retail_agents_core::ErrorKind;
use retail_agents_integration_tests::{
    MockBackend, buckets, retail_tools, search_response, search_response_with_total,
};
use serde_json::json;

const REVIEWS: &str = "womens_clothing_reviews";
const FAQS: &str = "faqs_data";

#[tokio::test]
async fn test_semantic_review_search_embeds_text_server_side() {
    let hits = [(
        "r1",
        json!({
            "rating": 2,
            "review_text": "runs small",
            "department_name": "Tops",
            "class_name": "Knits",
            "alike_feedback_count": 7
        }),
    )];
    let tools = retail_tools(
        MockBackend::new().with_search_response(REVIEWS, search_response(&hits, None)),
    );

    let envelope = tools
        .execute(
            "fetch_reviews_by_semantic_search",
            &json!({ "query": "sizing problems", "max_results": 3 }),
        )
        .await;

    assert!(envelope.ok, "{envelope:?}");
    let review = &envelope.data["reviews"][0];
    assert_eq!(review["review_text"], "runs small");
    assert_eq!(review["department_name"], "Tops");
    assert_eq!(review["class_name"], "Knits");
    assert_eq!(review["alike_feedback_count"], 7);

    let request = tools.backend().last_request().unwrap();
    let knn = &request["query"]["bool"]["must"][0]["knn"];
    assert_eq!(knn["k"], 3);
    assert_eq!(
        knn["query_vector_builder"]["text_embedding"]["model_text"],
        "sizing problems"
    );
    assert_eq!(
        knn["query_vector_builder"]["text_embedding"]["model_id"],
        ".multilingual-e5-small"
    );
}

#[tokio::test]
async fn test_rating_out_of_scale_is_rejected() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute(
            "fetch_reviews_by_rating",
            &json!({ "min_rating": 4, "max_rating": 7 }),
        )
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(
        envelope.error.as_ref().unwrap().parameter.as_deref(),
        Some("max_rating")
    );
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_rating_statistics_percentages() {
    let aggregations = json!({
        "avg_rating": { "value": 4.1666 },
        "avg_age": { "value": 41.0 },
        "total_feedback": { "value": 12.0 },
        "ratings": buckets(&[("5", 3, json!({})), ("3", 1, json!({}))]),
        "departments": buckets(&[("Tops", 4, json!({}))]),
        "classes": buckets(&[("Knits", 4, json!({}))]),
    });
    let response = search_response_with_total(&[], 4, Some(aggregations));
    let tools = retail_tools(MockBackend::new().with_search_response(REVIEWS, response));

    let envelope = tools
        .execute("aggregate_rating_statistics", &json!({}))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["total_reviews"], 4);
    assert_eq!(envelope.data["average_rating"], 4.17);
    assert_eq!(envelope.data["total_alike_feedback"], 12);
    assert_eq!(envelope.data["average_age"], 41.0);
    let ratings = envelope.data["rating_distribution"].as_array().unwrap();
    // Rating buckets come back in key order.
    assert_eq!(ratings[0]["rating"], "3");
    assert_eq!(ratings[0]["percentage"], 25.0);
    assert_eq!(ratings[1]["percentage"], 75.0);
    assert_eq!(envelope.data["department_distribution"][0]["department"], "Tops");
}

#[tokio::test]
async fn test_reviews_by_department_term_filter() {
    let tools = retail_tools(
        MockBackend::new().with_search_response(REVIEWS, search_response(&[], None)),
    );

    let envelope = tools
        .execute("fetch_reviews_by_department", &json!({ "department": "Dresses" }))
        .await;

    assert!(envelope.ok);
    assert_eq!(envelope.data["department"], "Dresses");
    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["query"]["bool"]["filter"][0],
        json!({ "term": { "department_name": "Dresses" } })
    );
}

#[tokio::test]
async fn test_recent_faqs_use_date_math() {
    let tools = retail_tools(
        MockBackend::new().with_search_response(FAQS, search_response(&[], None)),
    );

    let envelope = tools
        .execute("search_faqs_recent", &json!({ "days": 7 }))
        .await;

    assert!(envelope.ok);
    let request = tools.backend().last_request().unwrap();
    assert_eq!(
        request["query"]["bool"]["filter"][0],
        json!({ "range": { "modified": { "gte": "now-7d/d" } } })
    );
    assert_eq!(request["sort"], json!([{ "modified": { "order": "desc" } }]));
}

#[tokio::test]
async fn test_recent_faqs_rejects_zero_days() {
    let tools = retail_tools(MockBackend::new());

    let envelope = tools
        .execute("search_faqs_recent", &json!({ "days": 0 }))
        .await;

    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    assert_eq!(tools.backend().call_count(), 0);
}

#[tokio::test]
async fn test_faq_by_topic_adds_keyword_match() {
    let tools = retail_tools(
        MockBackend::new().with_search_response(FAQS, search_response(&[], None)),
    );

    let envelope = tools
        .execute(
            "search_faqs_by_topic",
            &json!({ "topic": "returns", "keywords": ["refund", "label"] }),
        )
        .await;

    assert!(envelope.ok);
    let request = tools.backend().last_request().unwrap();
    let must = request["query"]["bool"]["must"].as_array().unwrap();
    assert_eq!(must.len(), 2);
    assert_eq!(must[1]["multi_match"]["query"], "refund label");
}

#[tokio::test]
async fn test_faq_statistics_monthly_activity() {
    let aggregations = json!({
        "content_types": buckets(&[("faq", 10, json!({}))]),
        "languages": buckets(&[("en", 10, json!({}))]),
        "formats": buckets(&[("html", 10, json!({}))]),
        "avg_content_length": { "value": 512.34 },
        "monthly": buckets(&[("2024-01", 4, json!({})), ("2024-02", 0, json!({})), ("2024-03", 6, json!({}))]),
    });
    let response = search_response_with_total(&[], 10, Some(aggregations));
    let tools = retail_tools(MockBackend::new().with_search_response(FAQS, response));

    let envelope = tools.execute("get_faq_statistics", &json!(null)).await;

    assert!(envelope.ok, "{envelope:?}");
    assert_eq!(envelope.data["total_faqs"], 10);
    assert_eq!(envelope.data["average_content_length"], 512.3);
    assert_eq!(
        envelope.data["recent_activity"],
        json!([
            { "period": "2024-01", "count": 4 },
            { "period": "2024-03", "count": 6 }
        ])
    );
}

#[tokio::test]
async fn test_faq_records_carry_length_and_format() {
    let hits = [(
        "f1",
        json!({
            "content": "Returns are accepted within 30 days.",
            "content_type": "faq",
            "content_length": 36,
            "language": "en",
            "format": "html"
        }),
    )];
    let tools = retail_tools(
        MockBackend::new().with_search_response(FAQS, search_response(&hits, None)),
    );

    let envelope = tools
        .execute("search_faqs", &json!({ "query": "returns" }))
        .await;

    assert!(envelope.ok, "{envelope:?}");
    let faq = &envelope.data["faqs"][0];
    assert_eq!(faq["id"], "f1");
    assert_eq!(faq["content_length"], 36);
    assert_eq!(faq["format"], "html");
    assert_eq!(faq["language"], "en");
}
