//! REST boundary tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use aeroquery::catalog::CatalogStore;
use aeroquery::config::Config;
use aeroquery::observability::MetricsRegistry;
use aeroquery::projection::ShapeRegistry;
use aeroquery::rest_api::{ApiState, RestServer};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const SEED: &str = r#"{
    "customers": [
        {"id": 1, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
         "firstName": "Ada", "lastName": "O'Brien", "email": "ada@example.com"},
        {"id": 2, "createdOn": "2024-01-02T00:00:00Z", "updatedOn": "2024-01-02T00:00:00Z",
         "firstName": "Grace", "lastName": "Hopper", "email": "grace@example.com",
         "phone": "555-0100"}
    ],
    "menuItems": [
        {"id": 1, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
         "itemName": "Soup", "price": 6.0, "category": "starter"},
        {"id": 2, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
         "itemName": "Steak", "price": 24.0, "category": "main"},
        {"id": 3, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
         "itemName": "Risotto", "price": 14.5, "category": "main"}
    ],
    "orders": [
        {"id": 10, "createdOn": "2024-03-01T00:00:00Z", "updatedOn": "2024-03-01T00:00:00Z",
         "customerID": 1, "orderDate": "2024-03-01T19:00:00Z", "totalAmount": 30.0,
         "status": "open"},
        {"id": 11, "createdOn": "2024-03-02T00:00:00Z", "updatedOn": "2024-03-02T00:00:00Z",
         "customerID": 2, "orderDate": "2024-03-02T20:00:00Z", "totalAmount": 14.5,
         "status": "closed"}
    ],
    "orderItems": [
        {"id": 100, "createdOn": "2024-03-01T00:00:00Z", "updatedOn": "2024-03-01T00:00:00Z",
         "orderID": 10, "menuItemID": 1, "quantity": 1, "unitPrice": 6.0},
        {"id": 101, "createdOn": "2024-03-01T00:00:00Z", "updatedOn": "2024-03-01T00:00:00Z",
         "orderID": 10, "menuItemID": 2, "quantity": 1, "unitPrice": 24.0}
    ]
}"#;

fn app() -> Router {
    let config = Config {
        max_top: 50,
        ..Config::default()
    };
    let store = CatalogStore::from_json(SEED).unwrap();
    let state = Arc::new(ApiState::with_registries(
        store,
        config.max_top,
        Arc::new(ShapeRegistry::new()),
        Arc::new(MetricsRegistry::new()),
    ));
    RestServer::with_state(config, state).unwrap().router()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// QUERIES
// =============================================================================

#[tokio::test]
async fn test_filter_order_select() {
    let (status, body) = get(
        app(),
        "/api/menuItems?$filter=category%20eq%20%27main%27&$orderby=price%20desc&$select=itemName,price",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"items": [
            {"itemname": "Steak", "price": 24.0},
            {"itemname": "Risotto", "price": 14.5}
        ]})
    );
}

#[tokio::test]
async fn test_full_shape_hides_back_references() {
    let (status, body) = get(app(), "/api/customers?$filter=id%20eq%201").await;

    assert_eq!(status, StatusCode::OK);
    let customer = &body["items"][0];
    assert_eq!(customer["lastName"], "O'Brien");
    assert!(customer.get("orders").is_none());
    assert!(body.get("count").is_none());
}

#[tokio::test]
async fn test_escaped_quote_in_filter() {
    let (status, body) = get(
        app(),
        "/api/customers?$filter=lastName%20eq%20%27O%27%27Brien%27&$select=id",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": [{"id": 1}]}));
}

#[tokio::test]
async fn test_expand_loads_navigation() {
    let (status, body) = get(app(), "/api/orders?$expand=customer&$orderby=id").await;

    assert_eq!(status, StatusCode::OK);
    let first = &body["items"][0];
    assert_eq!(first["customer"]["firstName"], "Ada");
    assert_eq!(first["status"], "open");
    assert!(first.get("orderitems").is_none());
}

#[tokio::test]
async fn test_count_and_pagination() {
    let (status, body) = get(app(), "/api/menuItems?$orderby=id&$skip=1&$top=1&$count").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["id"], 2);
}

#[tokio::test]
async fn test_count_route() {
    let (status, body) = get(app(), "/api/orders/count?$filter=status%20eq%20%27open%27").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));
}

#[tokio::test]
async fn test_datetime_filter() {
    let (status, body) = get(
        app(),
        "/api/orders?$filter=orderDate%20gt%202024-03-02T00:00:00Z&$select=id",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": [{"id": 11}]}));
}

// =============================================================================
// CATALOG READS
// =============================================================================

#[tokio::test]
async fn test_get_by_id() {
    let (status, body) = get(app(), "/api/orders/10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 10);
    assert_eq!(body["customerID"], 1);
    assert!(body.get("customer").is_none());
    assert!(body.get("orderItems").is_none());

    let (status, body) = get(app(), "/api/Customers/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "grace@example.com");
}

#[tokio::test]
async fn test_get_by_id_missing_is_404() {
    let (status, body) = get(app(), "/api/menuItems/99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "REST_ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_get_by_id_rejects_non_numeric_id() {
    let (status, body) = get(app(), "/api/orders/ten").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "REST_INVALID_PATH_PARAM");
}

#[tokio::test]
async fn test_order_details_lists_menu_items() {
    let (status, body) = get(app(), "/api/orders/10/details").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["itemName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Soup", "Steak"]);

    let (status, body) = get(app(), "/api/orders/11/details").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": []}));
}

#[tokio::test]
async fn test_orders_by_email() {
    let (status, body) = get(app(), "/api/customers/by-email/grace@example.com/orders").await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 11);
    assert_eq!(items[0]["status"], "closed");

    let (status, body) = get(app(), "/api/customers/by-email/nobody@example.com/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": []}));
}

#[tokio::test]
async fn test_deeply_nested_filter_is_400() {
    let filter = format!("{}id%20eq%201{}", "(".repeat(2000), ")".repeat(2000));
    let (status, body) = get(app(), &format!("/api/orders?$filter={}", filter)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "REST_INVALID_FILTER");
}

// =============================================================================
// ERRORS
// =============================================================================

#[tokio::test]
async fn test_unknown_collection_is_404() {
    let (status, body) = get(app(), "/api/tables").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "REST_COLLECTION_NOT_FOUND");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_unknown_property_is_400() {
    let (status, body) = get(app(), "/api/orders?$select=id,colour").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "QUERY_UNKNOWN_PROPERTY");
}

#[tokio::test]
async fn test_navigation_filter_is_400() {
    let (status, body) = get(app(), "/api/orders?$filter=customer%20eq%201").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "QUERY_INVALID_FILTER_PROPERTY");
}

#[tokio::test]
async fn test_malformed_filter_is_400() {
    let (status, body) = get(app(), "/api/orders?$filter=status%20eq").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "REST_INVALID_FILTER");
}

#[tokio::test]
async fn test_top_above_limit_is_400() {
    let (status, body) = get(app(), "/api/orders?$top=51").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "REST_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_unknown_parameter_is_400() {
    let (status, body) = get(app(), "/api/orders?$limit=5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "REST_INVALID_QUERY_PARAM");
}

// =============================================================================
// HEALTH AND METRICS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_track_queries() {
    let app = app();

    let _ = get(app.clone(), "/api/menuItems?$select=id").await;
    let _ = get(app.clone(), "/api/menuItems?$select=nope").await;
    let (status, body) = get(app, "/observability/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queries_executed"], 1);
    assert_eq!(body["queries_rejected"], 1);
    assert_eq!(body["rows_returned"], 3);
    assert_eq!(body["shapes_created"], 1);
}
