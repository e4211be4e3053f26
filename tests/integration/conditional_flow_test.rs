//! End-to-end conditional request handling through an axum router

use axum::{
    body::Body,
    extract::Query,
    http::{header, Request, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use gantry_common::{Pagination, Problem, Result};
use gantry_http::{CacheHeaders, ConditionalGet, ConditionalUpdate, Preconditions, Yaml};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Order {
    id: u64,
    status: String,
}

fn stored_order() -> Order {
    Order {
        id: 7,
        status: "shipped".to_string(),
    }
}

fn stored_last_modified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

async fn get_order(preconditions: Preconditions) -> Result<Response> {
    ConditionalGet::new(|| Ok(stored_order()))
        .preconditions(&preconditions)
        .etag("order-v1")
        .last_modified(stored_last_modified())
        .cache(CacheHeaders::new().feature_code("ORDERS"))
        .respond()
}

async fn put_order(preconditions: Preconditions) -> std::result::Result<Response, Problem> {
    ConditionalUpdate::new(|| {
        Ok(Some(Order {
            id: 7,
            status: "delivered".to_string(),
        }))
    })
    .preconditions(&preconditions)
    .current_etag("order-v1")
    .current_last_modified(stored_last_modified())
    .require_validator(true)
    .new_etag("order-v2")
    .respond()
    .map_err(|e| Problem::from_error(&e).with_feature_code("ORDERS"))
}

async fn cancel_order(preconditions: Preconditions) -> Result<Response> {
    // A write that produces the no-value sentinel: 204
    ConditionalUpdate::<Order, _>::new(|| Ok(None))
        .preconditions(&preconditions)
        .current_etag("order-v1")
        .respond()
}

async fn import_order(Yaml(order): Yaml<Order>) -> Yaml<Order> {
    Yaml(order)
}

async fn list_orders(Query(pagination): Query<Pagination>) -> Json<serde_json::Value> {
    let page = pagination.page();
    Json(serde_json::json!({
        "offset": page.offset,
        "limit": page.limit,
        "sort": page.sort.iter().map(|k| k.field.clone()).collect::<Vec<_>>(),
    }))
}

fn app() -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/7", get(get_order))
        .route("/orders/7", put(put_order))
        .route("/orders/7/cancel", put(cancel_order))
        .route("/orders/import", post(import_order))
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_without_validators_returns_full_response() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/orders/7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::ETAG).unwrap(), "\"order-v1\"");
    assert_eq!(
        response.headers().get(header::LAST_MODIFIED).unwrap(),
        "Sun, 01 Mar 2026 12:00:00 GMT"
    );
    assert_eq!(response.headers().get("feature-code").unwrap(), "ORDERS");
    let value = body_json(response).await;
    assert_eq!(value["status"], "shipped");
}

#[tokio::test]
async fn test_get_with_matching_tag_returns_304() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/orders/7")
                .header(header::IF_NONE_MATCH, "\"order-v1\"")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    // Cache metadata still travels on the 304
    assert_eq!(response.headers().get("feature-code").unwrap(), "ORDERS");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_get_with_fresh_if_modified_since_returns_304() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/orders/7")
                .header(header::IF_MODIFIED_SINCE, "Sun, 01 Mar 2026 12:00:00 GMT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_get_with_stale_if_modified_since_returns_200() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/orders/7")
                .header(header::IF_MODIFIED_SINCE, "Sat, 28 Feb 2026 00:00:00 GMT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_put_without_validators_returns_428_problem() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(response.headers().get("feature-code").unwrap(), "ORDERS");
    let value = body_json(response).await;
    assert_eq!(value["title"], "Precondition Required");
    assert_eq!(value["status"], 428);
}

#[tokio::test]
async fn test_put_with_matching_if_match_updates() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7")
                .header(header::IF_MATCH, "\"order-v1\"")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::ETAG).unwrap(), "\"order-v2\"");
    let value = body_json(response).await;
    assert_eq!(value["status"], "delivered");
}

#[tokio::test]
async fn test_put_with_stale_if_match_returns_412_problem() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7")
                .header(header::IF_MATCH, "\"order-v0\"")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let value = body_json(response).await;
    assert_eq!(value["title"], "Precondition Failed");
    assert_eq!(value["status"], 412);
}

#[tokio::test]
async fn test_put_with_if_unmodified_since_bound() {
    // Bound before the stored change: refuse
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7")
                .header(
                    header::IF_UNMODIFIED_SINCE,
                    "Sat, 28 Feb 2026 00:00:00 GMT",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    // Bound at the stored change: proceed
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7")
                .header(
                    header::IF_UNMODIFIED_SINCE,
                    "Sun, 01 Mar 2026 12:00:00 GMT",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unit_update_returns_204() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/7/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_yaml_round_trip_through_router() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders/import")
                .header(header::CONTENT_TYPE, "application/yaml")
                .body(Body::from("id: 9\nstatus: pending\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/yaml"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let order: Order = serde_yaml::from_slice(&bytes).unwrap();
    assert_eq!(
        order,
        Order {
            id: 9,
            status: "pending".to_string()
        }
    );
}
