//! `POST /v1/orders` driven through the full router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{Router, body::Body};
use http::{Request, StatusCode, header};
use pulsecart_core::{OrdersCreatedEvent, PRODUCER_KEY_PREFIX};
use pulsecart_orders::{AppState, OrderService, build_router};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_testing::{InMemoryIdempotencyStore, InMemoryOrderStore, RecordingPublisher};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const VALID_BODY: &str = r#"{"user_id":"u_123","items":[{"sku":"sku_1","quantity":2,"unit_price":1500}],"currency":"USD"}"#;

struct TestApp {
    router: Router,
    idempotency: InMemoryIdempotencyStore,
    orders: InMemoryOrderStore,
    publisher: RecordingPublisher,
    metrics: Arc<MetricsRegistry>,
}

fn test_app() -> TestApp {
    let idempotency = InMemoryIdempotencyStore::new(PRODUCER_KEY_PREFIX);
    let orders = InMemoryOrderStore::new();
    let publisher = RecordingPublisher::new();
    let metrics = Arc::new(MetricsRegistry::new("pulsecart_orders"));

    let service = OrderService::new(Arc::clone(&metrics))
        .with_idempotency_store(Arc::new(idempotency.clone()))
        .with_order_store(Arc::new(orders.clone()))
        .with_publisher(Arc::new(publisher.clone()));

    TestApp {
        router: build_router(AppState::new(service)),
        idempotency,
        orders,
        publisher,
        metrics,
    }
}

fn order_request(body: &str, idempotency_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = idempotency_key {
        builder = builder.header("Idempotency-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn create_order_outcomes() {
    struct Case {
        name: &'static str,
        body: &'static str,
        key: Option<&'static str>,
        fail_idempotency: bool,
        fail_persistence: bool,
        fail_publish: bool,
        status: StatusCode,
        store_calls: usize,
        publish_calls: usize,
    }

    let base = Case {
        name: "",
        body: VALID_BODY,
        key: Some("idem-1"),
        fail_idempotency: false,
        fail_persistence: false,
        fail_publish: false,
        status: StatusCode::CREATED,
        store_calls: 1,
        publish_calls: 1,
    };

    let cases = [
        Case {
            name: "invalid json",
            body: "{",
            status: StatusCode::BAD_REQUEST,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "missing user_id",
            body: r#"{"items":[{"sku":"sku_1","qty":1,"price_cents":100}],"currency":"USD"}"#,
            status: StatusCode::BAD_REQUEST,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "missing items",
            body: r#"{"user_id":"u_1","items":[],"currency":"USD"}"#,
            status: StatusCode::BAD_REQUEST,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "free item without sku",
            body: r#"{"user_id":"u_1","items":[{"qty":1,"price_cents":0}],"currency":"USD"}"#,
            ..base
        },
        Case {
            name: "missing currency",
            body: r#"{"user_id":"u_1","items":[{"sku":"sku_1","qty":1,"price_cents":100}]}"#,
            status: StatusCode::BAD_REQUEST,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "missing idempotency header",
            key: None,
            status: StatusCode::BAD_REQUEST,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "idempotency store error",
            fail_idempotency: true,
            status: StatusCode::SERVICE_UNAVAILABLE,
            store_calls: 0,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "persistence error",
            fail_persistence: true,
            status: StatusCode::SERVICE_UNAVAILABLE,
            store_calls: 1,
            publish_calls: 0,
            ..base
        },
        Case {
            name: "publish error",
            fail_publish: true,
            status: StatusCode::SERVICE_UNAVAILABLE,
            store_calls: 1,
            publish_calls: 1,
            ..base
        },
        Case {
            name: "valid with quantity and unit_price",
            ..base
        },
        Case {
            name: "valid with qty and price_cents",
            body: r#"{"user_id":"u_1","items":[{"sku":"sku_1","qty":3,"price_cents":100}],"currency":"EUR"}"#,
            ..base
        },
    ];

    for case in cases {
        let app = test_app();
        app.idempotency.fail_with_error(case.fail_idempotency);
        app.orders.fail_with_error(case.fail_persistence);
        app.publisher.fail_with_error(case.fail_publish);

        let (status, _, _) = send(&app.router, order_request(case.body, case.key)).await;

        assert_eq!(status, case.status, "{}: status", case.name);
        assert_eq!(app.orders.calls(), case.store_calls, "{}: store calls", case.name);
        assert_eq!(app.publisher.calls(), case.publish_calls, "{}: publish calls", case.name);
    }
}

#[tokio::test]
async fn duplicate_key_returns_conflict() {
    let app = test_app();

    let (first, headers, body) = send(&app.router, order_request(VALID_BODY, Some("idem-1"))).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "created");
    let order_id = json["order_id"].as_str().unwrap();
    assert_eq!(order_id.len(), 32);
    assert!(order_id.chars().all(|c| c.is_ascii_hexdigit()));

    let (second, headers, body) = send(&app.router, order_request(VALID_BODY, Some("idem-1"))).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(String::from_utf8(body).unwrap(), "duplicate request");

    assert_eq!(app.orders.calls(), 1);
    assert_eq!(app.publisher.calls(), 1);
    assert_eq!(app.metrics.counter("create_order_requests_total"), 2);
    assert_eq!(app.metrics.counter("create_order_success_total"), 1);
    assert_eq!(app.metrics.counter("create_order_duplicates_total"), 1);
}

#[tokio::test]
async fn error_bodies_are_plain_text() {
    let app = test_app();

    let (status, _, body) = send(&app.router, order_request(VALID_BODY, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "missing Idempotency-Key header");

    let (_, _, body) = send(&app.router, order_request("not json", Some("k"))).await;
    assert_eq!(String::from_utf8(body).unwrap(), "invalid json");

    app.idempotency.fail_with_error(true);
    let (_, _, body) = send(&app.router, order_request(VALID_BODY, Some("k"))).await;
    assert_eq!(String::from_utf8(body).unwrap(), "idempotency check failed");
}

#[tokio::test]
async fn event_carries_request_id_and_server_total() {
    let app = test_app();
    let body = r#"{"user_id":"u_1","currency":"USD","items":[
        {"sku":"a","qty":1,"price_cents":100,"quantity":2,"unit_price":50},
        {"sku":"b","qty":3,"price_cents":10}
    ]}"#;

    let mut request = order_request(body, Some("k"));
    request.headers_mut().insert("X-Request-Id", "  req-42 ".parse().unwrap());
    let (status, headers, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers["x-request-id"], "req-42");

    let events: Vec<OrdersCreatedEvent> = app.publisher.published();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "OrdersCreated");
    assert_eq!(events[0].version, 1);
    assert_eq!(events[0].request_id, "req-42");
    assert_eq!(events[0].user_id, "u_1");
    assert_eq!(events[0].total_cents, 130);
}

#[tokio::test]
async fn generated_request_id_reaches_event() {
    let app = test_app();

    let (_, headers, _) = send(&app.router, order_request(VALID_BODY, Some("k"))).await;

    let echoed = headers["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(echoed.len(), 32);
    assert_eq!(app.publisher.published()[0].request_id, echoed);
}

#[tokio::test]
async fn unconfigured_service_is_unavailable() {
    let metrics = Arc::new(MetricsRegistry::new("pulsecart_orders"));
    let router = build_router(AppState::new(OrderService::new(Arc::clone(&metrics))));

    let (status, _, body) = send(&router, order_request(VALID_BODY, Some("k"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(String::from_utf8(body).unwrap(), "idempotency store not configured");
    assert_eq!(metrics.counter("create_order_service_errors_total"), 1);
}

#[tokio::test]
async fn health_checks_and_metrics() {
    let app = test_app();
    send(&app.router, order_request(VALID_BODY, Some("k"))).await;

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, _, body) = send(&app.router, get("/healthz")).await;
    assert_eq!((status, body.as_slice()), (StatusCode::OK, b"ok".as_slice()));

    let (status, _, body) = send(&app.router, get("/readyz")).await;
    assert_eq!((status, body.as_slice()), (StatusCode::OK, b"ready".as_slice()));

    let (status, headers, body) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; version=0.0.4");
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("pulsecart_orders_create_order_success_total 1"));
    assert!(text.contains("pulsecart_orders_create_order_duration_seconds_count 1"));
}

#[tokio::test]
async fn get_on_orders_is_not_allowed() {
    let app = test_app();
    let request = Request::builder().uri("/v1/orders").body(Body::empty()).unwrap();

    let (status, _, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(app.idempotency.reserved_keys().is_empty());
}
