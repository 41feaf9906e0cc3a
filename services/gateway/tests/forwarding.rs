//! Gateway behaviour against a stub orders service.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, StatusCode as AxumStatus},
    response::IntoResponse,
    routing::post,
};
use http::{Request, StatusCode, header};
use pulsecart_gateway::{AppState, OrdersForwarder, UpstreamConfig, build_router};
use pulsecart_runtime::MetricsRegistry;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Debug, Clone, Default)]
struct Seen {
    headers: Vec<HeaderMap>,
    bodies: Vec<String>,
}

async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Upstream that records what it receives and answers 201 JSON.
async fn recording_upstream() -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let sink = Arc::clone(&seen);
    let app = Router::new().route(
        "/v1/orders",
        post(move |headers: HeaderMap, body: String| {
            let sink = Arc::clone(&sink);
            async move {
                let mut seen = sink.lock().unwrap();
                seen.headers.push(headers);
                seen.bodies.push(body);
                (
                    AxumStatus::CREATED,
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"order_id":"abc","status":"created"}"#,
                )
            }
        }),
    );
    (spawn_upstream(app).await, seen)
}

fn gateway(orders_url: &str, request_timeout: Duration, upstream_timeout: Duration) -> (Router, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new("pulsecart_gateway"));
    let config = UpstreamConfig {
        orders_url: orders_url.to_string(),
        request_timeout,
        upstream_timeout,
    };
    let forwarder = OrdersForwarder::new(&config, Arc::clone(&metrics)).unwrap();
    let router = build_router(AppState {
        forwarder: Arc::new(forwarder),
        metrics: Arc::clone(&metrics),
    });
    (router, metrics)
}

fn order_request() -> http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Idempotency-Key", "idem-1")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn forwards_allow_listed_headers_and_body() {
    let (upstream, seen) = recording_upstream().await;
    let (router, metrics) = gateway(&upstream, Duration::from_secs(5), Duration::from_secs(3));

    let request = order_request()
        .header("X-Request-Id", "req-7")
        .header("Authorization", "Bearer secret")
        .header("X-Custom", "nope")
        .body(Body::from(r#"{"user_id":"u_1"}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()["x-request-id"], "req-7");
    assert_eq!(body_string(response).await, r#"{"order_id":"abc","status":"created"}"#);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.bodies, vec![r#"{"user_id":"u_1"}"#.to_string()]);
    let headers = &seen.headers[0];
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["idempotency-key"], "idem-1");
    assert_eq!(headers["x-request-id"], "req-7");
    assert!(headers.get("authorization").is_none());
    assert!(headers.get("x-custom").is_none());

    assert_eq!(metrics.counter("http_requests_total"), 1);
    assert_eq!(metrics.counter("http_response_status_201_total"), 1);
    assert_eq!(metrics.counter("orders_forward_requests_total"), 1);
    assert_eq!(metrics.duration_count("http_request_duration"), 1);
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let (upstream, seen) = recording_upstream().await;
    let (router, _) = gateway(&upstream, Duration::from_secs(5), Duration::from_secs(3));

    let response = router
        .oneshot(order_request().body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    let echoed = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(echoed.len(), 32);
    assert!(echoed.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(seen.lock().unwrap().headers[0]["x-request-id"], echoed.as_str());
}

#[tokio::test]
async fn upstream_status_and_body_pass_through() {
    let app = Router::new().route(
        "/v1/orders",
        post(|| async { (AxumStatus::CONFLICT, "duplicate request").into_response() }),
    );
    let upstream = spawn_upstream(app).await;
    let (router, metrics) = gateway(&upstream, Duration::from_secs(5), Duration::from_secs(3));

    let response = router
        .oneshot(order_request().body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(body_string(response).await, "duplicate request");
    assert_eq!(metrics.counter("http_response_status_409_total"), 1);
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let app = Router::new().route(
        "/v1/orders",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            AxumStatus::CREATED
        }),
    );
    let upstream = spawn_upstream(app).await;
    let (router, metrics) = gateway(&upstream, Duration::from_secs(5), Duration::from_millis(100));

    let response = router
        .oneshot(order_request().body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_string(response).await, "upstream timeout");
    assert_eq!(metrics.counter("orders_forward_timeouts_total"), 1);
    assert_eq!(metrics.counter("http_response_status_504_total"), 1);
}

#[tokio::test]
async fn request_deadline_also_times_out() {
    let app = Router::new().route(
        "/v1/orders",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            AxumStatus::CREATED
        }),
    );
    let upstream = spawn_upstream(app).await;
    let (router, _) = gateway(&upstream, Duration::from_millis(100), Duration::from_secs(3));

    let response = router
        .oneshot(order_request().body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (router, metrics) = gateway(&format!("http://{addr}"), Duration::from_secs(5), Duration::from_secs(3));

    let response = router
        .oneshot(order_request().body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_string(response).await, "upstream request failed");
    assert_eq!(metrics.counter("orders_forward_errors_total"), 1);
}

#[tokio::test]
async fn health_checks_and_metrics() {
    let (router, _) = gateway("http://127.0.0.1:1", Duration::from_secs(5), Duration::from_secs(3));

    for (uri, expected) in [("/healthz", "ok"), ("/readyz", "ready")] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, expected);
    }

    let response = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = body_string(response).await;
    assert!(text.contains("pulsecart_gateway_http_requests_total 2"));
    assert!(text.contains("pulsecart_gateway_http_response_status_200_total 2"));
}
