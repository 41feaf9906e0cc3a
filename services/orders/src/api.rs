//! `POST /v1/orders`.

use crate::server::AppState;
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use pulsecart_core::order::CreateOrderResponse;
use pulsecart_web::{IdempotencyKey, RequestId, WebResult};

/// Create an order.
///
/// ```text
/// POST /v1/orders
/// Idempotency-Key: idem-1
/// Content-Type: application/json
///
/// {"user_id":"u_1","currency":"USD","items":[{"sku":"sku_1","quantity":2,"unit_price":1500}]}
/// ```
///
/// Answers `201 {"order_id":"...","status":"created"}`; failures are plain
/// text with 400, 409 or 503.
pub async fn create_order(
    State(state): State<AppState>,
    request_id: RequestId,
    IdempotencyKey(key): IdempotencyKey,
    body: Bytes,
) -> WebResult<(StatusCode, Json<CreateOrderResponse>)> {
    let response = state
        .service
        .create_order(&body, key.as_deref(), request_id.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
