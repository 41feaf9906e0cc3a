//! `POST /v1/notify`.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::{AppError, RequestId, WebResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Body of a `202 Accepted` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    /// Always `"accepted"`.
    pub status: String,
}

impl NotifyResponse {
    /// The only response this service sends on success.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }
}

/// Why a notification was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// Body is not a JSON notification.
    #[error("invalid json")]
    InvalidJson,
    /// `order_id` missing or blank.
    #[error("missing order_id")]
    MissingOrderId,
    /// `user_id` missing or blank.
    #[error("missing user_id")]
    MissingUserId,
    /// `currency` missing or blank.
    #[error("missing currency")]
    MissingCurrency,
    /// `total_cents` missing, zero or negative.
    #[error("missing or invalid total_cents")]
    InvalidTotal,
}

impl From<NotifyError> for AppError {
    fn from(err: NotifyError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// Check the fields a notification must carry.
///
/// # Errors
///
/// Returns the first missing or invalid field.
pub fn validate(event: &OrdersCreatedEvent) -> Result<(), NotifyError> {
    if event.order_id.trim().is_empty() {
        return Err(NotifyError::MissingOrderId);
    }
    if event.user_id.trim().is_empty() {
        return Err(NotifyError::MissingUserId);
    }
    if event.currency.trim().is_empty() {
        return Err(NotifyError::MissingCurrency);
    }
    if event.total_cents <= 0 {
        return Err(NotifyError::InvalidTotal);
    }
    Ok(())
}

/// Accept an order-created notification.
///
/// ```text
/// POST /v1/notify
/// {"order_id":"...","user_id":"u_1","total_cents":3000,"currency":"USD", ...}
///
/// 202 {"status":"accepted"}
/// ```
pub async fn notify(
    State(metrics): State<Arc<MetricsRegistry>>,
    request_id: RequestId,
    body: Bytes,
) -> WebResult<(StatusCode, Json<NotifyResponse>)> {
    metrics.inc("notify_requests_total");

    let result = serde_json::from_slice::<OrdersCreatedEvent>(&body)
        .map_err(|_| NotifyError::InvalidJson)
        .and_then(|event| validate(&event).map(|()| event));

    let event = match result {
        Ok(event) => event,
        Err(e) => {
            metrics.inc("notify_rejected_total");
            return Err(e.into());
        },
    };

    tracing::info!(
        request_id = %request_id,
        order_id = %event.order_id,
        user_id = %event.user_id,
        event_request_id = %event.request_id,
        total_cents = event.total_cents,
        currency = %event.currency,
        "Notification accepted"
    );
    metrics.inc("notify_accepted_total");

    Ok((StatusCode::ACCEPTED, Json(NotifyResponse::accepted())))
}
