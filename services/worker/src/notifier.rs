//! [`Notifier`] implementations.

use futures::future::BoxFuture;
use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_core::notifier::{Notifier, NotifierError};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default client-level timeout for [`HttpNotifier`].
pub const DEFAULT_NOTIFIER_TIMEOUT: Duration = Duration::from_secs(3);

/// Posts events to the notifications service.
///
/// Only `202 Accepted` counts as delivered. There are no retries.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: Client,
    notify_url: String,
}

impl HttpNotifier {
    /// Notifier posting to `{base_url}/v1/notify` with a whole-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            notify_url: format!("{}/v1/notify", base_url.trim().trim_end_matches('/')),
        })
    }

    /// Full URL notifications are posted to.
    #[must_use]
    pub fn notify_url(&self) -> &str {
        &self.notify_url
    }
}

impl Notifier for HttpNotifier {
    fn notify_order_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), NotifierError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.notify_url)
                .json(event)
                .send()
                .await
                .map_err(|e| NotifierError::Transport(e.to_string()))?;

            match response.status() {
                StatusCode::ACCEPTED => Ok(()),
                status => Err(NotifierError::UnexpectedStatus(status.as_u16())),
            }
        })
    }
}

/// Logs the event and reports success. For running without a notifications
/// service.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_order_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), NotifierError>> {
        tracing::info!(
            order_id = %event.order_id,
            user_id = %event.user_id,
            request_id = %event.request_id,
            total_cents = event.total_cents,
            currency = %event.currency,
            "Order created notification"
        );
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    fn event() -> OrdersCreatedEvent {
        OrdersCreatedEvent {
            event_type: "OrdersCreated".to_string(),
            version: 1,
            order_id: "ord_1".to_string(),
            user_id: "u_1".to_string(),
            request_id: "req_1".to_string(),
            total_cents: 1200,
            currency: "USD".to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    async fn spawn_stub(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn accepted_is_success() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let app = Router::new().route(
            "/v1/notify",
            post(move |Json(event): Json<OrdersCreatedEvent>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(event);
                    AxumStatus::ACCEPTED
                }
            }),
        );
        let base = spawn_stub(app).await;

        let notifier = HttpNotifier::new(&format!("{base}/"), DEFAULT_NOTIFIER_TIMEOUT).unwrap();
        notifier.notify_order_created(&event()).await.unwrap();

        assert_eq!(notifier.notify_url(), format!("{base}/v1/notify"));
        assert_eq!(received.lock().unwrap().as_slice(), &[event()]);
    }

    #[tokio::test]
    async fn other_statuses_fail() {
        for status in [AxumStatus::OK, AxumStatus::INTERNAL_SERVER_ERROR] {
            let app = Router::new().route("/v1/notify", post(move || async move { status }));
            let base = spawn_stub(app).await;

            let notifier = HttpNotifier::new(&base, DEFAULT_NOTIFIER_TIMEOUT).unwrap();
            let err = notifier.notify_order_created(&event()).await.unwrap_err();

            assert!(matches!(err, NotifierError::UnexpectedStatus(code) if code == status.as_u16()));
        }
    }

    #[tokio::test]
    async fn slow_downstream_times_out() {
        let app = Router::new().route(
            "/v1/notify",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                AxumStatus::ACCEPTED
            }),
        );
        let base = spawn_stub(app).await;

        let notifier = HttpNotifier::new(&base, Duration::from_millis(100)).unwrap();
        let err = notifier.notify_order_created(&event()).await.unwrap_err();

        assert!(matches!(err, NotifierError::Transport(_)));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier.notify_order_created(&event()).await.unwrap();
    }
}
