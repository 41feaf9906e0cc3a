//! Custom Axum extractors.
//!
//! - [`RequestId`]: the ID assigned by the request-id middleware, or one read
//!   from the header (generated if absent) when the middleware is not installed
//! - [`IdempotencyKey`]: the trimmed `Idempotency-Key` header, if any
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(request_id: RequestId, key: IdempotencyKey) -> String {
//!     format!("{request_id} {:?}", key.0)
//! }
//! ```

use crate::middleware::{RequestId, request_id_from_headers};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use pulsecart_core::ids::new_request_id;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<Self>() {
            return Ok(existing.clone());
        }

        let id = request_id_from_headers(&parts.headers).unwrap_or_else(new_request_id);
        Ok(Self(id))
    }
}

/// Trimmed `Idempotency-Key` header; `None` when absent or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract<T: FromRequestParts<()>>(request: Request<()>) -> T
    where
        T::Rejection: std::fmt::Debug,
    {
        let (mut parts, ()) = request.into_parts();
        T::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn idempotency_key_is_trimmed() {
        let request = Request::builder().header("Idempotency-Key", " idem-1 ").body(()).unwrap();
        let key: IdempotencyKey = extract(request).await;
        assert_eq!(key.0.as_deref(), Some("idem-1"));
    }

    #[tokio::test]
    async fn blank_idempotency_key_is_none() {
        let request = Request::builder().header("Idempotency-Key", "  ").body(()).unwrap();
        let key: IdempotencyKey = extract(request).await;
        assert_eq!(key.0, None);

        let key: IdempotencyKey = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(key.0, None);
    }

    #[tokio::test]
    async fn request_id_prefers_extension() {
        let mut request = Request::builder().header("X-Request-Id", "from-header").body(()).unwrap();
        request.extensions_mut().insert(RequestId("from-layer".to_string()));
        let id: RequestId = extract(request).await;
        assert_eq!(id.as_str(), "from-layer");
    }

    #[tokio::test]
    async fn request_id_falls_back_to_header_then_generates() {
        let request = Request::builder().header("X-Request-Id", "abc").body(()).unwrap();
        let id: RequestId = extract(request).await;
        assert_eq!(id.as_str(), "abc");

        let id: RequestId = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(id.as_str().len(), 32);
    }
}
