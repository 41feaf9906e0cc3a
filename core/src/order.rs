//! Order request model and validation.
//!
//! Clients may describe line items with either of two field-name pairs:
//! `{qty, price_cents}` or `{quantity, unit_price}`. Requests are first parsed
//! into a permissive [`CreateOrderRequest`] where every field is optional, then
//! [`CreateOrderRequest::validate`] resolves each [`RawOrderItem`] into a
//! canonical [`OrderItem`].
//!
//! # Precedence
//!
//! `quantity` wins over `qty` whenever it is present and positive, and
//! `unit_price` wins over `price_cents` under the same rule. The two fields of
//! a pair are resolved independently.
//!
//! ```
//! use pulsecart_core::order::RawOrderItem;
//!
//! let raw: RawOrderItem = serde_json::from_str(
//!     r#"{"sku":"sku_1","qty":1,"price_cents":100,"quantity":2,"unit_price":50}"#,
//! ).unwrap();
//! let item = raw.resolve();
//! assert_eq!((item.qty, item.price_cents), (2, 50));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Stock keeping unit.
    pub sku: String,
    /// Quantity ordered.
    pub qty: i64,
    /// Unit price in minor currency units.
    pub price_cents: i64,
}

/// Line item as supplied by the client, before field-name resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOrderItem {
    /// Stock keeping unit.
    pub sku: String,
    /// Legacy quantity field.
    pub qty: Option<i64>,
    /// Legacy unit price field.
    pub price_cents: Option<i64>,
    /// Preferred quantity field.
    pub quantity: Option<i64>,
    /// Preferred unit price field.
    pub unit_price: Option<i64>,
}

impl RawOrderItem {
    /// Resolve the dual field-name schema into a canonical [`OrderItem`].
    ///
    /// Item contents are not validated: a blank SKU or a zero price is
    /// stored as given.
    #[must_use]
    pub fn resolve(self) -> OrderItem {
        OrderItem {
            qty: prefer_positive(self.quantity, self.qty),
            price_cents: prefer_positive(self.unit_price, self.price_cents),
            sku: self.sku,
        }
    }
}

fn prefer_positive(preferred: Option<i64>, fallback: Option<i64>) -> i64 {
    match preferred {
        Some(value) if value > 0 => value,
        _ => fallback.unwrap_or(0),
    }
}

/// Body of `POST /v1/orders`, parsed permissively.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    /// Customer placing the order.
    pub user_id: String,
    /// Line items in client order.
    pub items: Vec<RawOrderItem>,
    /// ISO currency code.
    pub currency: String,
}

/// An order request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Customer placing the order.
    pub user_id: String,
    /// Resolved line items.
    pub items: Vec<OrderItem>,
    /// ISO currency code.
    pub currency: String,
    /// Server-computed total.
    pub total_cents: i64,
}

impl CreateOrderRequest {
    /// Validate the request and resolve its items.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first problem found.
    pub fn validate(self) -> Result<ValidatedOrder, ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingUserId);
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingCurrency);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let items: Vec<OrderItem> = self.items.into_iter().map(RawOrderItem::resolve).collect();

        let total_cents = compute_total_cents(&items).ok_or(ValidationError::TotalOverflow)?;

        Ok(ValidatedOrder {
            user_id: self.user_id,
            items,
            currency: self.currency,
            total_cents,
        })
    }
}

/// Sum of `qty * price_cents` over all items.
///
/// Returns `None` if the arithmetic overflows `i64`.
#[must_use]
pub fn compute_total_cents(items: &[OrderItem]) -> Option<i64> {
    items.iter().try_fold(0_i64, |total, item| {
        item.qty
            .checked_mul(item.price_cents)
            .and_then(|line| total.checked_add(line))
    })
}

/// Response body of a successful `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    /// Server-generated order ID.
    pub order_id: String,
    /// Always `"created"`.
    pub status: String,
}

impl CreateOrderResponse {
    /// Response for a freshly created order.
    #[must_use]
    pub fn created(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: "created".to_string(),
        }
    }
}

/// Reasons an order request is rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `user_id` missing or blank.
    #[error("missing user_id")]
    MissingUserId,

    /// `currency` missing or blank.
    #[error("missing currency")]
    MissingCurrency,

    /// `items` missing or empty.
    #[error("missing items")]
    NoItems,

    /// Order total does not fit in 64 bits.
    #[error("order total out of range")]
    TotalOverflow,
}
