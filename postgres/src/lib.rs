//! `PostgreSQL` order store for PulseCart.
//!
//! Implements [`OrderStore`] on top of a sqlx connection pool. Each order is
//! written in a single transaction: the header row in `orders` plus one row
//! per item in `order_items`. The total is recomputed from the items here,
//! never taken from the caller.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE orders (
//!     id TEXT PRIMARY KEY,
//!     user_id TEXT NOT NULL,
//!     total_cents BIGINT NOT NULL,
//!     currency TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE TABLE order_items (
//!     id BIGSERIAL PRIMARY KEY,
//!     order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
//!     sku TEXT NOT NULL,
//!     qty BIGINT NOT NULL,
//!     price_cents BIGINT NOT NULL
//! );
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pulsecart_postgres::PostgresOrderStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresOrderStore::connect("postgres://localhost/pulsecart", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use pulsecart_core::order::compute_total_cents;
use pulsecart_core::persistence::{CreateOrderParams, OrderStore, PersistedOrder, PersistenceError};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// `PostgreSQL`-backed [`OrderStore`].
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Connect to `database_url` with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DatabaseError`] if the pool cannot connect.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| PersistenceError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PersistenceError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_order(&self, params: CreateOrderParams) -> Result<PersistedOrder, PersistenceError> {
        if params.items.is_empty() {
            return Err(PersistenceError::NoItems);
        }
        let total_cents = compute_total_cents(&params.items).ok_or(PersistenceError::TotalOverflow)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistenceError::DatabaseError(format!("Failed to start transaction: {e}")))?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r"
            INSERT INTO orders (id, user_id, total_cents, currency)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            ",
        )
        .bind(&params.order_id)
        .bind(&params.user_id)
        .bind(total_cents)
        .bind(&params.currency)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PersistenceError::DatabaseError(format!("Failed to insert order: {e}")))?;

        for item in &params.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, sku, qty, price_cents)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(&params.order_id)
            .bind(&item.sku)
            .bind(item.qty)
            .bind(item.price_cents)
            .execute(&mut *tx)
            .await
            .map_err(|e| PersistenceError::DatabaseError(format!("Failed to insert order item: {e}")))?;
        }

        // Dropping `tx` on any error above rolls back.
        tx.commit()
            .await
            .map_err(|e| PersistenceError::DatabaseError(format!("Failed to commit transaction: {e}")))?;

        tracing::info!(
            order_id = %params.order_id,
            user_id = %params.user_id,
            items = params.items.len(),
            total_cents,
            "Order persisted"
        );

        Ok(PersistedOrder {
            order_id: params.order_id,
            user_id: params.user_id,
            total_cents,
            currency: params.currency,
            created_at,
        })
    }
}

impl OrderStore for PostgresOrderStore {
    fn create_order(&self, params: CreateOrderParams) -> BoxFuture<'_, Result<PersistedOrder, PersistenceError>> {
        Box::pin(self.insert_order(params))
    }
}
