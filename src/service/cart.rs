//! Cart mutation and hydration on top of Postgres.
//!
//! Every mutating call is one request-scoped unit of work. Merge-on-add
//! leans on the (cart, kind, id) unique constraint plus an upsert, so
//! concurrent adds for the same product can never produce duplicate rows;
//! removal runs as a single transaction with the row locked.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::cart::{remaining_quantity, CartLine, CartView};
use crate::domain::product::{ProductKey, ProductKind};
use crate::error::StoreError;
use crate::service::catalog::Catalog;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CartItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_kind: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItemRow {
    pub fn product_key(&self) -> Result<ProductKey, StoreError> {
        ProductKind::parse(&self.product_kind)
            .map(|kind| ProductKey::new(kind, self.product_id))
            .ok_or_else(|| StoreError::InvalidProductKind(self.product_kind.clone()))
    }
}

/// Whether `remove_product` actually removed anything. Absence is an
/// outcome callers branch on, not an error that unwinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotInCart,
}

#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
    catalog: Catalog,
}

impl CartService {
    pub fn new(pool: PgPool, catalog: Catalog) -> Self {
        Self { pool, catalog }
    }

    /// One active cart per user. The unique constraint on user_id makes
    /// this race-safe: concurrent first requests converge on the same row.
    /// Returns the cart and whether it was created just now.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<(CartRow, bool), StoreError> {
        let inserted = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (id, user_id, created_at, updated_at) \
             VALUES ($1, $2, NOW(), NOW()) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING id, user_id, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(cart) = inserted {
            tracing::info!(cart_id = %cart.id, user_id = %user_id, "cart created");
            return Ok((cart, true));
        }

        let cart = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((cart, false))
    }

    /// Load a cart the caller is allowed to touch. A cart owned by someone
    /// else reads the same as a missing one.
    pub async fn fetch_for(
        &self,
        cart_id: Uuid,
        caller_id: Uuid,
        privileged: bool,
    ) -> Result<CartRow, StoreError> {
        let cart = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(cart_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::CartNotFound)?;

        if cart.user_id != caller_id && !privileged {
            return Err(StoreError::CartNotFound);
        }
        Ok(cart)
    }

    /// Add `quantity` units of a product to the cart. Validation runs
    /// before any lookup or write. If the cart already holds this
    /// (kind, id), the quantities merge; created_at is set only on insert
    /// so quantity bumps never reorder the item for mining.
    pub async fn add_product(
        &self,
        cart: &CartRow,
        key: ProductKey,
        quantity: i32,
    ) -> Result<CartItemRow, StoreError> {
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        if self.catalog.find(key).await?.is_none() {
            return Err(StoreError::ProductNotFound { kind: key.kind, id: key.id });
        }

        let item = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_items (id, cart_id, product_kind, product_id, quantity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             ON CONFLICT (cart_id, product_kind, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
             RETURNING id, cart_id, product_kind, product_id, quantity, created_at, updated_at",
        )
        .bind(Uuid::now_v7())
        .bind(cart.id)
        .bind(key.kind.as_str())
        .bind(key.id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(cart_id = %cart.id, product = %key, quantity, "product added to cart");
        Ok(item)
    }

    /// Remove up to `quantity` units of a product from the cart. Dropping
    /// the quantity to zero or below deletes the row outright.
    pub async fn remove_product(
        &self,
        cart: &CartRow,
        key: ProductKey,
        quantity: i32,
    ) -> Result<RemoveOutcome, StoreError> {
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        if self.catalog.find(key).await?.is_none() {
            return Err(StoreError::ProductNotFound { kind: key.kind, id: key.id });
        }

        let mut tx = self.pool.begin().await?;
        let existing: Option<(Uuid, i32)> = sqlx::query_as(
            "SELECT id, quantity FROM cart_items \
             WHERE cart_id = $1 AND product_kind = $2 AND product_id = $3 \
             FOR UPDATE",
        )
        .bind(cart.id)
        .bind(key.kind.as_str())
        .bind(key.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((item_id, current)) = existing else {
            return Ok(RemoveOutcome::NotInCart);
        };

        match remaining_quantity(current, quantity) {
            Some(left) => {
                sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
                    .bind(item_id)
                    .bind(left)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                sqlx::query("DELETE FROM cart_items WHERE id = $1")
                    .bind(item_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;

        tracing::info!(cart_id = %cart.id, product = %key, quantity, "product removed from cart");
        Ok(RemoveOutcome::Removed)
    }

    /// Delete every item in the cart. Idempotent.
    pub async fn clear(&self, cart: &CartRow) -> Result<u64, StoreError> {
        let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        tracing::info!(cart_id = %cart.id, deleted, "cart cleared");
        Ok(deleted)
    }

    /// Hydrate the cart against the live catalog, items in insertion
    /// order. Items whose product has been deleted come back with
    /// `product: None` rather than being dropped from the listing.
    pub async fn load_view(&self, cart: &CartRow) -> Result<CartView, StoreError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_kind, product_id, quantity, created_at, updated_at \
             FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id",
        )
        .bind(cart.id)
        .fetch_all(&self.pool)
        .await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            keys.push(row.product_key()?);
        }
        let products = self.catalog.find_many(&keys).await?;

        let lines = rows
            .into_iter()
            .zip(keys)
            .map(|(row, key)| CartLine {
                id: row.id,
                key,
                product: products.get(&key).cloned(),
                quantity: row.quantity,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect();

        let view = CartView {
            id: cart.id,
            user_id: cart.user_id,
            lines,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        };
        if view.has_unavailable_lines() {
            tracing::warn!(cart_id = %cart.id, "cart references products no longer in the catalog");
        }
        Ok(view)
    }
}
