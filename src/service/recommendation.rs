//! Read-side recommendation engine.
//!
//! A pure batch computation over a point-in-time snapshot of cart items;
//! it takes no locks and runs safely alongside cart mutations. Results
//! may trail writes that commit after the read began.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::product::{Product, ProductKey, ProductKind};
use crate::domain::recommendation::{ItemEvent, TransitionCounts};
use crate::error::StoreError;
use crate::service::catalog::Catalog;

/// Which carts a recommendation query may read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    AllUsers,
    User(Uuid),
}

impl Scope {
    /// Callers only widen their scope with privilege: `all_users` needs a
    /// privileged caller, and `user_id` must name the caller themself or
    /// come from a privileged caller. Anything else silently narrows to
    /// the caller's own carts instead of erroring.
    pub fn resolve(
        caller_id: Uuid,
        privileged: bool,
        user_id: Option<Uuid>,
        all_users: bool,
    ) -> Scope {
        if all_users && privileged {
            return Scope::AllUsers;
        }
        match user_id {
            Some(target) if privileged || target == caller_id => Scope::User(target),
            _ => Scope::User(caller_id),
        }
    }
}

/// One "usually added before" entry. Every emitted row carries a
/// predecessor, since only products with at least one incoming edge are
/// reported; names degrade to a synthetic label when the product has been
/// deleted from the catalog.
#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    pub product_id: Uuid,
    pub product_type: ProductKind,
    pub product_name: String,
    pub most_common_previous_product_id: Uuid,
    pub most_common_previous_product_type: ProductKind,
    pub most_common_previous_product_name: String,
    pub occurrence_count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub total_carts_analyzed: i64,
    pub total_recommendations: usize,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    cart_id: Uuid,
    id: Uuid,
    product_kind: String,
    product_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RecommendationEngine {
    pool: PgPool,
    catalog: Catalog,
}

impl RecommendationEngine {
    pub fn new(pool: PgPool, catalog: Catalog) -> Self {
        Self { pool, catalog }
    }

    pub async fn report(&self, scope: Scope) -> Result<RecommendationReport, StoreError> {
        let (total_carts, rows) = self.snapshot(scope).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            // A row with an unknown tag cannot be mined; skip it rather
            // than fail everyone else's recommendations.
            let Some(kind) = ProductKind::parse(&row.product_kind) else {
                tracing::warn!(item_id = %row.id, tag = %row.product_kind, "skipping cart item with unknown product kind");
                continue;
            };
            events.push(ItemEvent {
                cart_id: row.cart_id,
                item_id: row.id,
                key: ProductKey::new(kind, row.product_id),
                added_at: row.created_at,
            });
        }

        let picks = TransitionCounts::from_events(events).most_common_predecessors();

        let mut keys: Vec<ProductKey> = picks
            .iter()
            .flat_map(|pick| [pick.current, pick.previous])
            .collect();
        keys.sort();
        keys.dedup();
        let products = self.catalog.find_many(&keys).await?;
        let name_of = |key: ProductKey| {
            products
                .get(&key)
                .map(Product::display_name)
                .unwrap_or_else(|| key.fallback_label())
        };

        let recommendations: Vec<Recommendation> = picks
            .into_iter()
            .map(|pick| Recommendation {
                product_id: pick.current.id,
                product_type: pick.current.kind,
                product_name: name_of(pick.current),
                most_common_previous_product_id: pick.previous.id,
                most_common_previous_product_type: pick.previous.kind,
                most_common_previous_product_name: name_of(pick.previous),
                occurrence_count: pick.occurrences,
            })
            .collect();

        tracing::info!(
            carts = total_carts,
            recommendations = recommendations.len(),
            "recommendation report computed"
        );

        Ok(RecommendationReport {
            total_recommendations: recommendations.len(),
            recommendations,
            total_carts_analyzed: total_carts,
        })
    }

    async fn snapshot(&self, scope: Scope) -> Result<(i64, Vec<EventRow>), StoreError> {
        match scope {
            Scope::AllUsers => {
                let carts: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts")
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query_as::<_, EventRow>(
                    "SELECT cart_id, id, product_kind, product_id, created_at FROM cart_items",
                )
                .fetch_all(&self.pool)
                .await?;
                Ok((carts.0, rows))
            }
            Scope::User(user_id) => {
                let carts: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query_as::<_, EventRow>(
                    "SELECT ci.cart_id, ci.id, ci.product_kind, ci.product_id, ci.created_at \
                     FROM cart_items ci \
                     JOIN carts c ON c.id = ci.cart_id \
                     WHERE c.user_id = $1",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
                Ok((carts.0, rows))
            }
        }
    }
}
