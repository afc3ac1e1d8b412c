//! HTTP surface: router, handlers, and the caller-identity extractor.

pub mod carts;
pub mod identity;
pub mod products;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products/:kind", get(products::list_products))
        .route("/api/v1/products/:kind/:id", get(products::get_product))
        .route("/api/v1/carts/my-cart", get(carts::my_cart))
        .route("/api/v1/carts/recommendations", get(carts::recommendations))
        .route("/api/v1/carts/:cart_id/add-product", post(carts::add_product))
        .route("/api/v1/carts/:cart_id/remove-product", post(carts::remove_product))
        .route("/api/v1/carts/:cart_id/totals", get(carts::totals))
        .route("/api/v1/carts/:cart_id/clear", delete(carts::clear))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "storefront"}))
}
