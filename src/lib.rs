//! Storefront: media e-commerce backend.
//!
//! Sells three unrelated product kinds (books, music albums, software
//! licenses) with one shopping cart per user and a recommendation engine
//! that mines the order products land in carts to answer "what is usually
//! added right before this one".
//!
//! ## Layout
//! - [`domain`]: pure types and algorithms (product kinds, cart totals,
//!   sequence mining) with no I/O
//! - [`service`]: Postgres-backed catalog, cart service, and
//!   recommendation engine
//! - [`api`]: axum handlers and the router

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;

use sqlx::PgPool;

use service::cart::CartService;
use service::catalog::Catalog;
use service::recommendation::RecommendationEngine;

/// Shared handler state. Everything in here is a cheap clone around the
/// same connection pool.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub catalog: Catalog,
    pub carts: CartService,
    pub recommendations: RecommendationEngine,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let catalog = Catalog::new(db.clone());
        let carts = CartService::new(db.clone(), catalog.clone());
        let recommendations = RecommendationEngine::new(db.clone(), catalog.clone());
        Self { db, catalog, carts, recommendations }
    }
}
