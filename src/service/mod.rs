//! Postgres-backed services: catalog resolution, cart mutation, and the
//! recommendation engine.

pub mod cart;
pub mod catalog;
pub mod recommendation;

pub use cart::{CartItemRow, CartRow, CartService, RemoveOutcome};
pub use catalog::Catalog;
pub use recommendation::{Recommendation, RecommendationEngine, RecommendationReport, Scope};
