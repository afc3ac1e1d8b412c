//! Service-wide error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::product::ProductKind;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested product type is outside the known set.
    #[error("invalid product type: {0:?} (expected one of: book, musicalbum, softwarelicense)")]
    InvalidProductKind(String),

    /// Quantities below one are rejected before any catalog lookup.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    /// The (kind, id) pair does not resolve in the catalog.
    #[error("{kind} with id {id} does not exist")]
    ProductNotFound { kind: ProductKind, id: Uuid },

    /// Missing cart, or a cart the caller may not touch.
    #[error("cart not found")]
    CartNotFound,

    /// A directly requested resource that does not exist.
    #[error("not found")]
    NotFound,

    /// Removal requested for a product that is not in the cart.
    #[error("product not found in cart")]
    ProductNotInCart,

    /// The gateway did not assert a usable caller identity.
    #[error("missing or invalid caller identity")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::InvalidProductKind(_)
            | StoreError::InvalidQuantity(_)
            | StoreError::ProductNotFound { .. }
            | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::CartNotFound | StoreError::ProductNotInCart | StoreError::NotFound => {
                StatusCode::NOT_FOUND
            }
            StoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
