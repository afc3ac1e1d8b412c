//! Cart endpoints: get-or-create, add/remove product, totals, clear, and
//! the recommendation report.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::identity::Caller;
use crate::domain::cart::{CartLine, CartView};
use crate::domain::product::{Product, ProductKey, ProductKind};
use crate::error::StoreError;
use crate::service::cart::RemoveOutcome;
use crate::service::recommendation::{RecommendationReport, Scope};
use crate::AppState;

/// Body of add-product and remove-product requests.
#[derive(Debug, Deserialize, Validate)]
pub struct ProductRefRequest {
    pub product_type: String,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

impl ProductRefRequest {
    fn key(&self) -> Result<ProductKey, StoreError> {
        ProductKind::parse(&self.product_type)
            .map(|kind| ProductKey::new(kind, self.product_id))
            .ok_or_else(|| StoreError::InvalidProductKind(self.product_type.clone()))
    }

    fn quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_type: ProductKind,
    pub product: Option<Product>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub unit_weight: Option<Decimal>,
    pub subtotal_price: Option<Decimal>,
    pub subtotal_weight: Option<Decimal>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItemResponse {
    fn from_line(line: CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.key.id,
            product_type: line.key.kind,
            quantity: line.quantity,
            unit_price: line.unit_price(),
            unit_weight: line.unit_weight(),
            subtotal_price: line.subtotal_price(),
            subtotal_weight: line.subtotal_weight(),
            available: line.is_available(),
            created_at: line.created_at,
            updated_at: line.updated_at,
            product: line.product,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub total_price: String,
    pub total_weight: String,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartResponse {
    pub fn from_view(view: CartView) -> Self {
        Self {
            id: view.id,
            user_id: view.user_id,
            total_price: view.total_price().to_string(),
            total_weight: view.total_weight().to_string(),
            item_count: view.item_count(),
            created_at: view.created_at,
            updated_at: view.updated_at,
            items: view.lines.into_iter().map(CartItemResponse::from_line).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub message: &'static str,
    pub cart: CartResponse,
}

#[derive(Debug, Serialize)]
pub struct CartTotalsResponse {
    pub cart_id: Uuid,
    pub total_price: String,
    pub total_weight: String,
    pub item_count: usize,
}

/// GET /api/v1/carts/my-cart: get-or-create the caller's own cart.
/// 201 when the cart was created by this request, 200 otherwise.
pub async fn my_cart(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<(StatusCode, Json<CartResponse>), StoreError> {
    let (cart, created) = state.carts.get_or_create(caller.user_id).await?;
    let view = state.carts.load_view(&cart).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(CartResponse::from_view(view))))
}

/// POST /api/v1/carts/:cart_id/add-product
pub async fn add_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_id): Path<Uuid>,
    Json(request): Json<ProductRefRequest>,
) -> Result<Json<CartMutationResponse>, StoreError> {
    request.validate()?;
    let key = request.key()?;
    let cart = state
        .carts
        .fetch_for(cart_id, caller.user_id, caller.is_privileged())
        .await?;
    state.carts.add_product(&cart, key, request.quantity()).await?;

    let view = state.carts.load_view(&cart).await?;
    Ok(Json(CartMutationResponse {
        message: "product added to cart",
        cart: CartResponse::from_view(view),
    }))
}

/// POST /api/v1/carts/:cart_id/remove-product. 404 when the product is
/// not in the cart, which leaves the cart untouched.
pub async fn remove_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_id): Path<Uuid>,
    Json(request): Json<ProductRefRequest>,
) -> Result<Json<CartMutationResponse>, StoreError> {
    request.validate()?;
    let key = request.key()?;
    let cart = state
        .carts
        .fetch_for(cart_id, caller.user_id, caller.is_privileged())
        .await?;

    match state.carts.remove_product(&cart, key, request.quantity()).await? {
        RemoveOutcome::NotInCart => Err(StoreError::ProductNotInCart),
        RemoveOutcome::Removed => {
            let view = state.carts.load_view(&cart).await?;
            Ok(Json(CartMutationResponse {
                message: "product removed from cart",
                cart: CartResponse::from_view(view),
            }))
        }
    }
}

/// GET /api/v1/carts/:cart_id/totals. Decimal-string totals over live
/// catalog prices.
pub async fn totals(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartTotalsResponse>, StoreError> {
    let cart = state
        .carts
        .fetch_for(cart_id, caller.user_id, caller.is_privileged())
        .await?;
    let view = state.carts.load_view(&cart).await?;
    Ok(Json(CartTotalsResponse {
        cart_id: view.id,
        total_price: view.total_price().to_string(),
        total_weight: view.total_weight().to_string(),
        item_count: view.item_count(),
    }))
}

/// DELETE /api/v1/carts/:cart_id/clear
pub async fn clear(
    State(state): State<AppState>,
    caller: Caller,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<CartMutationResponse>, StoreError> {
    let cart = state
        .carts
        .fetch_for(cart_id, caller.user_id, caller.is_privileged())
        .await?;
    state.carts.clear(&cart).await?;

    let view = state.carts.load_view(&cart).await?;
    Ok(Json(CartMutationResponse {
        message: "cart cleared",
        cart: CartResponse::from_view(view),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub all_users: bool,
}

/// GET /api/v1/carts/recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationReport>, StoreError> {
    let scope = Scope::resolve(
        caller.user_id,
        caller.is_privileged(),
        params.user_id,
        params.all_users,
    );
    let report = state.recommendations.report(scope).await?;
    Ok(Json(report))
}
