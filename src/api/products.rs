//! Read-only catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::{Product, ProductKey, ProductKind};
use crate::error::StoreError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

fn parse_kind(tag: &str) -> Result<ProductKind, StoreError> {
    ProductKind::parse(tag).ok_or_else(|| StoreError::InvalidProductKind(tag.to_string()))
}

/// GET /api/v1/products/:kind
pub async fn list_products(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, StoreError> {
    let kind = parse_kind(&kind)?;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).min(100);
    let (products, total) = state.catalog.list(kind, page, per_page).await?;
    Ok(Json(PaginatedResponse { data: products, total, page }))
}

/// GET /api/v1/products/:kind/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Product>, StoreError> {
    let kind = parse_kind(&kind)?;
    let key = ProductKey::new(kind, id);
    state.catalog.find(key).await?.map(Json).ok_or(StoreError::NotFound)
}
