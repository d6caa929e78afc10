//! Product endpoints. Reads are open to any authenticated caller so the
//! storefront can browse; writes are staff operations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bson::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::{ProductCreate, ProductResponse, StockUpdateRequest};
use crate::error::AppError;
use crate::handlers::parse_oid;
use crate::middleware::{AdminUser, CurrentUser, StaffUser};
use crate::models::Product;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: i64,
}

pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    payload.validate()?;

    let now = DateTime::now();
    let product = Product {
        id: None,
        product_id: payload.product_id,
        name: payload.name,
        selling_price: payload.selling_price,
        buying_price: payload.buying_price,
        quantity: payload.quantity,
        category_id: payload.category_id,
        discount: payload.discount,
        sku: payload.sku,
        expiry_date: payload.expiry_date.map(DateTime::from_chrono),
        is_active: true,
        created_at: now,
        updated_at: None,
    };

    let product = state.catalog.create_product(product).await?;
    tracing::info!(name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn list_products(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 200);
    let skip = (page - 1) * page_size as u64;

    let (products, total) = state.catalog.list_products(skip, page_size).await?;
    Ok(Json(ProductListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let oid = parse_oid(&id)?;
    let product = state
        .catalog
        .find_product(&oid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", id)))?;
    Ok(Json(ProductResponse::from(product)))
}

/// Overwrite the absolute stock count for one product.
pub async fn update_stock(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    payload.validate()?;

    let oid = parse_oid(&id)?;
    let product = state.catalog.set_product_stock(&oid, payload.quantity).await?;
    tracing::info!(product_id = %id, quantity = payload.quantity, "Stock updated");
    Ok(Json(ProductResponse::from(product)))
}
