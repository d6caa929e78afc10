//! Invoice endpoints. Staff own the full lifecycle; customers get a
//! read-only view of their own invoices.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bson::DateTime;
use validator::Validate;

use crate::dtos::{
    InvoiceCreate, InvoiceListQuery, InvoiceListResponse, InvoiceResponse, InvoiceUpdate,
    UpdateStatusRequest,
};
use crate::error::AppError;
use crate::handlers::parse_oid;
use crate::middleware::{AdminUser, CustomerUser, StaffUser};
use crate::models::InvoiceFilter;
use crate::services::InvoiceStatistics;
use crate::AppState;

pub async fn create_invoice(
    State(state): State<AppState>,
    _staff: StaffUser,
    Json(payload): Json<InvoiceCreate>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;

    let invoice = state.invoices.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    _staff: StaffUser,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<InvoiceListResponse>, AppError> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 200);
    let skip = (page - 1) * page_size as u64;

    let filter = InvoiceFilter {
        customer_id: query.customer_id,
        status: query.status,
        min_total: query.min_total,
        max_total: query.max_total,
        min_date: query.min_date.map(DateTime::from_chrono),
        max_date: query.max_date.map(DateTime::from_chrono),
    };

    let (invoices, total) = state.invoices.list(&filter, skip, page_size).await?;
    let total_pages = (total + page_size as u64 - 1) / page_size as u64;

    Ok(Json(InvoiceListResponse {
        invoices,
        total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let oid = parse_oid(&id)?;
    Ok(Json(state.invoices.get_by_id(&oid).await?))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<InvoiceUpdate>,
) -> Result<Json<InvoiceResponse>, AppError> {
    payload.validate()?;

    let oid = parse_oid(&id)?;
    Ok(Json(state.invoices.update(&oid, &payload).await?))
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let oid = parse_oid(&id)?;
    Ok(Json(state.invoices.update_status(&oid, payload.status).await?))
}

/// Deletion restores stock but never reverses wallet movements; admins only.
pub async fn delete_invoice(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let oid = parse_oid(&id)?;
    state.invoices.delete(&oid).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn customer_invoices(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    Ok(Json(state.invoices.for_customer(&customer_id).await?))
}

/// Customer self-service view of their own invoices.
pub async fn my_invoices(
    State(state): State<AppState>,
    customer: CustomerUser,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    Ok(Json(
        state.invoices.for_customer(&customer.0.principal.id).await?,
    ))
}

pub async fn invoice_statistics(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<InvoiceStatistics>, AppError> {
    Ok(Json(state.invoices.statistics().await?))
}
