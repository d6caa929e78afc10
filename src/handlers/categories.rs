//! Category endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::DateTime;
use validator::Validate;

use crate::dtos::{CategoryCreate, CategoryResponse};
use crate::error::AppError;
use crate::handlers::parse_oid;
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::Category;
use crate::AppState;

pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    payload.validate()?;

    let category = Category {
        id: None,
        name: payload.name,
        description: payload.description,
        is_active: true,
        created_at: DateTime::now(),
        updated_at: None,
    };
    let category = state.catalog.create_category(category).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Refused with 409 while active products still reference the category.
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let oid = parse_oid(&id)?;
    state.catalog.delete_category(&oid).await?;
    Ok(StatusCode::NO_CONTENT)
}
