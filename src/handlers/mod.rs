pub mod auth;
pub mod categories;
pub mod customers;
pub mod invoices;
pub mod products;

use axum::Json;
use bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::error::AppError;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "market-service" }))
}

/// Parse a path segment as an ObjectId, rejecting malformed ids up front.
pub(crate) fn parse_oid(value: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(value)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid id: {}", value)))
}
