//! Customer accounts and wallet endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::dtos::{
    CustomerCreate, CustomerResponse, WalletAdjustRequest, WalletBalanceResponse,
    WalletTransactionResponse,
};
use crate::error::AppError;
use crate::handlers::parse_oid;
use crate::middleware::{CustomerUser, StaffUser};
use crate::models::TransactionType;
use crate::AppState;

pub async fn create_customer(
    State(state): State<AppState>,
    _staff: StaffUser,
    Json(payload): Json<CustomerCreate>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    payload.validate()?;

    let customer = state.auth.create_customer(&payload).await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

pub async fn list_customers(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state.auth.list_customers().await?;
    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

pub async fn get_customer(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    let oid = parse_oid(&id)?;
    let customer = state.auth.get_customer(&oid).await?;
    Ok(Json(CustomerResponse::from(customer)))
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = 8))]
    pub password: String,
}

/// Staff-side password reset for a customer account.
pub async fn set_password(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    let oid = parse_oid(&id)?;
    state
        .auth
        .set_customer_password_by_id(&oid, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn wallet_balance(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<WalletBalanceResponse>, AppError> {
    let oid = parse_oid(&id)?;
    let balance = state.wallet.balance_of(&oid).await?;
    Ok(Json(WalletBalanceResponse {
        customer_id: id,
        wallet_balance: balance,
    }))
}

/// Manual wallet adjustment by staff. Credits and debits both land in the
/// ledger with the supplied description.
pub async fn adjust_wallet(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(payload): Json<WalletAdjustRequest>,
) -> Result<Json<WalletBalanceResponse>, AppError> {
    payload.validate()?;

    let oid = parse_oid(&id)?;
    let description = payload
        .description
        .as_deref()
        .unwrap_or("Manual adjustment by staff");

    match payload.transaction_type {
        TransactionType::Add => state.wallet.credit(&oid, payload.amount, description).await?,
        TransactionType::Deduct => state.wallet.debit(&oid, payload.amount, description).await?,
    }

    let balance = state.wallet.balance_of(&oid).await?;
    Ok(Json(WalletBalanceResponse {
        customer_id: id,
        wallet_balance: balance,
    }))
}

pub async fn wallet_transactions(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<WalletTransactionResponse>>, AppError> {
    let oid = parse_oid(&id)?;
    let transactions = state.wallet.list_for_customer(&oid).await?;
    Ok(Json(
        transactions
            .into_iter()
            .map(WalletTransactionResponse::from)
            .collect(),
    ))
}

pub async fn my_wallet(
    State(state): State<AppState>,
    customer: CustomerUser,
) -> Result<Json<WalletBalanceResponse>, AppError> {
    let oid = parse_oid(&customer.0.principal.id)?;
    let balance = state.wallet.balance_of(&oid).await?;
    Ok(Json(WalletBalanceResponse {
        customer_id: customer.0.principal.id,
        wallet_balance: balance,
    }))
}

pub async fn my_wallet_transactions(
    State(state): State<AppState>,
    customer: CustomerUser,
) -> Result<Json<Vec<WalletTransactionResponse>>, AppError> {
    let oid = parse_oid(&customer.0.principal.id)?;
    let transactions = state.wallet.list_for_customer(&oid).await?;
    Ok(Json(
        transactions
            .into_iter()
            .map(WalletTransactionResponse::from)
            .collect(),
    ))
}
