use crate::error::AppError;
use thiserror::Error;

/// Domain errors for the back-office services.
///
/// Not-found and permission failures keep their own variants so they are
/// never masked as internal errors on the way out.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Incorrect phone number, password, or role")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    SessionNotFound,

    #[error("User not found or inactive")]
    UserNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Category has active products and cannot be deleted")]
    CategoryInUse,

    #[error("Phone number already registered")]
    PhoneTaken,

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(String),

    #[error("Insufficient wallet balance. Current: {balance}, Required: {required}")]
    InsufficientFunds { balance: f64, required: f64 },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Not enough permissions")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(e.into()),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Incorrect phone number, password, or role"))
            }
            ServiceError::SessionNotFound => {
                AppError::AuthError(anyhow::anyhow!("Invalid or expired session"))
            }
            ServiceError::UserNotFound => {
                AppError::AuthError(anyhow::anyhow!("User not found or inactive"))
            }
            ServiceError::CustomerNotFound => {
                AppError::NotFound(anyhow::anyhow!("Customer not found"))
            }
            ServiceError::ProductNotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Product {} not found", id))
            }
            ServiceError::InvoiceNotFound => AppError::NotFound(anyhow::anyhow!("Invoice not found")),
            ServiceError::CategoryNotFound => {
                AppError::NotFound(anyhow::anyhow!("Category not found"))
            }
            ServiceError::CategoryInUse => AppError::Conflict(anyhow::anyhow!(
                "Category has active products and cannot be deleted"
            )),
            ServiceError::PhoneTaken => {
                AppError::Conflict(anyhow::anyhow!("Phone number already registered"))
            }
            ServiceError::InsufficientStock(name) => {
                AppError::BadRequest(anyhow::anyhow!("Insufficient stock for product {}", name))
            }
            ServiceError::InsufficientFunds { balance, required } => AppError::BadRequest(
                anyhow::anyhow!(
                    "Insufficient wallet balance. Current: {}, Required: {}",
                    balance,
                    required
                ),
            ),
            ServiceError::InvalidRole(role) => {
                AppError::Forbidden(anyhow::anyhow!("Invalid role: {}", role))
            }
            ServiceError::Forbidden => AppError::Forbidden(anyhow::anyhow!("Not enough permissions")),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}
