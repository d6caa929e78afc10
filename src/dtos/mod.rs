//! Request and response types for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    Category, Customer, DiscountType, PaymentStatus, Principal, Product, Session, StockStatus,
    TransactionType, UserRole, WalletTransaction,
};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub phone: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub session_id: String,
    pub user: PrincipalResponse,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 4))]
    pub phone: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetCustomerPasswordRequest {
    #[validate(length(min = 4))]
    pub phone: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerCheckResponse {
    pub exists: bool,
    pub customer_name: Option<String>,
    pub phone: String,
    pub has_password: bool,
    pub first_login: bool,
}

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub first_login: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_balance: Option<f64>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            phone: p.phone.clone(),
            role: p.role,
            first_login: p.first_login,
            wallet_balance: p.wallet_balance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id.map(|id| id.to_hex()).unwrap_or_default(),
            role: s.role,
            is_active: s.is_active,
            created_at: s.created_at.to_chrono(),
            last_used: s.last_used.to_chrono(),
            expires_at: s.expires_at.to_chrono(),
        }
    }
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InvoiceItemInput {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    /// Unit price; zero means "use the catalog selling price".
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceCreate {
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(length(min = 1), nested)]
    pub invoice_items: Vec<InvoiceItemInput>,
    pub status: Option<PaymentStatus>,
    #[validate(range(min = 0.0))]
    pub discount: Option<f64>,
    pub discount_type: Option<DiscountType>,
    #[validate(range(min = 0.0))]
    pub wallet_payment: Option<f64>,
    #[validate(range(min = 0.0))]
    pub wallet_add: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InvoiceUpdate {
    pub customer_id: Option<String>,
    #[validate(nested)]
    pub invoice_items: Option<Vec<InvoiceItemInput>>,
    pub status: Option<PaymentStatus>,
    #[validate(range(min = 0.0))]
    pub discount: Option<f64>,
    pub discount_type: Option<DiscountType>,
    #[validate(range(min = 0.0))]
    pub wallet_payment: Option<f64>,
    #[validate(range(min = 0.0))]
    pub wallet_add: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct InvoiceItemResponse {
    pub id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub total: f64,
    pub status: PaymentStatus,
    pub wallet_payment: f64,
    pub wallet_add: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub invoice_items: Vec<InvoiceItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: i64,
    pub total_pages: u64,
}

/// Query parameters for invoice listing.
#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub customer_id: Option<String>,
    pub status: Option<PaymentStatus>,
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> i64 {
    50
}

// ---------------------------------------------------------------------------
// Customers & wallet
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerCreate {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 4))]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub is_active: bool,
    pub first_login: bool,
    pub wallet_balance: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: c.name,
            phone: c.phone,
            is_active: c.is_active,
            first_login: c.first_login,
            wallet_balance: c.wallet_balance,
            created_at: c.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct WalletAdjustRequest {
    #[validate(range(min = 0.01))]
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletBalanceResponse {
    pub customer_id: String,
    pub wallet_balance: f64,
}

#[derive(Debug, Serialize)]
pub struct WalletTransactionResponse {
    pub id: String,
    pub customer_id: String,
    pub invoice_id: Option<String>,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransaction> for WalletTransactionResponse {
    fn from(t: WalletTransaction) -> Self {
        Self {
            id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
            customer_id: t.customer_id,
            invoice_id: t.invoice_id,
            amount: t.amount,
            transaction_type: t.transaction_type,
            description: t.description,
            created_at: t.created_at.to_chrono(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub selling_price: f64,
    #[validate(range(min = 0.0))]
    pub buying_price: Option<f64>,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[validate(length(min = 1))]
    pub category_id: String,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub discount: f64,
    pub product_id: Option<String>,
    pub sku: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0))]
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub product_id: Option<String>,
    pub name: String,
    pub selling_price: f64,
    pub buying_price: Option<f64>,
    pub quantity: i64,
    pub category_id: String,
    pub discount: f64,
    pub sku: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    // Derived, never persisted
    pub final_price: f64,
    pub is_low_stock: bool,
    pub stock_status: StockStatus,
    pub is_expired: bool,
    pub days_until_expiry: Option<i64>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            final_price: p.final_price(),
            is_low_stock: p.is_low_stock(),
            stock_status: p.stock_status(),
            is_expired: p.is_expired(),
            days_until_expiry: p.days_until_expiry(),
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            product_id: p.product_id,
            name: p.name,
            selling_price: p.selling_price,
            buying_price: p.buying_price,
            quantity: p.quantity,
            category_id: p.category_id,
            discount: p.discount,
            sku: p.sku,
            expiry_date: p.expiry_date.map(|d| d.to_chrono()),
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryCreate {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: c.name,
            description: c.description,
            is_active: c.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_create_rejects_empty_item_list() {
        let input = InvoiceCreate {
            customer_id: "64f000000000000000000001".to_string(),
            invoice_items: vec![],
            status: None,
            discount: None,
            discount_type: None,
            wallet_payment: None,
            wallet_add: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn invoice_item_rejects_zero_quantity() {
        let input = InvoiceCreate {
            customer_id: "64f000000000000000000001".to_string(),
            invoice_items: vec![InvoiceItemInput {
                product_id: "64f000000000000000000002".to_string(),
                quantity: 0,
                price: 0.0,
            }],
            status: None,
            discount: None,
            discount_type: None,
            wallet_payment: None,
            wallet_add: None,
            notes: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn wallet_adjust_requires_positive_amount() {
        let req = WalletAdjustRequest {
            amount: 0.0,
            transaction_type: TransactionType::Add,
            description: None,
        };
        assert!(req.validate().is_err());

        let req = WalletAdjustRequest {
            amount: 5.0,
            transaction_type: TransactionType::Deduct,
            description: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn product_discount_bounded_to_percentage_range() {
        let mut req = ProductCreate {
            name: "Tea".to_string(),
            selling_price: 10.0,
            buying_price: None,
            quantity: 5,
            category_id: "64f000000000000000000003".to_string(),
            discount: 101.0,
            product_id: None,
            sku: None,
            expiry_date: None,
        };
        assert!(req.validate().is_err());
        req.discount = 100.0;
        assert!(req.validate().is_ok());
    }
}
