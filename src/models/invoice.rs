//! Invoice aggregate: invoice document, price-snapshot line items, and the
//! append-only wallet transaction log.

use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Percentage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Customer `_id` as hex. Older documents may hold a native ObjectId;
    /// readers must tolerate both.
    pub customer_id: String,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub total: f64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub wallet_payment: f64,
    #[serde(default)]
    pub wallet_add: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Point-in-time snapshot of one sold line. `price` is the unit price at
/// sale time and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Add,
    Deduct,
}

/// Wallet ledger entry. Append-only: never mutated except for the one-time
/// invoice-id back-fill, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_id: String,
    pub invoice_id: Option<String>,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime,
}

impl WalletTransaction {
    /// A ledger entry for one balance movement. `invoice_id` is None only
    /// when the invoice does not exist yet (creation flow) or the movement
    /// has no invoice at all (manual adjustment).
    pub fn new(
        customer_id: &ObjectId,
        amount: f64,
        transaction_type: TransactionType,
        description: &str,
        invoice_id: Option<&str>,
    ) -> Self {
        Self {
            id: None,
            customer_id: customer_id.to_hex(),
            invoice_id: invoice_id.map(str::to_string),
            amount,
            transaction_type,
            description: description.to_string(),
            created_at: DateTime::now(),
        }
    }
}

/// Filters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub customer_id: Option<String>,
    pub status: Option<PaymentStatus>,
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    pub min_date: Option<DateTime>,
    pub max_date: Option<DateTime>,
}
