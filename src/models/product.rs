//! Product and category documents plus the derived fields the API reports
//! but never persists (final price, stock tier, expiry state).

use bson::oid::ObjectId;
use bson::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// External-facing product code, unique when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub name: String,
    pub selling_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buying_price: Option<f64>,
    pub quantity: i64,
    pub category_id: String,
    #[serde(default)]
    pub discount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime>,
    pub is_active: bool,
    pub created_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    MediumStock,
    HighStock,
}

impl Product {
    /// Selling price after the product's own discount percentage.
    pub fn final_price(&self) -> f64 {
        if self.discount > 0.0 {
            self.selling_price * (1.0 - self.discount / 100.0)
        } else {
            self.selling_price
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity < 10
    }

    pub fn stock_status(&self) -> StockStatus {
        match self.quantity {
            0 => StockStatus::OutOfStock,
            q if q < 10 => StockStatus::LowStock,
            q if q < 50 => StockStatus::MediumStock,
            _ => StockStatus::HighStock,
        }
    }

    pub fn days_until_expiry(&self) -> Option<i64> {
        self.expiry_date
            .map(|d| (d.to_chrono() - Utc::now()).num_days())
    }

    pub fn is_expired(&self) -> bool {
        self.days_until_expiry().map(|d| d < 0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(quantity: i64) -> Product {
        Product {
            id: Some(ObjectId::new()),
            product_id: Some("P-001".to_string()),
            name: "Rice 5kg".to_string(),
            selling_price: 100.0,
            buying_price: Some(80.0),
            quantity,
            category_id: ObjectId::new().to_hex(),
            discount: 0.0,
            sku: None,
            expiry_date: None,
            is_active: true,
            created_at: DateTime::now(),
            updated_at: None,
        }
    }

    #[test]
    fn final_price_applies_discount_percentage() {
        let mut p = product(20);
        assert_eq!(p.final_price(), 100.0);

        p.discount = 25.0;
        assert_eq!(p.final_price(), 75.0);
    }

    #[test]
    fn stock_tiers_follow_quantity_thresholds() {
        assert_eq!(product(0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(product(9).stock_status(), StockStatus::LowStock);
        assert_eq!(product(10).stock_status(), StockStatus::MediumStock);
        assert_eq!(product(49).stock_status(), StockStatus::MediumStock);
        assert_eq!(product(50).stock_status(), StockStatus::HighStock);
        assert!(product(9).is_low_stock());
        assert!(!product(10).is_low_stock());
    }

    #[test]
    fn expiry_derivation() {
        let mut p = product(5);
        assert_eq!(p.days_until_expiry(), None);
        assert!(!p.is_expired());

        p.expiry_date = Some(DateTime::from_chrono(Utc::now() + Duration::days(10)));
        assert_eq!(p.days_until_expiry(), Some(9));
        assert!(!p.is_expired());

        p.expiry_date = Some(DateTime::from_chrono(Utc::now() - Duration::days(3)));
        assert!(p.is_expired());
    }
}
