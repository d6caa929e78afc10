//! Staff users and customers. Two distinct collections despite the overlap:
//! staff carry an explicit role, customers carry a wallet balance.

use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// Staff account (`users` collection): admin or cashier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub first_login: bool,
    pub created_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Customer account (`customers` collection). No role field is stored;
/// the role is implied by the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub first_login: bool,
    #[serde(default)]
    pub wallet_balance: f64,
    pub created_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

fn default_true() -> bool {
    true
}

/// The resolved identity behind a session, regardless of which collection
/// it came from.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub first_login: bool,
    pub wallet_balance: Option<f64>,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            first_login: user.first_login,
            wallet_balance: None,
        }
    }

    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            id: customer.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            role: UserRole::Customer,
            first_login: customer.first_login,
            wallet_balance: Some(customer.wallet_balance),
        }
    }
}
