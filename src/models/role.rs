use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Principal role. Parsed once at the serde boundary; unrecognized values
/// are rejected there instead of at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cashier,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Cashier => "cashier",
            UserRole::Customer => "customer",
        }
    }

    /// Admin and cashier count as staff; customers do not.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Cashier)
    }

    /// Normalize a stored role value. Historical documents carry the role
    /// either as a plain string or as a document exposing a `value` field.
    pub fn from_bson(value: &Bson) -> Result<Self, String> {
        match value {
            Bson::String(s) => s.parse().map_err(|_| s.clone()),
            Bson::Document(doc) => match doc.get_str("value") {
                Ok(s) => s.parse().map_err(|_| s.to_string()),
                Err(_) => Err(format!("{}", value)),
            },
            other => Err(format!("{}", other)),
        }
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "cashier" => Ok(UserRole::Cashier),
            "customer" => Ok(UserRole::Customer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Bson::deserialize(deserializer)?;
        UserRole::from_bson(&raw)
            .map_err(|bad| serde::de::Error::custom(format!("unrecognized role: {}", bad)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn parses_plain_strings() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("cashier".parse::<UserRole>(), Ok(UserRole::Cashier));
        assert_eq!("customer".parse::<UserRole>(), Ok(UserRole::Customer));
        assert!("manager".parse::<UserRole>().is_err());
    }

    #[test]
    fn normalizes_string_bson() {
        let role = UserRole::from_bson(&Bson::String("customer".into())).unwrap();
        assert_eq!(role, UserRole::Customer);
    }

    #[test]
    fn normalizes_value_document() {
        let role = UserRole::from_bson(&Bson::Document(doc! { "value": "admin" })).unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(UserRole::from_bson(&Bson::Int32(3)).is_err());
        assert!(UserRole::from_bson(&Bson::String("superuser".into())).is_err());
        assert!(UserRole::from_bson(&Bson::Document(doc! { "name": "admin" })).is_err());
    }

    #[test]
    fn deserializes_both_shapes_from_documents() {
        #[derive(Deserialize)]
        struct Wrapper {
            role: UserRole,
        }

        let plain: Wrapper = bson::from_document(doc! { "role": "cashier" }).unwrap();
        assert_eq!(plain.role, UserRole::Cashier);

        let wrapped: Wrapper =
            bson::from_document(doc! { "role": { "value": "customer" } }).unwrap();
        assert_eq!(wrapped.role, UserRole::Customer);

        let bad = bson::from_document::<Wrapper>(doc! { "role": "root" });
        assert!(bad.is_err());
    }

    #[test]
    fn staff_check_excludes_customers() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Cashier.is_staff());
        assert!(!UserRole::Customer.is_staff());
    }
}
