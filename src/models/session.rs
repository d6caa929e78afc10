//! Persisted session documents. A session is the actual authentication gate:
//! it can be revoked independently of the bearer token's own validity.

use bson::oid::ObjectId;
use bson::DateTime;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub token: String,
    pub role: UserRole,
    pub expires_at: DateTime,
    pub is_active: bool,
    pub created_at: DateTime,
    pub last_used: DateTime,
}

impl Session {
    pub fn new(user_id: String, token: String, role: UserRole, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id,
            token,
            role,
            expires_at: DateTime::from_chrono(now + Duration::minutes(ttl_minutes)),
            is_active: true,
            created_at: DateTime::from_chrono(now),
            last_used: DateTime::from_chrono(now),
        }
    }

    /// Valid means active and not past its expiry. Expiry is lazy: nothing
    /// transitions the document, lookups just stop returning it.
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= DateTime::now()
    }

    /// Whether this session belongs to the given principal. Revocation by
    /// id is only allowed for the owner.
    pub fn belongs_to(&self, principal_id: &str) -> bool {
        self.user_id == principal_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_ttl(ttl_minutes: i64) -> Session {
        Session::new(
            ObjectId::new().to_hex(),
            "token-abc".to_string(),
            UserRole::Customer,
            ttl_minutes,
        )
    }

    #[test]
    fn fresh_session_is_valid() {
        let session = session_with_ttl(720);
        assert!(session.is_active);
        assert!(!session.is_expired());
        assert!(session.is_valid());
    }

    #[test]
    fn expired_session_is_invalid_even_while_active() {
        let session = session_with_ttl(-5);
        assert!(session.is_active);
        assert!(session.is_expired());
        assert!(!session.is_valid());
    }

    #[test]
    fn deactivated_session_is_invalid() {
        let mut session = session_with_ttl(720);
        session.is_active = false;
        assert!(!session.is_valid());
    }

    #[test]
    fn ownership_is_an_exact_user_match() {
        let session = session_with_ttl(720);
        let owner = session.user_id.clone();
        assert!(session.belongs_to(&owner));
        assert!(!session.belongs_to(&ObjectId::new().to_hex()));
        assert!(!session.belongs_to(""));
    }
}
