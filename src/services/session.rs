//! Session manager: persisted, individually revocable sessions.
//!
//! Expiry is lazy. Nothing flips expired documents; `get_by_token` simply
//! filters them out, so an expired session is indistinguishable from an
//! absent one. `purge_stale` physically removes long-inactive documents and
//! runs as maintenance, never on the request path.

use bson::oid::ObjectId;
use bson::{doc, DateTime};
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::db;
use crate::models::{Session, UserRole};
use crate::services::error::ServiceError;

#[derive(Clone)]
pub struct SessionService {
    sessions: Collection<Session>,
    ttl_minutes: i64,
}

impl SessionService {
    pub fn new(db: &Database, ttl_minutes: i64) -> Self {
        Self {
            sessions: db.collection(db::SESSIONS),
            ttl_minutes,
        }
    }

    /// Create a session at login. Customers get at most one active session:
    /// any prior active customer sessions for the same user are deactivated
    /// first. Staff sessions are left alone.
    pub async fn create(
        &self,
        user_id: &str,
        token: &str,
        role: UserRole,
    ) -> Result<Session, ServiceError> {
        if role == UserRole::Customer {
            self.deactivate_customer_sessions(user_id).await?;
        }

        let mut session = Session::new(
            user_id.to_string(),
            token.to_string(),
            role,
            self.ttl_minutes,
        );
        let result = self.sessions.insert_one(&session, None).await?;
        session.id = result.inserted_id.as_object_id();

        Ok(session)
    }

    /// Look up a session by bearer token. Only active, unexpired sessions
    /// are returned.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>, ServiceError> {
        let session = self
            .sessions
            .find_one(
                doc! {
                    "token": token,
                    "is_active": true,
                    "expires_at": { "$gt": DateTime::now() },
                },
                None,
            )
            .await?;
        Ok(session)
    }

    pub async fn get_by_id(&self, session_id: &ObjectId) -> Result<Option<Session>, ServiceError> {
        let session = self
            .sessions
            .find_one(doc! { "_id": session_id }, None)
            .await?;
        Ok(session)
    }

    /// Bump `last_used`. Best-effort: callers ignore the outcome.
    pub async fn touch(&self, session_id: &ObjectId) -> Result<bool, ServiceError> {
        let result = self
            .sessions
            .update_one(
                doc! { "_id": session_id },
                doc! { "$set": { "last_used": DateTime::now() } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    /// Extend an active session's expiry by a full TTL from now. Expired or
    /// deactivated sessions cannot be refreshed.
    pub async fn refresh(&self, session_id: &ObjectId) -> Result<Option<Session>, ServiceError> {
        let new_expiry = DateTime::from_chrono(Utc::now() + Duration::minutes(self.ttl_minutes));
        let result = self
            .sessions
            .update_one(
                doc! { "_id": session_id, "is_active": true },
                doc! { "$set": {
                    "expires_at": new_expiry,
                    "last_used": DateTime::now(),
                } },
                None,
            )
            .await?;

        if result.modified_count == 1 {
            self.get_by_id(session_id).await
        } else {
            Ok(None)
        }
    }

    pub async fn deactivate(&self, session_id: &ObjectId) -> Result<bool, ServiceError> {
        let result = self
            .sessions
            .update_one(
                doc! { "_id": session_id },
                doc! { "$set": { "is_active": false } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    pub async fn deactivate_all_for_user(&self, user_id: &str) -> Result<u64, ServiceError> {
        let result = self
            .sessions
            .update_many(
                doc! { "user_id": user_id, "is_active": true },
                doc! { "$set": { "is_active": false } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    /// Deactivate a user's customer sessions only. The role filter keeps a
    /// phone shared between a staff and a customer account from killing the
    /// staff sessions.
    pub async fn deactivate_customer_sessions(&self, user_id: &str) -> Result<u64, ServiceError> {
        let result = self
            .sessions
            .update_many(
                doc! {
                    "user_id": user_id,
                    "is_active": true,
                    "role": UserRole::Customer.as_str(),
                },
                doc! { "$set": { "is_active": false } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Session>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .sessions
            .find(doc! { "user_id": user_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn list_active_for_user(&self, user_id: &str) -> Result<Vec<Session>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .sessions
            .find(
                doc! {
                    "user_id": user_id,
                    "is_active": true,
                    "expires_at": { "$gt": DateTime::now() },
                },
                options,
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_active(&self, user_id: &str) -> Result<u64, ServiceError> {
        let count = self
            .sessions
            .count_documents(
                doc! {
                    "user_id": user_id,
                    "is_active": true,
                    "expires_at": { "$gt": DateTime::now() },
                },
                None,
            )
            .await?;
        Ok(count)
    }

    /// Physically delete inactive sessions whose last use is older than the
    /// cutoff. Maintenance only.
    pub async fn purge_stale(&self, older_than_days: i64) -> Result<u64, ServiceError> {
        let cutoff = DateTime::from_chrono(Utc::now() - Duration::days(older_than_days));
        let result = self
            .sessions
            .delete_many(
                doc! {
                    "is_active": false,
                    "last_used": { "$lt": cutoff },
                },
                None,
            )
            .await?;

        tracing::info!(deleted = result.deleted_count, "Purged stale sessions");
        Ok(result.deleted_count)
    }
}
