//! Authentication flows: login against the split staff/customer stores,
//! session issuance, and the customer password lifecycle.

use bson::oid::ObjectId;
use bson::{doc, DateTime};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::db;
use crate::dtos::{CustomerCheckResponse, CustomerCreate, RegisterUserRequest};
use crate::models::{Customer, Principal, Session, User, UserRole};
use crate::services::error::ServiceError;
use crate::services::session::SessionService;
use crate::services::token::TokenService;
use crate::utils::password::{hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    users: Collection<User>,
    customers: Collection<Customer>,
    tokens: TokenService,
    sessions: SessionService,
}

impl AuthService {
    pub fn new(db: &Database, tokens: TokenService, sessions: SessionService) -> Self {
        Self {
            users: db.collection(db::USERS),
            customers: db.collection(db::CUSTOMERS),
            tokens,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Create a staff account. Customers are provisioned through the
    /// customer endpoints; their store has no role field.
    pub async fn register_staff(&self, req: &RegisterUserRequest) -> Result<Principal, ServiceError> {
        if req.role == UserRole::Customer {
            return Err(ServiceError::Validation(
                "Customers are created via the customer endpoints".to_string(),
            ));
        }

        let existing = self
            .users
            .find_one(doc! { "phone": &req.phone }, None)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::PhoneTaken);
        }

        let mut user = User {
            id: None,
            name: req.name.clone(),
            phone: req.phone.clone(),
            password_hash: Some(hash_password(&req.password)?),
            role: req.role,
            is_active: true,
            first_login: true,
            created_at: DateTime::now(),
            updated_at: Some(DateTime::now()),
        };
        let result = self.users.insert_one(&user, None).await?;
        user.id = result.inserted_id.as_object_id();

        tracing::info!(phone = %req.phone, role = %req.role, "Staff account created");
        Ok(Principal::from_user(&user))
    }

    /// Verify credentials against the collection the role lives in. A
    /// customer who has never set a password (first login) authenticates
    /// with any password; staff always need a matching hash, role, and
    /// active flag.
    pub async fn authenticate(
        &self,
        phone: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Principal, ServiceError> {
        if role == UserRole::Customer {
            let customer = self
                .customers
                .find_one(doc! { "phone": phone, "is_active": true }, None)
                .await?
                .ok_or(ServiceError::InvalidCredentials)?;

            if let Some(hash) = &customer.password_hash {
                if !verify_password(password, hash) {
                    return Err(ServiceError::InvalidCredentials);
                }
            }

            return Ok(Principal::from_customer(&customer));
        }

        let user = self
            .users
            .find_one(doc! { "phone": phone }, None)
            .await
            .map_err(classify_principal_error)?
            .ok_or(ServiceError::InvalidCredentials)?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(ServiceError::InvalidCredentials)?;
        if !verify_password(password, hash) || user.role != role || !user.is_active {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(Principal::from_user(&user))
    }

    /// Authenticate and open a session. Customer logins displace any prior
    /// active customer session for the same account.
    pub async fn login(
        &self,
        phone: &str,
        password: &str,
        role: UserRole,
    ) -> Result<(String, Session, Principal), ServiceError> {
        let principal = self.authenticate(phone, password, role).await?;
        let token = self.tokens.generate(&principal.phone, principal.role)?;
        let session = self
            .sessions
            .create(&principal.id, &token, principal.role)
            .await?;

        tracing::info!(user_id = %principal.id, role = %principal.role, "Login");
        Ok((token, session, principal))
    }

    pub async fn logout(&self, session_id: &ObjectId) -> Result<bool, ServiceError> {
        self.sessions.deactivate(session_id).await
    }

    pub async fn refresh(
        &self,
        session_id: &ObjectId,
    ) -> Result<(Session, Principal), ServiceError> {
        let session = self
            .sessions
            .refresh(session_id)
            .await?
            .ok_or(ServiceError::SessionNotFound)?;
        let principal = self
            .resolve_principal(session.role, &session.user_id)
            .await?;
        Ok((session, principal))
    }

    pub async fn validate_session(
        &self,
        session_id: &ObjectId,
    ) -> Result<(Session, Principal), ServiceError> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .filter(|s| s.is_valid())
            .ok_or(ServiceError::SessionNotFound)?;

        // last_used bump is best-effort
        let _ = self.sessions.touch(session_id).await;

        let principal = self
            .resolve_principal(session.role, &session.user_id)
            .await?;
        Ok((session, principal))
    }

    /// Load the principal record behind a session from whichever store the
    /// role points at. Missing or inactive principals are an auth failure,
    /// not a 404.
    pub async fn resolve_principal(
        &self,
        role: UserRole,
        user_id: &str,
    ) -> Result<Principal, ServiceError> {
        let oid = ObjectId::parse_str(user_id).map_err(|_| ServiceError::UserNotFound)?;

        if role == UserRole::Customer {
            let customer = self
                .customers
                .find_one(doc! { "_id": oid, "is_active": true }, None)
                .await?
                .ok_or(ServiceError::UserNotFound)?;
            return Ok(Principal::from_customer(&customer));
        }

        let user = self
            .users
            .find_one(doc! { "_id": oid, "is_active": true }, None)
            .await
            .map_err(classify_principal_error)?
            .ok_or(ServiceError::UserNotFound)?;
        Ok(Principal::from_user(&user))
    }

    pub async fn change_password(
        &self,
        principal: &Principal,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let oid = ObjectId::parse_str(&principal.id).map_err(|_| ServiceError::UserNotFound)?;
        let update = doc! { "$set": {
            "password_hash": hash_password(new_password)?,
            "first_login": false,
            "updated_at": DateTime::now(),
        } };

        let result = if principal.role == UserRole::Customer {
            self.customers
                .update_one(doc! { "_id": oid }, update, None)
                .await?
        } else {
            self.users
                .update_one(doc! { "_id": oid }, update, None)
                .await?
        };

        if result.matched_count == 0 {
            return Err(ServiceError::UserNotFound);
        }
        Ok(())
    }

    /// First-login lookup used by the customer login screen.
    pub async fn check_customer(&self, phone: &str) -> Result<CustomerCheckResponse, ServiceError> {
        let customer = self
            .customers
            .find_one(doc! { "phone": phone, "is_active": true }, None)
            .await?;

        Ok(match customer {
            Some(c) => CustomerCheckResponse {
                exists: true,
                customer_name: Some(c.name),
                phone: c.phone,
                has_password: c.password_hash.is_some(),
                first_login: c.first_login,
            },
            None => CustomerCheckResponse {
                exists: false,
                customer_name: None,
                phone: phone.to_string(),
                has_password: false,
                first_login: true,
            },
        })
    }

    pub async fn set_customer_password(
        &self,
        phone: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let result = self
            .customers
            .update_one(
                doc! { "phone": phone, "is_active": true },
                doc! { "$set": {
                    "password_hash": hash_password(password)?,
                    "first_login": false,
                    "updated_at": DateTime::now(),
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ServiceError::CustomerNotFound);
        }
        Ok(())
    }

    /// Staff-side variant of the password setup, addressed by customer id.
    pub async fn set_customer_password_by_id(
        &self,
        id: &ObjectId,
        password: &str,
    ) -> Result<(), ServiceError> {
        let result = self
            .customers
            .update_one(
                doc! { "_id": id, "is_active": true },
                doc! { "$set": {
                    "password_hash": hash_password(password)?,
                    "first_login": false,
                    "updated_at": DateTime::now(),
                } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ServiceError::CustomerNotFound);
        }
        Ok(())
    }

    /// Create a customer account. Password-less: the customer sets one on
    /// first login.
    pub async fn create_customer(&self, req: &CustomerCreate) -> Result<Customer, ServiceError> {
        let existing = self
            .customers
            .find_one(doc! { "phone": &req.phone }, None)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::PhoneTaken);
        }

        let mut customer = Customer {
            id: None,
            name: req.name.clone(),
            phone: req.phone.clone(),
            password_hash: None,
            is_active: true,
            first_login: true,
            wallet_balance: 0.0,
            created_at: DateTime::now(),
            updated_at: None,
        };
        let result = self.customers.insert_one(&customer, None).await?;
        customer.id = result.inserted_id.as_object_id();

        tracing::info!(phone = %req.phone, "Customer account created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: &ObjectId) -> Result<Customer, ServiceError> {
        self.customers
            .find_one(doc! { "_id": id, "is_active": true }, None)
            .await?
            .ok_or(ServiceError::CustomerNotFound)
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ServiceError> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = self
            .customers
            .find(doc! { "is_active": true }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Idempotent admin bootstrap for fresh deployments.
    pub async fn ensure_admin(&self, phone: &str, password: &str) -> Result<(), ServiceError> {
        let existing = self.users.find_one(doc! { "phone": phone }, None).await?;
        if existing.is_some() {
            return Ok(());
        }

        let admin = User {
            id: None,
            name: "Administrator".to_string(),
            phone: phone.to_string(),
            password_hash: Some(hash_password(password)?),
            role: UserRole::Admin,
            is_active: true,
            first_login: true,
            created_at: DateTime::now(),
            updated_at: None,
        };
        self.users.insert_one(&admin, None).await?;

        tracing::warn!(phone, "Seeded default admin account; change its password");
        Ok(())
    }
}

/// A principal document whose role field fails to deserialize is a
/// permissions problem with that record, not a database outage.
fn classify_principal_error(err: mongodb::error::Error) -> ServiceError {
    if matches!(*err.kind, ErrorKind::BsonDeserialization(_)) {
        ServiceError::InvalidRole("unrecognized stored role".to_string())
    } else {
        ServiceError::Database(err)
    }
}
