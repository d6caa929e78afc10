//! Request guards. The bearer token is only the lookup key; the persisted
//! session record is what authorizes the request, so revoking a session
//! takes effect on the next call.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::{Principal, Session, UserRole};
use crate::AppState;

/// The authenticated caller: the session that admitted the request and the
/// principal behind it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub principal: Principal,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Missing bearer token")))?;

        let session = state
            .auth
            .sessions()
            .get_by_token(token)
            .await?
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid or expired session")))?;

        if let Some(id) = session.id {
            let _ = state.auth.sessions().touch(&id).await;
        }

        let principal = state
            .auth
            .resolve_principal(session.role, &session.user_id)
            .await?;

        Ok(CurrentUser { session, principal })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Admin-only guard.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.principal.role != UserRole::Admin {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Not enough permissions"
            )));
        }
        Ok(AdminUser(user))
    }
}

/// Staff guard: admin or cashier.
#[derive(Debug, Clone)]
pub struct StaffUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.principal.role.is_staff() {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Not enough permissions"
            )));
        }
        Ok(StaffUser(user))
    }
}

/// Customer-only guard for the self-service endpoints.
#[derive(Debug, Clone)]
pub struct CustomerUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for CustomerUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.principal.role != UserRole::Customer {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Not enough permissions"
            )));
        }
        Ok(CustomerUser(user))
    }
}
