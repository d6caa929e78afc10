//! Auth endpoints: login, session lifecycle, and the customer first-login
//! password flow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::dtos::{
    ChangePasswordRequest, CustomerCheckResponse, LoginRequest, LoginResponse, PrincipalResponse,
    RegisterUserRequest, SessionResponse, SetCustomerPasswordRequest,
};
use crate::error::AppError;
use crate::middleware::{AdminUser, CurrentUser};
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let (token, session, principal) = state
        .auth
        .login(&payload.phone, &payload.password, payload.role)
        .await?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        session_id: session.id.map(|id| id.to_hex()).unwrap_or_default(),
        user: PrincipalResponse::from(&principal),
        expires_at: session.expires_at.to_chrono(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    if let Some(id) = user.session.id {
        state.auth.logout(&id).await?;
    }
    tracing::info!(user_id = %user.principal.id, "Logout");
    Ok(StatusCode::NO_CONTENT)
}

/// Extend the caller's session by a full TTL and reissue the token envelope.
pub async fn refresh(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<LoginResponse>, AppError> {
    let session_id = user
        .session
        .id
        .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid or expired session")))?;
    let (session, principal) = state.auth.refresh(&session_id).await?;

    Ok(Json(LoginResponse {
        access_token: session.token.clone(),
        token_type: "bearer".to_string(),
        session_id: session_id.to_hex(),
        user: PrincipalResponse::from(&principal),
        expires_at: session.expires_at.to_chrono(),
    }))
}

pub async fn me(user: CurrentUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&user.principal))
}

/// Re-check the caller's session against the store and report on it.
pub async fn validate(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = user
        .session
        .id
        .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid or expired session")))?;
    let (session, principal) = state.auth.validate_session(&session_id).await?;
    let active_sessions = state.auth.sessions().count_active(&principal.id).await?;

    Ok(Json(serde_json::json!({
        "valid": true,
        "session": SessionResponse::from(session),
        "user": PrincipalResponse::from(&principal),
        "active_sessions": active_sessions,
    })))
}

/// Admin-only staff registration.
pub async fn register(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<PrincipalResponse>), AppError> {
    payload.validate()?;

    let principal = state.auth.register_staff(&payload).await?;
    Ok((StatusCode::CREATED, Json(PrincipalResponse::from(&principal))))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .auth
        .change_password(&user.principal, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pre-login check telling the customer login screen whether the account
/// exists and whether it still needs a password.
pub async fn check_customer(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<CustomerCheckResponse>, AppError> {
    Ok(Json(state.auth.check_customer(&phone).await?))
}

/// First-login password setup, reachable without a session by design.
pub async fn set_customer_password(
    State(state): State<AppState>,
    Json(payload): Json<SetCustomerPasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .auth
        .set_customer_password(&payload.phone, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    /// Include revoked and expired sessions in the listing.
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = if query.include_inactive {
        state.auth.sessions().list_for_user(&user.principal.id).await?
    } else {
        state
            .auth
            .sessions()
            .list_active_for_user(&user.principal.id)
            .await?
    };
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// Revoke one session by id. Only the owning principal may revoke it.
pub async fn revoke_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let oid = crate::handlers::parse_oid(&id)?;
    let session = state
        .auth
        .sessions()
        .get_by_id(&oid)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    if !session.belongs_to(&user.principal.id) {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Not enough permissions"
        )));
    }

    state.auth.sessions().deactivate(&oid).await?;
    tracing::info!(user_id = %user.principal.id, session_id = %id, "Session revoked");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    let revoked = state
        .auth
        .sessions()
        .deactivate_all_for_user(&user.principal.id)
        .await?;
    tracing::info!(user_id = %user.principal.id, revoked, "Revoked all sessions");
    Ok(StatusCode::NO_CONTENT)
}

/// Maintenance: drop long-inactive session documents.
pub async fn purge_sessions(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state
        .auth
        .sessions()
        .purge_stale(state.config.auth.session_retention_days)
        .await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
