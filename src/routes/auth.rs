/// Authentication Routes
///
/// Login, access-token refresh and refresh-token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::normalize_email;
use crate::auth::SessionManager;
use crate::error::{AppError, ErrorContext};
use crate::storage::UserRepository;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the account plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response: a new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 401: Unknown email or wrong password (indistinguishable)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let user = users.find_by_email(normalize_email(&form.email)).await?;

    let (user, session) = sessions
        .login(user, &form.password)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %session.user_id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: user.id,
        created_at: user.created_at,
        updated_at: user.updated_at,
        email: user.email,
        token: session.access_token,
        refresh_token: session.refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// Mint a new access token from `Authorization: Bearer <refresh_token>`.
/// The refresh token stays valid.
///
/// # Errors
/// - 401: Missing, malformed, unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let token = sessions
        .refresh(req.headers())
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(request_id = %context.request_id, "Access token refreshed");

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in `Authorization: Bearer <refresh_token>`.
/// Revoking twice is not an error.
///
/// # Errors
/// - 401: Missing or malformed header, or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");

    sessions
        .revoke(req.headers())
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::NoContent().finish())
}
