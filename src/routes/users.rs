/// User account routes
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionManager;
use crate::error::{AppError, DatabaseError, ErrorContext, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::storage::{UserRecord, UserRepository};

/// Create or update request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// User information response. Never includes the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
        }
    }
}

/// Canonical form an email is stored and looked up in
pub(crate) fn normalize_email(email: &str) -> &str {
    email.trim()
}

fn require_email(email: &str) -> Result<&str, ValidationError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    Ok(email)
}

/// POST /api/users
///
/// # Errors
/// - 400: Empty email
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = require_email(&form.email)?;
    let password_hash = sessions.hash_password(&form.password).await?;
    let user = users
        .create(email, &password_hash)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// GET /api/me
///
/// **Requires a valid access token.**
pub async fn get_current_user(
    user: web::ReqData<AuthenticatedUser>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let record = users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(record)))
}

/// PUT /api/me
///
/// Replace the caller's email and password. **Requires a valid access token.**
/// Outstanding tokens stay valid.
pub async fn update_current_user(
    user: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(user.user_id.to_string());

    let email = require_email(&form.email)?;
    let password_hash = sessions.hash_password(&form.password).await?;
    let record = users
        .update_credentials(user.user_id, email, &password_hash)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %record.id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(record)))
}
