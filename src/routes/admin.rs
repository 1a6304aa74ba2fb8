use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::SessionManager;
use crate::configuration::ApplicationSettings;
use crate::error::AppError;
use crate::storage::UserRepository;

#[derive(Serialize)]
pub struct ResetResponse {
    pub users_deleted: u64,
    pub refresh_tokens_deleted: u64,
}

/// POST /admin/reset
///
/// Delete every user and refresh token. Only available on the `dev` platform.
pub async fn reset(
    application: web::Data<ApplicationSettings>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    if !application.is_dev() {
        return Err(AppError::Forbidden(
            "Reset is only allowed in dev environment".to_string(),
        ));
    }

    // Before users: deleting users cascades into refresh_tokens.
    let refresh_tokens_deleted = sessions.refresh_tokens().reset().await?;
    let users_deleted = users.delete_all().await?;

    tracing::warn!(users_deleted = users_deleted, "Database reset");

    Ok(HttpResponse::Ok().json(ResetResponse {
        users_deleted,
        refresh_tokens_deleted,
    }))
}
