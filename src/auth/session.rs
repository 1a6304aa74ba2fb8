/// Session Management
///
/// Composes password verification, access tokens and refresh tokens into the
/// login / authenticate / refresh / revoke flows used by request handlers.

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use chrono::Duration;
use uuid::Uuid;

use crate::auth::credentials::extract_bearer;
use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{RefreshToken, RefreshTokenStore};
use crate::configuration::AuthSettings;
use crate::error::{AuthError, HashingError};
use crate::storage::RefreshTokenRepository;

/// What login needs from a stored account
pub trait AccountCredentials {
    fn user_id(&self) -> Uuid;
    fn password_hash(&self) -> &str;
}

/// Tokens minted by a successful login
#[derive(Debug)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

pub struct SessionManager {
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenStore,
    access_token_ttl: Duration,
    // Verified against when the account does not exist, so unknown users cost
    // the same as wrong passwords.
    dummy_hash: String,
}

impl SessionManager {
    pub fn new(
        codec: AccessTokenCodec,
        refresh_tokens: RefreshTokenStore,
        access_token_ttl: Duration,
    ) -> Result<Self, HashingError> {
        let dummy_hash = hash_password(&Uuid::new_v4().to_string())?;

        Ok(Self {
            codec,
            refresh_tokens,
            access_token_ttl,
            dummy_hash,
        })
    }

    pub fn from_settings(
        settings: &AuthSettings,
        repository: Arc<dyn RefreshTokenRepository>,
    ) -> Result<Self, HashingError> {
        Self::new(
            AccessTokenCodec::new(&settings.secret),
            RefreshTokenStore::new(repository, settings.refresh_token_ttl()),
            settings.access_token_ttl(),
        )
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenStore {
        &self.refresh_tokens
    }

    /// Hash a new password off the async executor
    pub async fn hash_password(&self, password: &str) -> Result<String, HashingError> {
        let password = password.to_string();
        spawn_blocking_hash(move || hash_password(&password)).await
    }

    /// Check `password` against `account` and mint an access token and a
    /// refresh token. The account is handed back alongside the session.
    ///
    /// `account` is `None` when no account matched; this still runs a full hash
    /// verification before failing with `InvalidCredentials`.
    pub async fn login<A: AccountCredentials>(
        &self,
        account: Option<A>,
        password: &str,
    ) -> Result<(A, Session), AuthError> {
        let password_hash = match &account {
            Some(account) => account.password_hash().to_string(),
            None => self.dummy_hash.clone(),
        };

        let password = password.to_string();
        let password_valid =
            spawn_blocking_hash(move || verify_password(&password, &password_hash)).await?;

        let account = match account {
            Some(account) if password_valid => account,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let user_id = account.user_id();
        let access_token = self.codec.issue(user_id, self.access_token_ttl)?;
        let refresh_token = self.refresh_tokens.issue(user_id).await?;

        Ok((
            account,
            Session {
                user_id,
                access_token,
                refresh_token,
            },
        ))
    }

    /// Verify the bearer access token on a request
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers)?;
        Ok(self.codec.verify(&token)?)
    }

    /// Mint a new access token from the bearer refresh token on a request.
    /// The password is not re-checked and the refresh token is not rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = extract_bearer(headers)?;
        let user_id = self.refresh_tokens.redeem(&token).await?;

        Ok(self.codec.issue(user_id, self.access_token_ttl)?)
    }

    /// Revoke the bearer refresh token on a request
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = extract_bearer(headers)?;
        self.refresh_tokens.revoke(&token).await?;
        Ok(())
    }
}

/// Argon2 is deliberately slow; keep it off the executor threads.
async fn spawn_blocking_hash<F, T>(f: F) -> Result<T, HashingError>
where
    F: FnOnce() -> Result<T, HashingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HashingError(format!("hashing task failed: {}", e)))?
}
