/// Refresh Token Management
///
/// Refresh tokens are:
/// - 256 bits from the OS random source, rendered as 64 lowercase hex characters
/// - Database-backed, keyed by their value
/// - Reusable until they expire or are revoked (redeeming does not rotate them)
/// - Revocable exactly once; revocation is permanent
///
/// Expiry is derived at read time from `expires_at`. Expired rows are never deleted
/// by the store itself, only by the administrative reset.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::RefreshTokenError;
use crate::storage::RefreshTokenRepository;

const REFRESH_TOKEN_BYTES: usize = 32;

/// A persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// A fresh, unrevoked token created at `now`
    pub fn new(token: String, user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        }
    }

    /// The owner, if this token may still mint access tokens at `now`
    ///
    /// # Errors
    /// `Revoked` if revoked (checked first), `Expired` if `now >= expires_at`
    pub fn redeemable_at(&self, now: DateTime<Utc>) -> Result<Uuid, RefreshTokenError> {
        if self.revoked_at.is_some() {
            return Err(RefreshTokenError::Revoked);
        }
        if now >= self.expires_at {
            return Err(RefreshTokenError::Expired);
        }
        Ok(self.user_id)
    }
}

/// Generate a new refresh token value
///
/// # Errors
/// Returns error if the OS random source fails. There is no fallback source.
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::EntropyFailure(e.to_string()))?;

    Ok(hex::encode(bytes))
}

/// Issues, redeems and revokes refresh tokens
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, ttl: Duration) -> Self {
        Self { repository, ttl }
    }

    /// Issue and persist a new refresh token for `owner`
    pub async fn issue(&self, owner: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        let value = generate_refresh_token()?;
        let token = RefreshToken::new(value, owner, Utc::now(), self.ttl);

        self.repository.insert(&token).await?;

        tracing::info!(user_id = %owner, expires_at = %token.expires_at, "Refresh token issued");
        Ok(token)
    }

    /// Look up a refresh token and return its owner if it is still usable
    ///
    /// Read-only: the token stays valid for further redemptions.
    pub async fn redeem(&self, value: &str) -> Result<Uuid, RefreshTokenError> {
        let token = self
            .repository
            .find(value)
            .await?
            .ok_or(RefreshTokenError::NotFound)?;

        token.redeemable_at(Utc::now()).map_err(|e| {
            match &e {
                RefreshTokenError::Revoked => {
                    tracing::warn!(user_id = %token.user_id, "Attempt to use revoked refresh token")
                }
                _ => tracing::info!(user_id = %token.user_id, "Refresh token expired"),
            }
            e
        })
    }

    /// Revoke a refresh token. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, value: &str) -> Result<(), RefreshTokenError> {
        if !self.repository.revoke(value, Utc::now()).await? {
            return Err(RefreshTokenError::NotFound);
        }

        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Delete every refresh token. Administrative use only.
    pub async fn reset(&self) -> Result<u64, RefreshTokenError> {
        let deleted = self.repository.delete_all().await?;

        tracing::warn!(deleted = deleted, "All refresh tokens deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRefreshTokenRepository;

    fn store() -> RefreshTokenStore {
        RefreshTokenStore::new(
            Arc::new(InMemoryRefreshTokenRepository::new()),
            Duration::days(60),
        )
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token().unwrap();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_different_tokens() {
        let token1 = generate_refresh_token().unwrap();
        let token2 = generate_refresh_token().unwrap();

        assert_ne!(token1, token2);
    }

    #[test]
    fn test_redeemable_at_boundaries() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let token = RefreshToken::new("t".to_string(), user_id, now, Duration::days(60));

        assert_eq!(token.redeemable_at(now).unwrap(), user_id);
        assert!(matches!(
            token.redeemable_at(token.expires_at),
            Err(RefreshTokenError::Expired)
        ));
    }

    #[test]
    fn test_revoked_takes_precedence_over_expired() {
        let now = Utc::now();
        let mut token = RefreshToken::new("t".to_string(), Uuid::new_v4(), now, Duration::days(60));
        token.revoked_at = Some(now);

        assert!(matches!(
            token.redeemable_at(now + Duration::days(61)),
            Err(RefreshTokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_issue_sets_sixty_day_expiry() {
        let store = store();
        let user_id = Uuid::new_v4();

        let token = store.issue(user_id).await.unwrap();

        assert_eq!(token.user_id, user_id);
        assert_eq!(token.expires_at - token.created_at, Duration::days(60));
        assert!(token.revoked_at.is_none());
    }

    #[tokio::test]
    async fn test_redeem_is_repeatable() {
        let store = store();
        let user_id = Uuid::new_v4();
        let token = store.issue(user_id).await.unwrap();

        assert_eq!(store.redeem(&token.token).await.unwrap(), user_id);
        assert_eq!(store.redeem(&token.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_redeem_after_revoke() {
        let store = store();
        let token = store.issue(Uuid::new_v4()).await.unwrap();

        store.revoke(&token.token).await.unwrap();

        assert!(matches!(
            store.redeem(&token.token).await,
            Err(RefreshTokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_redeem_expired() {
        let repository = Arc::new(InMemoryRefreshTokenRepository::new());
        let store = RefreshTokenStore::new(repository.clone(), Duration::days(60));
        let created = Utc::now() - Duration::days(61);
        let token = RefreshToken::new(
            generate_refresh_token().unwrap(),
            Uuid::new_v4(),
            created,
            Duration::days(60),
        );
        repository.insert(&token).await.unwrap();

        assert!(matches!(
            store.redeem(&token.token).await,
            Err(RefreshTokenError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let store = store();

        assert!(matches!(
            store.redeem("unknown").await,
            Err(RefreshTokenError::NotFound)
        ));
        assert!(matches!(
            store.revoke("unknown").await,
            Err(RefreshTokenError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = store();
        let token = store.issue(Uuid::new_v4()).await.unwrap();

        store.revoke(&token.token).await.unwrap();
        store.revoke(&token.token).await.unwrap();

        assert!(matches!(
            store.redeem(&token.token).await,
            Err(RefreshTokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_reset_deletes_everything() {
        let store = store();
        let first = store.issue(Uuid::new_v4()).await.unwrap();
        store.issue(Uuid::new_v4()).await.unwrap();

        assert_eq!(store.reset().await.unwrap(), 2);
        assert!(matches!(
            store.redeem(&first.token).await,
            Err(RefreshTokenError::NotFound)
        ));
    }
}
