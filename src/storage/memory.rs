use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RefreshTokenRepository, UserRecord, UserRepository};
use crate::auth::RefreshToken;
use crate::error::DatabaseError;

/// In-memory user repository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, UserRecord>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.write().await;

        if email_taken(&users, email, None) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.write().await;

        if email_taken(&users, email, Some(id)) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("Record not found".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let mut users = self.users.write().await;
        let count = users.len() as u64;
        users.clear();
        Ok(count)
    }
}

/// In-memory refresh token repository keyed by token value
#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DatabaseError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }
        tokens.insert(token.token.clone(), token.clone());

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let mut tokens = self.tokens.write().await;
        let count = tokens.len() as u64;
        tokens.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create("a@example.com", "hash").await.unwrap();

        let result = repo.create("a@example.com", "hash").await;
        assert!(matches!(
            result,
            Err(DatabaseError::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo
            .update_credentials(Uuid::new_v4(), "a@example.com", "hash")
            .await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let repo = InMemoryRefreshTokenRepository::new();
        let now = Utc::now();
        let token = RefreshToken::new("ab".repeat(32), Uuid::new_v4(), now, chrono::Duration::days(60));
        repo.insert(&token).await.unwrap();

        let first = now + chrono::Duration::seconds(1);
        let second = now + chrono::Duration::seconds(2);
        assert!(repo.revoke(&token.token, first).await.unwrap());
        assert!(repo.revoke(&token.token, second).await.unwrap());

        let stored = repo.find(&token.token).await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let repo = InMemoryRefreshTokenRepository::new();
        assert!(!repo.revoke("missing", Utc::now()).await.unwrap());
    }
}
