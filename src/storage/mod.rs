/// Persistence collaborators
///
/// Repository traits for users and refresh tokens, with a PostgreSQL backend
/// for the running service and an in-memory backend for tests.

mod memory;
mod postgres;

pub use memory::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
pub use postgres::{PgRefreshTokenRepository, PgUserRepository};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::{AccountCredentials, RefreshToken};
use crate::error::DatabaseError;

/// A stored user account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
}

impl AccountCredentials for UserRecord {
    fn user_id(&self) -> Uuid {
        self.id
    }

    fn password_hash(&self) -> &str {
        &self.hashed_password
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<UserRecord, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError>;

    /// Replace email and password hash. `NotFound` if the user does not exist.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError>;

    async fn delete_all(&self) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DatabaseError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, DatabaseError>;

    /// Set `revoked_at` to `at` unless it is already set.
    ///
    /// Returns `false` when no such token exists.
    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError>;

    async fn delete_all(&self) -> Result<u64, DatabaseError>;
}
