//! Persistence interfaces used by the authentication core.
//!
//! `postgres` backs the server binary; `memory` backs the test suites and
//! local experiments without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewRefreshToken, NewUser, RefreshTokenRecord, User};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryRefreshTokenRepository, MemoryUserRepository};
pub use postgres::{PgRefreshTokenRepository, PgUserRepository};

/// User store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact match on the stored (lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the email is already taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, AppError>;
}

/// Refresh token persistence.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails with `Conflict` when `token_id` or `token_hash` already exists.
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, AppError>;

    /// Looks up a record by its token id and owner. Revoked records are returned too.
    async fn find(
        &self,
        token_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Sets `revoked_at` only if the record is not revoked yet.
    ///
    /// Returns `true` when this call performed the revocation.
    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;
}
