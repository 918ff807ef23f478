use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RefreshTokenRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewRefreshToken, NewUser, RefreshTokenRecord, User};

/// In-memory user store.
#[derive(Default, Clone)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a user as-is, e.g. an admin account seeded by a test.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email is already in use".into()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

/// In-memory refresh token store keyed by record id.
#[derive(Default, Clone)]
pub struct MemoryRefreshTokenRepository {
    records: Arc<RwLock<HashMap<Uuid, RefreshTokenRecord>>>,
}

impl MemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record.
    pub async fn records(&self) -> Vec<RefreshTokenRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Rewrites the stored expiry of the record tracking `token_id`.
    pub async fn set_expiry(&self, token_id: Uuid, expires_at: DateTime<Utc>) -> bool {
        let mut records = self.records.write().await;
        match records.values_mut().find(|r| r.token_id == token_id) {
            Some(record) => {
                record.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, AppError> {
        let mut records = self.records.write().await;
        if records.values().any(|r| r.token_id == token.token_id) {
            return Err(AppError::Conflict("Duplicate refresh token id".into()));
        }
        if records.values().any(|r| r.token_hash == token.token_hash) {
            return Err(AppError::Conflict("Duplicate refresh token hash".into()));
        }

        let now = Utc::now();
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            token_id: token.token_id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        token_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.token_id == token_id && r.user_id == user_id)
            .cloned())
    }

    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(at);
                record.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
