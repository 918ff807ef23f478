use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RefreshTokenRepository, UserRepository};
use crate::error::AppError;
use crate::models::user::UserRow;
use crate::models::{NewRefreshToken, NewUser, RefreshTokenRecord, User};

const USER_COLUMNS: &str = "id, email, password_hash, roles, created_at, updated_at";
const REFRESH_TOKEN_COLUMNS: &str =
    "id, token_id, user_id, token_hash, expires_at, revoked_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_string()).collect();
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, roles) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&roles)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Email is already in use".into())
                }
                other => AppError::from(other),
            })?;

        User::try_from(row)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord, AppError> {
        let sql = format!(
            "INSERT INTO refresh_tokens (id, token_id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REFRESH_TOKEN_COLUMNS
        );

        let record = sqlx::query_as::<_, RefreshTokenRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(token.token_id)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find(
        &self,
        token_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM refresh_tokens WHERE token_id = $1 AND user_id = $2",
            REFRESH_TOKEN_COLUMNS
        );

        let record = sqlx::query_as::<_, RefreshTokenRecord>(&sql)
            .bind(token_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn revoke(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2, updated_at = $2 \
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
