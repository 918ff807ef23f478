//! Repository tests against a real database.
//!
//! Run with `cargo test -- --ignored` once `DATABASE_URL` points at a database
//! with `migrations/` applied.

use chrono::{Duration, Utc};
use dotenv::dotenv;
use sqlx::PgPool;
use uuid::Uuid;

use taskline::models::{NewRefreshToken, NewUser};
use taskline::repository::{
    PgRefreshTokenRepository, PgUserRepository, RefreshTokenRepository, UserRepository,
};
use taskline::AppError;

async fn pool() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

#[ignore]
#[actix_rt::test]
async fn test_pg_user_repository() {
    let pool = pool().await;
    let email = "pg_user_repo@example.com";
    cleanup_user(&pool, email).await;
    let repo = PgUserRepository::new(pool.clone());

    let created = repo
        .create(NewUser::regular(email, "$argon2id$placeholder"))
        .await
        .expect("Failed to create user");
    assert_eq!(created.email, email);

    let by_email = repo.find_by_email(email).await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
    assert_eq!(repo.find_by_id(created.id).await.unwrap(), Some(by_email));

    match repo.create(NewUser::regular(email, "other")).await {
        Err(AppError::Conflict(_)) => {}
        other => panic!("Expected Conflict, got {:?}", other),
    }

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_pg_refresh_token_revoke_is_conditional() {
    let pool = pool().await;
    let email = "pg_token_repo@example.com";
    cleanup_user(&pool, email).await;
    let user = PgUserRepository::new(pool.clone())
        .create(NewUser::regular(email, "$argon2id$placeholder"))
        .await
        .expect("Failed to create user");
    let repo = PgRefreshTokenRepository::new(pool.clone());

    let token_id = Uuid::new_v4();
    let record = repo
        .insert(NewRefreshToken {
            token_id,
            user_id: user.id,
            token_hash: format!("hash-{}", token_id),
            expires_at: Utc::now() + Duration::days(7),
        })
        .await
        .expect("Failed to insert refresh token");

    assert!(repo.find(token_id, Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.revoke(record.id, Utc::now()).await.unwrap());
    assert!(!repo.revoke(record.id, Utc::now()).await.unwrap());

    let stored = repo.find(token_id, user.id).await.unwrap().unwrap();
    assert!(stored.is_revoked());

    cleanup_user(&pool, email).await;
}
