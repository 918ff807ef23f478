//! Shared setup for the integration tests: the full app over in-memory repositories.

#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use taskline::auth::{AuthMiddleware, AuthResponse, AuthService, CredentialHasher};
use taskline::config::{HashingConfig, TokensConfig};
use taskline::models::{Role, User};
use taskline::repository::{MemoryRefreshTokenRepository, MemoryUserRepository};
use taskline::routes;

pub struct TestContext {
    pub auth: web::Data<AuthService>,
    pub users: MemoryUserRepository,
    pub tokens: MemoryRefreshTokenRepository,
}

pub fn tokens_config() -> TokensConfig {
    TokensConfig {
        access_secret: "integration-access-secret".to_string(),
        refresh_secret: "integration-refresh-secret".to_string(),
        access_expires_in: Duration::from_secs(15 * 60),
        refresh_expires_in: Duration::from_secs(7 * 24 * 60 * 60),
        argon2_pepper: "integration-pepper".to_string(),
    }
}

/// Argon2 parameters cheap enough for test suites.
pub fn hashing_config() -> HashingConfig {
    HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn context() -> TestContext {
    let users = MemoryUserRepository::new();
    let tokens = MemoryRefreshTokenRepository::new();
    let auth = AuthService::new(
        &tokens_config(),
        hashing_config(),
        Arc::new(users.clone()),
        Arc::new(tokens.clone()),
    )
    .expect("Failed to build AuthService");

    TestContext {
        auth: web::Data::new(auth),
        users,
        tokens,
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(ctx.auth.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Registers a user through the HTTP surface.
pub async fn register_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<AuthResponse, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body_bytes)
        ));
    }
    serde_json::from_slice(&body_bytes)
        .map_err(|e| format!("Failed to parse registration response: {}", e))
}

/// Inserts an admin account directly into the user store.
pub async fn seed_admin(ctx: &TestContext, email: &str, password: &str) -> User {
    let hasher = CredentialHasher::new(&tokens_config().argon2_pepper, hashing_config())
        .expect("Failed to build hasher");
    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4(),
        email: email.to_lowercase(),
        password_hash: hasher.hash(password).expect("Failed to hash password"),
        roles: vec![Role::User, Role::Admin],
        created_at: now,
        updated_at: now,
    };
    ctx.users.insert_user(admin.clone()).await;
    admin
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
