use crate::{
    auth::{
        AuthResponse, AuthService, LoginRequest, RefreshTokenRequest, RegisterRequest,
    },
    error::AppError,
    models::AuthenticatedUser,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates an account with the `user` role and returns a token pair.
/// `409 Conflict` if the email is taken.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let result = auth
        .register(&register_data.email, &register_data.password)
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::from(result)))
}

/// Login user
///
/// Returns a token pair for valid credentials, `401` otherwise.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let result = auth.login(&login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(result)))
}

/// Rotate a refresh token
///
/// The presented token is revoked and a new pair is returned.
#[post("/refresh")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    body: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let result = auth.refresh(&body.refresh_token).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(result)))
}

#[post("/logout")]
pub async fn logout(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
    body: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    auth.logout(user.id, &body.refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}
