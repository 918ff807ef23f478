use crate::{
    auth::AuthService,
    error::AppError,
    models::{AuthenticatedUser, Role, UserResponse},
};
use actix_web::{get, web, HttpResponse, Responder};

/// Returns the caller's own account.
///
/// `404 Not Found` if the account was deleted after the token was issued.
#[get("/me")]
pub async fn me(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = auth.profile(user.id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&profile)))
}

/// Lists every account. Admin only.
#[get("")]
pub async fn list_users(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;

    let users: Vec<UserResponse> = auth
        .list_users()
        .await?
        .iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}
