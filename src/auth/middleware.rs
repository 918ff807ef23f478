use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::AuthService;
use crate::error::AppError;

/// Paths reachable without a bearer token.
const PUBLIC_PATHS: [&str; 3] = ["/api/auth/register", "/api/auth/login", "/api/auth/refresh"];

/// Rejects requests without a valid access token and stores the caller's
/// `AuthenticatedUser` in the request extensions.
///
/// Requires `web::Data<AuthService>` in the application data.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            return Box::pin(self.service.call(req));
        }

        let identity = match bearer_token(&req) {
            Some(token) => match req.app_data::<web::Data<AuthService>>() {
                Some(auth) => auth.authenticate(token),
                None => Err(AppError::InternalServerError(
                    "AuthService is not registered".into(),
                )),
            },
            None => Err(AppError::Unauthorized("Missing token".into())),
        };

        match identity {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => {
                log::warn!("Rejected request to {}: {}", req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
