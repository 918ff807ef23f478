use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// Reads the identity that `AuthMiddleware` stored in the request extensions.
///
/// Fails with `Unauthorized` on routes the middleware does not cover.
impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use uuid::Uuid;

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        let identity = AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            roles: vec![Role::User],
        };
        req.extensions_mut().insert(identity.clone());

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap(), identity);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedUser::from_request(&req, &mut payload).await;

        let response = result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
