pub mod extractors;
pub mod middleware;
pub mod password;
pub mod refresh_token;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserResponse;

pub use middleware::AuthMiddleware;
pub use password::CredentialHasher;
pub use refresh_token::RefreshTokenStore;
pub use service::{AuthResult, AuthService};
pub use token::{Claims, RefreshClaims, TokenSigner};

/// Payload for a new account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    /// Must be at least 8 characters long.
    #[validate(length(min = 8))]
    pub password: String,
}

/// Payload for a login request.
///
/// The password only has to be present: credential checking decides the rest.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for refresh and logout.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 10))]
    pub refresh_token: String,
}

/// Body returned by register, login and refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: UserResponse::from(&result.user),
            access_token: result.access_token,
            refresh_token: result.refresh_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "Password123!".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "alice.example.com".to_string(),
            password: "Password123!".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_login_request_accepts_short_password() {
        let login = LoginRequest {
            email: "alice@example.com".to_string(),
            password: "wrong1".to_string(),
        };
        assert!(login.validate().is_ok());

        let empty = LoginRequest {
            email: "alice@example.com".to_string(),
            password: String::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_refresh_request_uses_camel_case() {
        let request: RefreshTokenRequest =
            serde_json::from_str(r#"{"refreshToken":"abcdefghijkl"}"#).unwrap();
        assert!(request.validate().is_ok());

        let too_short: RefreshTokenRequest =
            serde_json::from_str(r#"{"refreshToken":"abc"}"#).unwrap();
        assert!(too_short.validate().is_err());

        assert!(serde_json::from_str::<RefreshTokenRequest>(r#"{"refresh_token":"abcdefghijkl"}"#)
            .is_err());
    }
}
