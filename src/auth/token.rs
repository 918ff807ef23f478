use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokensConfig;
use crate::error::AppError;
use crate::models::{AuthenticatedUser, Role};

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    /// The user's normalized email.
    pub email: String,
    /// Roles granted to the user at issuance time.
    pub roles: Vec<Role>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Claims carried by refresh tokens: the access claims plus the id of the
/// stored record that tracks this token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshClaims {
    #[serde(flatten)]
    pub claims: Claims,
    #[serde(rename = "tokenId")]
    pub token_id: Uuid,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: Option<i64>,
}

/// Issues and verifies HS256 JWTs.
///
/// Access and refresh tokens use independent secrets and lifetimes, so neither
/// kind can be presented as, or forged from, the other.
#[derive(Clone)]
pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenSigner {
    pub fn new(config: &TokensConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: i64::try_from(config.access_expires_in.as_secs()).unwrap_or(i64::MAX),
            refresh_ttl: i64::try_from(config.refresh_expires_in.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Signs a short-lived access token for `identity`.
    pub fn sign_access(&self, identity: &AuthenticatedUser) -> Result<String, AppError> {
        let claims = self.claims_for(identity, self.access_ttl)?;
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign access token: {}", e)))
    }

    /// Signs a long-lived refresh token bound to the stored record `token_id`.
    pub fn sign_refresh(
        &self,
        identity: &AuthenticatedUser,
        token_id: Uuid,
    ) -> Result<String, AppError> {
        let claims = RefreshClaims {
            claims: self.claims_for(identity, self.refresh_ttl)?,
            token_id,
        };
        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(|e| {
            AppError::InternalServerError(format!("Failed to sign refresh token: {}", e))
        })
    }

    /// Verifies signature, expiry and structure of an access token.
    ///
    /// # Returns
    /// The decoded `Claims`, or `AppError::Unauthorized` for any failure.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.access_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Access token rejected: {}", e);
                AppError::Unauthorized("Invalid token".into())
            })
    }

    /// Verifies signature, expiry and structure of a refresh token.
    /// A token without a `tokenId` claim is structurally invalid.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Refresh token rejected: {}", e);
                AppError::Unauthorized("Refresh token is not valid".into())
            })
    }

    /// Reads the `exp` claim WITHOUT checking the signature.
    ///
    /// Only for tokens this signer produced moments earlier, to mirror their expiry
    /// into storage. Never call this on a token received from a client.
    pub(crate) fn decode_expiry(&self, token: &str) -> Result<DateTime<Utc>, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let exp = decode::<ExpiryOnly>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| AppError::InvalidToken(format!("Undecodable token: {}", e)))?
            .claims
            .exp
            .ok_or_else(|| AppError::InvalidToken("Token carries no expiry".into()))?;

        Utc.timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| AppError::InvalidToken(format!("Expiry {} out of range", exp)))
    }

    fn claims_for(&self, identity: &AuthenticatedUser, ttl: i64) -> Result<Claims, AppError> {
        let now = Utc::now().timestamp();
        let exp = now.checked_add(ttl).ok_or_else(|| {
            AppError::InternalServerError(format!("Token lifetime of {}s overflows", ttl))
        })?;

        Ok(Claims {
            sub: identity.id,
            email: identity.email.clone(),
            roles: identity.roles.clone(),
            iat: now,
            exp,
        })
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}
