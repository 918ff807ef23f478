use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::CredentialHasher;
use crate::auth::refresh_token::RefreshTokenStore;
use crate::auth::token::TokenSigner;
use crate::config::{HashingConfig, TokensConfig};
use crate::error::AppError;
use crate::models::{AuthenticatedUser, NewUser, User};
use crate::repository::{RefreshTokenRepository, UserRepository};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Refresh token is not valid";

/// Outcome of a successful register, login or refresh.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Registration, login, refresh-token rotation and logout.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: CredentialHasher,
    signer: TokenSigner,
    refresh_tokens: RefreshTokenStore,
}

impl AuthService {
    pub fn new(
        tokens: &TokensConfig,
        hashing: HashingConfig,
        users: Arc<dyn UserRepository>,
        refresh_repo: Arc<dyn RefreshTokenRepository>,
    ) -> Result<Self, AppError> {
        let hasher = CredentialHasher::new(&tokens.argon2_pepper, hashing)?;
        let signer = TokenSigner::new(tokens);
        let refresh_tokens = RefreshTokenStore::new(refresh_repo, hasher.clone(), signer.clone());

        Ok(Self {
            users,
            hasher,
            signer,
            refresh_tokens,
        })
    }

    /// Creates an account with the default `user` role and signs it in.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResult, AppError> {
        let email = email.to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already in use".into()));
        }

        let password = password.to_owned();
        let password_hash = self.hasher.offload(move |h| h.hash(&password)).await?;
        let user = self
            .users
            .create(NewUser::regular(email, password_hash))
            .await?;

        log::info!("Registered user {}", user.id);
        self.issue_tokens(user).await
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AppError> {
        let user = match self.users.find_by_email(&email.to_lowercase()).await? {
            Some(user) => user,
            None => {
                log::warn!("Login failed: unknown email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        let digest = user.password_hash.clone();
        let password = password.to_owned();
        let valid = self
            .hasher
            .offload(move |h| h.verify(&digest, &password))
            .await?;
        if !valid {
            log::warn!("Login failed for user {}: bad password", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        self.issue_tokens(user).await
    }

    /// Exchanges a refresh token for a new pair and revokes the old one.
    ///
    /// Only one of several concurrent refreshes of the same token succeeds.
    pub async fn refresh(&self, raw_token: &str) -> Result<AuthResult, AppError> {
        let claims = self.signer.verify_refresh(raw_token)?;
        let user_id = claims.claims.sub;

        let record = match self.refresh_tokens.find(claims.token_id, user_id).await? {
            Some(record) if !record.is_revoked() => record,
            Some(_) => {
                log::warn!("Refresh rejected for user {}: token already revoked", user_id);
                return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
            }
            None => {
                log::warn!("Refresh rejected for user {}: unknown token", user_id);
                return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
            }
        };

        if !self.refresh_tokens.matches(&record, raw_token).await? {
            log::warn!("Refresh rejected for user {}: hash mismatch", user_id);
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        if record.is_expired_at(chrono::Utc::now()) {
            return Err(AppError::Unauthorized("Refresh token expired".into()));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        if !self.refresh_tokens.revoke(&record).await? {
            log::warn!("Refresh rejected for user {}: lost rotation race", user_id);
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        self.issue_tokens(user).await
    }

    /// Revokes a refresh token owned by `current_user_id`.
    ///
    /// Unknown or already revoked tokens are a no-op.
    pub async fn logout(&self, current_user_id: Uuid, raw_token: &str) -> Result<(), AppError> {
        let claims = self.signer.verify_refresh(raw_token)?;
        if claims.claims.sub != current_user_id {
            log::warn!(
                "Logout rejected for user {}: token belongs to another user",
                current_user_id
            );
            return Err(AppError::Unauthorized(
                "Refresh token does not belong to user".into(),
            ));
        }

        let record = match self
            .refresh_tokens
            .find(claims.token_id, current_user_id)
            .await?
        {
            Some(record) => record,
            None => return Ok(()),
        };
        if record.is_revoked() {
            return Ok(());
        }

        if !self.refresh_tokens.matches(&record, raw_token).await? {
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        self.refresh_tokens.revoke(&record).await?;
        log::info!("User {} logged out", current_user_id);
        Ok(())
    }

    /// Resolves a bearer access token to the identity it carries.
    pub fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, AppError> {
        self.signer.verify_access(access_token).map(AuthenticatedUser::from)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.users.list().await
    }

    async fn issue_tokens(&self, user: User) -> Result<AuthResult, AppError> {
        let identity = AuthenticatedUser::from(&user);
        let access_token = self.signer.sign_access(&identity)?;

        let token_id = Uuid::new_v4();
        let refresh_token = self.signer.sign_refresh(&identity, token_id)?;
        self.refresh_tokens
            .persist(user.id, &refresh_token, token_id)
            .await?;

        Ok(AuthResult {
            access_token,
            refresh_token,
            user,
        })
    }
}
