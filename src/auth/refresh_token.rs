use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::CredentialHasher;
use crate::auth::token::TokenSigner;
use crate::error::AppError;
use crate::models::{NewRefreshToken, RefreshTokenRecord};
use crate::repository::RefreshTokenRepository;

/// Tracks issued refresh tokens so they can be rotated and revoked.
///
/// Only a one-way hash of each signed token reaches storage.
#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    hasher: CredentialHasher,
    signer: TokenSigner,
}

impl RefreshTokenStore {
    pub fn new(
        repo: Arc<dyn RefreshTokenRepository>,
        hasher: CredentialHasher,
        signer: TokenSigner,
    ) -> Self {
        Self {
            repo,
            hasher,
            signer,
        }
    }

    /// Records a freshly signed refresh token.
    ///
    /// The stored expiry is read from the token itself; a token without `exp`
    /// is an `InvalidToken` error.
    pub async fn persist(
        &self,
        user_id: Uuid,
        raw_token: &str,
        token_id: Uuid,
    ) -> Result<RefreshTokenRecord, AppError> {
        let expires_at = self.signer.decode_expiry(raw_token)?;
        let raw = raw_token.to_owned();
        let token_hash = self.hasher.offload(move |h| h.hash_token(&raw)).await?;

        self.repo
            .insert(NewRefreshToken {
                token_id,
                user_id,
                token_hash,
                expires_at,
            })
            .await
    }

    pub async fn find(
        &self,
        token_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        self.repo.find(token_id, user_id).await
    }

    /// Checks `raw_token` against the hash stored in `record`.
    pub async fn matches(
        &self,
        record: &RefreshTokenRecord,
        raw_token: &str,
    ) -> Result<bool, AppError> {
        let digest = record.token_hash.clone();
        let raw = raw_token.to_owned();
        self.hasher
            .offload(move |h| h.verify_token(&digest, &raw))
            .await
    }

    /// Marks `record` revoked. Returns `false` if another request revoked it first.
    pub async fn revoke(&self, record: &RefreshTokenRecord) -> Result<bool, AppError> {
        self.repo.revoke(record.id, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HashingConfig, TokensConfig};
    use crate::models::{AuthenticatedUser, Role};
    use crate::repository::MemoryRefreshTokenRepository;
    use std::time::Duration;

    fn store() -> (RefreshTokenStore, TokenSigner, MemoryRefreshTokenRepository) {
        let tokens = TokensConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            access_expires_in: Duration::from_secs(900),
            refresh_expires_in: Duration::from_secs(3600),
            argon2_pepper: "pepper".to_string(),
        };
        let hashing = HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let signer = TokenSigner::new(&tokens);
        let hasher = CredentialHasher::new(&tokens.argon2_pepper, hashing).unwrap();
        let repo = MemoryRefreshTokenRepository::new();
        let store = RefreshTokenStore::new(Arc::new(repo.clone()), hasher, signer.clone());
        (store, signer, repo)
    }

    fn identity() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            roles: vec![Role::User],
        }
    }

    #[actix_rt::test]
    async fn test_persist_stores_hash_and_expiry() {
        let (store, signer, repo) = store();
        let identity = identity();
        let token_id = Uuid::new_v4();
        let raw = signer.sign_refresh(&identity, token_id).unwrap();

        let record = store.persist(identity.id, &raw, token_id).await.unwrap();
        let claims = signer.verify_refresh(&raw).unwrap();

        assert_eq!(record.token_id, token_id);
        assert_eq!(record.user_id, identity.id);
        assert_ne!(record.token_hash, raw);
        assert_eq!(record.expires_at.timestamp(), claims.claims.exp);
        assert!(record.revoked_at.is_none());
        assert_eq!(repo.records().await.len(), 1);
    }

    #[actix_rt::test]
    async fn test_matches_only_the_original_token() {
        let (store, signer, _) = store();
        let identity = identity();
        let token_id = Uuid::new_v4();
        let raw = signer.sign_refresh(&identity, token_id).unwrap();
        let record = store.persist(identity.id, &raw, token_id).await.unwrap();

        let mut forged_identity = identity.clone();
        forged_identity.email = "mallory@example.com".to_string();
        let forged = signer.sign_refresh(&forged_identity, token_id).unwrap();

        assert!(store.matches(&record, &raw).await.unwrap());
        assert!(!store.matches(&record, &forged).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_revoke_reports_winner() {
        let (store, signer, _) = store();
        let identity = identity();
        let token_id = Uuid::new_v4();
        let raw = signer.sign_refresh(&identity, token_id).unwrap();
        let record = store.persist(identity.id, &raw, token_id).await.unwrap();

        assert!(store.revoke(&record).await.unwrap());
        assert!(!store.revoke(&record).await.unwrap());

        let stored = store.find(token_id, identity.id).await.unwrap().unwrap();
        assert!(stored.is_revoked());
    }

    #[actix_rt::test]
    async fn test_persist_rejects_token_without_expiry() {
        let (store, _, repo) = store();

        let result = store
            .persist(Uuid::new_v4(), "not-a-jwt", Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(AppError::InvalidToken(_))));
        assert!(repo.records().await.is_empty());
    }
}
