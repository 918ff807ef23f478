use argon2::password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;

use crate::config::HashingConfig;
use crate::error::AppError;

/// One-way hashing for passwords and refresh tokens.
///
/// Passwords are hashed with Argon2id using the server pepper as the Argon2 secret
/// input, so digests leaked from the database cannot be brute-forced without the
/// pepper. Refresh tokens go through the same primitive without the pepper.
///
/// Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`); verification
/// reads the parameters back from the digest, so changing the cost settings does not
/// invalidate existing hashes.
#[derive(Clone)]
pub struct CredentialHasher {
    pepper: Arc<[u8]>,
    params: Params,
}

impl CredentialHasher {
    pub fn new(pepper: &str, config: HashingConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AppError::ConfigError(format!("Invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            pepper: Arc::from(pepper.as_bytes()),
            params,
        })
    }

    /// Hashes a password, mixing in the pepper.
    pub fn hash(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self.peppered()?.hash_password(secret.as_bytes(), &salt)?;
        Ok(digest.to_string())
    }

    /// Checks a password against a digest produced by [`CredentialHasher::hash`].
    ///
    /// Returns `Ok(false)` on mismatch. Fails only when `digest` is not a valid PHC string.
    pub fn verify(&self, digest: &str, secret: &str) -> Result<bool, AppError> {
        verify_with(&self.peppered()?, digest, secret)
    }

    /// Hashes a refresh token. No pepper: this is only about irreversibility.
    pub fn hash_token(&self, token: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self.plain().hash_password(token.as_bytes(), &salt)?;
        Ok(digest.to_string())
    }

    pub fn verify_token(&self, digest: &str, token: &str) -> Result<bool, AppError> {
        verify_with(&self.plain(), digest, token)
    }

    /// Runs hashing work on the blocking thread pool.
    ///
    /// Argon2 deliberately burns CPU and memory; async handlers must not do that on
    /// a request worker.
    pub async fn offload<F, T>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&CredentialHasher) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || work(&hasher))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
    }

    fn peppered(&self) -> Result<Argon2<'_>, AppError> {
        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| AppError::ConfigError(format!("Invalid argon2 pepper: {}", e)))
    }

    fn plain(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn verify_with(argon2: &Argon2<'_>, digest: &str, secret: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| AppError::InternalServerError(format!("Malformed hash: {}", e)))?;

    match argon2.verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(AppError::InternalServerError(format!(
            "Failed to verify hash: {}",
            e
        ))),
    }
}
