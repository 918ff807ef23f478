use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted trace of one issued refresh token.
///
/// Only a one-way hash of the signed token is stored. The record is found through
/// `token_id`, which is embedded in the token's claims, so lookups never depend on
/// the raw token string.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    /// Unique; matches the `tokenId` claim of the signed token.
    pub token_id: Uuid,
    pub user_id: Uuid,
    /// Unique argon2 digest of the full signed token.
    pub token_hash: String,
    /// Mirrors the `exp` claim of the signed token.
    pub expires_at: DateTime<Utc>,
    /// Set once, on rotation or logout.
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Input for inserting a refresh token record.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            expires_at,
            revoked_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_revocation_state() {
        let now = Utc::now();
        assert!(!record(now + Duration::days(7), None).is_revoked());
        assert!(record(now + Duration::days(7), Some(now)).is_revoked());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        assert!(!record(now + Duration::seconds(1), None).is_expired_at(now));
        assert!(record(now, None).is_expired_at(now));
        assert!(record(now - Duration::seconds(1), None).is_expired_at(now));
    }
}
