//! Stateless session tokens.
//!
//! A token is `base64url(claims json) "." base64url(HMAC-SHA256(payload))`,
//! both parts without padding. Nothing is stored server-side, so logout is a
//! client-side concern and a token stays valid until `exp`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::contract::model::{Actor, Role, User};

type HmacSha256 = Hmac<Sha256>;

/// Identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or_default()
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    InvalidKey,
}

pub struct SessionIssuer {
    key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    pub fn new(key: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }

    /// Issuer with a fresh 32-byte key from the OS RNG.
    pub fn with_random_key(ttl: Duration) -> Self {
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::new(key, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        <HmacSha256 as Mac>::new_from_slice(&self.key).map_err(|_| TokenError::InvalidKey)
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user: &User, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        let json = serde_json::to_vec(&claims).map_err(|_| TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{sig}"))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (payload, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::Profile;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: "ana_p".into(),
            email: "ana@example.com".into(),
            credential_hash: "x".into(),
            role: Role::User,
            active: true,
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(b"test-key".to_vec(), Duration::hours(24))
    }

    #[test]
    fn issued_token_validates() {
        let s = issuer();
        let token = s.issue_at(&user(), 1_000).unwrap();
        let claims = s.validate_at(&token, 1_001).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "ana_p");
        assert_eq!(claims.role(), Role::User);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = issuer();
        let token = s.issue_at(&user(), 1_000).unwrap();
        assert_eq!(
            s.validate_at(&token, 1_000 + 24 * 3600),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let token = issuer().issue_at(&user(), 1_000).unwrap();
        let other = SessionIssuer::new(b"other-key".to_vec(), Duration::hours(24));
        assert_eq!(other.validate_at(&token, 1_001), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let s = issuer();
        let token = s.issue_at(&user(), 1_000).unwrap();
        let (_, sig) = token.split_once('.').unwrap();

        let mut forged = user();
        forged.role = Role::Admin;
        let forged_token = s.issue_at(&forged, 1_000).unwrap();
        let (forged_payload, _) = forged_token.split_once('.').unwrap();

        let spliced = format!("{forged_payload}.{sig}");
        assert_eq!(s.validate_at(&spliced, 1_001), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let s = issuer();
        assert_eq!(s.validate_at("nodot", 0), Err(TokenError::Malformed));
        assert_eq!(s.validate_at("a.!!!", 0), Err(TokenError::Malformed));
    }

    #[test]
    fn random_keys_differ() {
        let a = SessionIssuer::with_random_key(Duration::hours(1));
        let b = SessionIssuer::with_random_key(Duration::hours(1));
        let token = a.issue(&user()).unwrap();
        assert!(a.validate(&token).is_ok());
        assert_eq!(b.validate(&token), Err(TokenError::BadSignature));
    }
}
