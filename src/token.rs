//! Manage JSON Web Tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default lifetime of a session token, in seconds.
const EXPIRATION_TIME: i64 = 60 * 60; // one hour.

/// Pieces of information asserted on a token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID.
    pub sub: String,
    /// Account email.
    pub email: String,
    /// Identifies the time at which the token was issued.
    pub iat: i64,
    /// Identifies the expiration time on or after which the token must not be
    /// accepted for processing.
    pub exp: i64,
}

/// Manage session tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    expiration: i64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] from a shared secret.
    pub fn new(secret: &str, expiration: Option<u64>) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            // Oversized lifetimes pin at i64::MAX instead of wrapping.
            expiration: expiration
                .map(|seconds| i64::try_from(seconds).unwrap_or(i64::MAX))
                .unwrap_or(EXPIRATION_TIME),
        }
    }

    /// Create a new token for an account.
    pub fn create(&self, account_id: &str, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id.to_owned(),
            email: email.to_owned(),
            iat: now,
            exp: now.saturating_add(self.expiration),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(self.algorithm);

        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let manager = TokenManager::new("test-secret", None);

        let token = manager.create("656f1a2b3c4d5e6f7a8b9c0d", "ana@example.com").unwrap();
        let claims = manager.decode(&token).unwrap();

        assert_eq!(claims.sub, "656f1a2b3c4d5e6f7a8b9c0d");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, EXPIRATION_TIME);
    }

    #[test]
    fn test_wrong_secret() {
        let manager = TokenManager::new("test-secret", None);
        let other = TokenManager::new("other-secret", None);

        let token = manager.create("656f1a2b3c4d5e6f7a8b9c0d", "ana@example.com").unwrap();
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_expired() {
        let manager = TokenManager::new("test-secret", None);

        // Issued two hours ago, expired one hour ago. Far past the default
        // validation leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "656f1a2b3c4d5e6f7a8b9c0d".to_owned(),
            email: "ana@example.com".to_owned(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(manager.decode(&token).is_err());
    }

    #[test]
    fn test_custom_expiration() {
        let manager = TokenManager::new("test-secret", Some(120));

        let token = manager.create("656f1a2b3c4d5e6f7a8b9c0d", "ana@example.com").unwrap();
        let claims = manager.decode(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 120);
    }

    #[test]
    fn test_oversized_expiration_saturates() {
        let manager = TokenManager::new("test-secret", Some(u64::MAX));

        let token = manager.create("656f1a2b3c4d5e6f7a8b9c0d", "ana@example.com").unwrap();
        let claims = manager.decode(&token).unwrap();

        // The lifetime pins at the far end rather than wrapping into the
        // past.
        assert_eq!(claims.exp, i64::MAX);
        assert!(claims.exp > claims.iat);
    }
}
