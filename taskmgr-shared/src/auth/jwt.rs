/// Session token generation and validation
///
/// Tokens are HS256-signed JWTs whose subject is the user ID. They carry no
/// other identity data and are never stored server-side, so a token stays
/// valid until it expires even if the account changes.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, 7 days by default
/// - **Validation**: Signature and expiration, with zero leeway
/// - **Secret Management**: Secrets should be at least 32 bytes
///
/// # Example
///
/// ```
/// use taskmgr_shared::auth::jwt::TokenKeys;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new("your-secret-key-at-least-32-bytes!!", Duration::days(7));
/// let user_id = Uuid::new_v4();
///
/// let token = keys.issue(user_id)?;
/// assert_eq!(keys.verify(&token)?, user_id);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default session lifetime in days
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Longest session lifetime configuration may ask for (ten years)
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// JWT claims structure
///
/// - `sub`: Subject (user ID)
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `user_id` that expire after `expires_in`
    pub fn new(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

fn decode_claims(token: &str, key: &DecodingKey) -> Result<Claims, JwtError> {
    decode::<Claims>(token, key, &validation())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        })
}

/// Pre-built signing and verification keys plus the session lifetime
///
/// Built once at startup and shared by the auth service and the request
/// guard.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a signed token for `user_id`
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, self.ttl))
    }

    /// Signs arbitrary claims with HS256
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns the user ID it was issued for
    pub fn verify(&self, token: &str) -> Result<Uuid, JwtError> {
        decode_claims(token, &self.decoding).map(|claims| claims.sub)
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn keys() -> TokenKeys {
        TokenKeys::new(SECRET, Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    #[test]
    fn test_issue_and_verify() {
        let user_id = Uuid::new_v4();
        let token = keys().issue(user_id).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(keys().verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_claims_expiry_window() {
        let claims = Claims::new(Uuid::new_v4(), Duration::days(7));

        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_issued_token_carries_configured_ttl() {
        let keys = TokenKeys::new(SECRET, Duration::days(3));
        let token = keys.issue(Uuid::new_v4()).unwrap();

        let claims = decode_claims(&token, &keys.decoding).unwrap();
        assert_eq!(claims.exp - claims.iat, 3 * 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys().issue(Uuid::new_v4()).unwrap();
        let other = TokenKeys::new("another-secret-key-at-least-32-bytes", Duration::days(7));

        assert!(matches!(
            other.verify(&token),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: Utc::now().timestamp() - 3600,
            exp: Utc::now().timestamp() - 60,
        };
        let token = keys().sign(&claims).unwrap();

        assert!(matches!(keys().verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = keys().issue(Uuid::new_v4()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = keys().sign(&Claims::new(Uuid::new_v4(), Duration::days(7))).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        assert!(keys().verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(keys().verify("not-a-token").is_err());
        assert!(keys().verify("").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", keys());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("redacted"));
    }
}
