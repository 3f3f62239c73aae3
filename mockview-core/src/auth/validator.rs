//! HS256 token validation and issuance

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthError, UserIdentity};

/// Token claims; `id` is the user id
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: String,
    exp: i64,
    iat: i64,
}

/// Validates and issues HS256 bearer tokens
#[derive(Clone)]
pub struct TokenValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    leeway: u64,
}

impl TokenValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            leeway: 60,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let mut validator = Self::new(&config.jwt_secret);
        validator.leeway = config.clock_skew_seconds;
        validator
    }

    /// Validate a token and return the identity it carries
    pub fn validate(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.id.is_empty() {
            return Err(AuthError::InvalidFormat("empty id claim".to_string()));
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        Ok(UserIdentity::new(claims.id, expires_at))
    }

    /// Mint a token for `user_id` valid for `ttl`
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}
