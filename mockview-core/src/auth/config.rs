//! Configuration for token authentication

use serde::{Deserialize, Serialize};

/// Configuration for HS256 bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret used to sign and verify tokens
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of tokens minted by `mockview token`
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// Clock skew leeway in seconds for token expiry validation
    #[serde(default = "default_clock_skew")]
    pub clock_skew_seconds: u64,
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_clock_skew() -> u64 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            clock_skew_seconds: default_clock_skew(),
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }

    /// A secret must be set before the server can accept connections
    pub fn is_valid(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}
