//! Authentication context types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication context for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AuthContext {
    /// Carries a verified bearer token
    Authenticated {
        /// The authenticated user's identity
        identity: UserIdentity,
    },
    /// No valid authentication (should have been rejected by middleware)
    Anonymous,
}

impl AuthContext {
    /// Returns the identity if authenticated, None otherwise
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            AuthContext::Authenticated { identity } => Some(identity),
            AuthContext::Anonymous => None,
        }
    }

    /// User id of the authenticated caller
    pub fn user_id(&self) -> Option<&str> {
        self.identity().map(|identity| identity.user_id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }
}

/// Verified identity from a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at,
        }
    }
}
