//! Bearer token authentication

mod config;
mod context;
mod error;
mod validator;

pub use config::AuthConfig;
pub use context::{AuthContext, UserIdentity};
pub use error::AuthError;
pub use validator::TokenValidator;
