mod loader;
mod types;

pub use loader::{API_KEY_ENV, ConfigLoader, JWT_SECRET_ENV};
pub use types::MockviewConfig;
