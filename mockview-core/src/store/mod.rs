//! Session persistence
//!
//! The store is the single source of truth for session documents. Saves
//! are compare-and-swap on [`Session::version`]: a save succeeds only if
//! the stored version matches the caller's, and bumps it by one.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::session::{Session, SessionStatus};

pub use memory::MemorySessionStore;

/// Durable storage for interview sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session; fails with `Duplicate` if the id exists
    async fn create(&self, session: &Session) -> Result<Session, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Look up a session only if it belongs to `user_id`
    async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Session>, StoreError>;

    /// A user's sessions in the given status, newest first
    async fn find_by_user_and_status(
        &self,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<Vec<Session>, StoreError>;

    /// Write back a modified session
    ///
    /// Returns the stored copy with its new version and `updated_at`.
    async fn save(&self, session: &Session) -> Result<Session, StoreError>;

    /// Non-terminal sessions not touched since `cutoff`
    async fn find_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Session>, StoreError>;
}
