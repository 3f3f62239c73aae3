//! In-memory session store

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::SessionStore;
use crate::error::StoreError;
use crate::session::{Session, SessionStatus};

/// Session store backed by a `HashMap`
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    failing_saves: AtomicUsize,
    lost_acks: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` saves fail with `Unavailable`
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` saves commit but report `Unavailable`
    pub fn lose_next_save_acks(&self, count: usize) {
        self.lost_acks.store(count, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn take_injected_failure(&self) -> bool {
        take_one(&self.failing_saves)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(session.id.clone()));
        }
        let mut stored = session.clone();
        stored.version = 1;
        stored.updated_at = Utc::now();
        sessions.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_by_user_and_status(
        &self,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<Vec<Session>, StoreError> {
        let mut found: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id && s.status == status)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(found)
    }

    async fn save(&self, session: &Session) -> Result<Session, StoreError> {
        if self.take_injected_failure() {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut sessions = self.sessions.write().await;
        let current = sessions
            .get(&session.id)
            .ok_or_else(|| StoreError::Missing(session.id.clone()))?;
        if current.version != session.version {
            return Err(StoreError::VersionConflict {
                id: session.id.clone(),
                expected: session.version,
                found: current.version,
            });
        }

        let mut stored = session.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        sessions.insert(stored.id.clone(), stored.clone());
        if take_one(&self.lost_acks) {
            return Err(StoreError::Unavailable("acknowledgement lost".to_string()));
        }
        Ok(stored)
    }

    async fn find_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.status.is_terminal() && s.updated_at < cutoff)
            .cloned()
            .collect())
    }
}
