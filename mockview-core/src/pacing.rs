//! Per-session advance guard with cancellable pacing timers
//!
//! At most one advance (answer evaluation + pacing delay + next question or
//! completion) may be in flight for a session. A second command arriving
//! while one is pending is rejected instead of racing it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::InterviewError;

struct Entry {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct Inner {
    slots: Mutex<HashMap<String, Entry>>,
    generation: AtomicU64,
}

impl Inner {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Tracks in-flight advances by session id
#[derive(Clone, Default)]
pub struct PacingGuard {
    inner: Arc<Inner>,
}

impl PacingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the advance slot for a session
    ///
    /// Fails with `InvalidState` while another advance holds it.
    pub fn begin(&self, session_id: &str) -> Result<AdvanceSlot, InterviewError> {
        let mut slots = self.inner.slots();
        if slots.contains_key(session_id) {
            return Err(InterviewError::InvalidState(
                "Previous answer is still being processed".to_string(),
            ));
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        slots.insert(
            session_id.to_string(),
            Entry {
                generation,
                token: token.clone(),
            },
        );
        Ok(AdvanceSlot {
            session_id: session_id.to_string(),
            generation,
            token,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Cancel a pending advance and free the slot
    ///
    /// Returns true if an advance was pending.
    pub fn cancel(&self, session_id: &str) -> bool {
        let entry = self.inner.slots().remove(session_id);
        match entry {
            Some(entry) => {
                debug!(session_id, "Cancelling pending advance");
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether an advance is in flight for this session
    pub fn is_pending(&self, session_id: &str) -> bool {
        self.inner.slots().contains_key(session_id)
    }

    /// Number of sessions with an advance in flight
    pub fn pending_count(&self) -> usize {
        self.inner.slots().len()
    }
}

/// Exclusive right to advance one session, released on drop
pub struct AdvanceSlot {
    session_id: String,
    generation: u64,
    token: CancellationToken,
    inner: Arc<Inner>,
}

impl AdvanceSlot {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait out the pacing delay; returns false if cancelled first
    pub async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(delay) => !self.token.is_cancelled(),
        }
    }
}

impl Drop for AdvanceSlot {
    fn drop(&mut self) {
        let mut slots = self.inner.slots();
        // A cancel followed by a new begin leaves a newer entry in place
        if slots
            .get(&self.session_id)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            slots.remove(&self.session_id);
        }
    }
}

impl std::fmt::Debug for AdvanceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvanceSlot")
            .field("session_id", &self.session_id)
            .field("generation", &self.generation)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
