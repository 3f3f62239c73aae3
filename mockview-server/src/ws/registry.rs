//! Tracks which WebSocket connection drives which interview session

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// connection id -> sessions it drives
    connections: HashMap<String, HashSet<String>>,
    /// session id -> connection id
    owners: HashMap<String, String>,
}

/// Connection-to-session bindings
///
/// A session is bound to at most one connection. Binding it from a new
/// connection moves it, so a reconnecting client takes over its sessions.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .connections
            .insert(connection_id.to_string(), HashSet::new());
    }

    /// Bind a session to a connection, moving it off any previous one
    pub async fn bind(&self, connection_id: &str, session_id: &str) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(connection_id) {
            return;
        }
        let previous = inner
            .owners
            .insert(session_id.to_string(), connection_id.to_string());
        if let Some(previous) = previous.filter(|previous| previous != connection_id) {
            if let Some(sessions) = inner.connections.get_mut(&previous) {
                sessions.remove(session_id);
            }
        }
        if let Some(sessions) = inner.connections.get_mut(connection_id) {
            sessions.insert(session_id.to_string());
        }
    }

    /// Remove a connection and return the sessions it still drove
    pub async fn unregister(&self, connection_id: &str) -> Vec<String> {
        let mut inner = self.inner.write().await;
        let Some(sessions) = inner.connections.remove(connection_id) else {
            return Vec::new();
        };
        let mut released: Vec<String> = sessions
            .into_iter()
            .filter(|session_id| {
                inner.owners.get(session_id).map(String::as_str) == Some(connection_id)
            })
            .collect();
        for session_id in &released {
            inner.owners.remove(session_id);
        }
        released.sort();
        released
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }
}
