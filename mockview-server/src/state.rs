//! Shared application state for the mockview server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockview_core::InterviewService;

use crate::ws::ConnectionRegistry;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Interview state machine
    pub service: InterviewService,
    /// Live WebSocket connections and the sessions they drive
    pub connections: Arc<ConnectionRegistry>,
    /// Abandon a connection's sessions when it drops
    pub abandon_on_disconnect: bool,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: InterviewService) -> Self {
        Self {
            service,
            connections: Arc::new(ConnectionRegistry::new()),
            abandon_on_disconnect: true,
            started_at: Utc::now(),
        }
    }

    /// Keep sessions open across disconnects
    pub fn with_abandon_on_disconnect(mut self, abandon: bool) -> Self {
        self.abandon_on_disconnect = abandon;
        self
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
