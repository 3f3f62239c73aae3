//! mockview-server - HTTP and WebSocket server for mock interviews
//!
//! This crate hosts the [`InterviewService`](mockview_core::InterviewService)
//! behind an authenticated WebSocket endpoint. Each connection drives its own
//! interview sessions; a background reaper abandons sessions left idle.

mod error;
pub mod http;
pub mod middleware;
mod state;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use mockview_core::AuthConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::ServerError;
pub use http::create_router;
pub use middleware::{AuthLayer, auth_middleware};
pub use state::AppState;

/// The main mockview server
pub struct MockviewServer {
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: CancellationToken,
}

impl MockviewServer {
    /// Create a server around prepared application state
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self {
            config,
            state,
            shutdown: CancellationToken::new(),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Token that stops the server and its reaper when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("mockview server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Run the server on an already-bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        if !self.config.auth.is_valid() {
            return Err(ServerError::Internal(
                "a JWT secret is required to serve interviews".to_string(),
            ));
        }

        self.start_reaper();

        let auth = AuthLayer::new(&self.config.auth);
        let router = create_router(Arc::clone(&self.state), auth);
        let shutdown = self.shutdown.clone();
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Start a background task that abandons stale sessions
    fn start_reaper(&self) {
        let state = Arc::clone(&self.state);
        let shutdown = self.shutdown.clone();
        let interval = self.config.reap_interval.max(Duration::from_secs(1));
        let stale_after = self.config.stale_after;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = state.service.reap_stale(stale_after).await {
                            tracing::warn!("Stale session sweep failed: {}", e);
                        }
                    }
                }
            }
        });
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Token verification settings
    pub auth: AuthConfig,
    /// Sessions idle this long are abandoned by the reaper
    pub stale_after: Duration,
    /// How often the reaper runs
    pub reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7450,
            auth: AuthConfig::default(),
            stale_after: Duration::from_secs(60 * 60),
            reap_interval: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Returns the socket address string (e.g., "127.0.0.1:7450")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
