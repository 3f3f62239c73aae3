//! mockview serve command for running the interview server
//!
//! The serve command runs the mockview server which provides:
//! - WebSocket endpoint for interview sessions
//! - HTTP API for health and interview history

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use mockview_core::{
    InterviewService, InterviewerConfig, MemoryProfileDirectory, MemorySessionStore,
    ModelInterviewer, ProfileProvider, ServiceConfig, SessionStore,
};
use mockview_models::{GeminiProvider, ModelProvider};
use mockview_server::{AppState, MockviewServer, ServerConfig};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::config::{API_KEY_ENV, ConfigLoader, JWT_SECRET_ENV, MockviewConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Seconds between feedback and the next question (overrides config)
    #[arg(long)]
    pub pacing_delay: Option<u64>,
}

impl ServeArgs {
    /// CLI flags are the last configuration layer
    fn apply(&self, config: &mut MockviewConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(secs) = self.pacing_delay {
            config.interview.pacing_delay_secs = secs;
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    args.apply(&mut config);

    if config.auth.jwt_secret.is_empty() {
        bail!("No JWT secret configured; set {JWT_SECRET_ENV} or [auth] jwt_secret");
    }
    if config.ai.api_key.is_none() {
        warn!(
            "{} is not set; interviews will use fallback questions and evaluations",
            API_KEY_ENV
        );
    }

    let state = build_state(&config).await?;
    let server_config = server_config(&config);

    info!(
        "Starting mockview server on {}:{}",
        server_config.host, server_config.port
    );

    let server = MockviewServer::with_state(server_config, Arc::new(state));
    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shutdown.cancel();
        }
    });

    server.run().await?;
    Ok(())
}

fn server_config(config: &MockviewConfig) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        auth: config.auth.to_auth_config(),
        stale_after: config.interview.stale_after(),
        reap_interval: config.interview.reap_interval(),
    }
}

/// Wire the interview service from configuration
async fn build_state(config: &MockviewConfig) -> Result<AppState> {
    let provider = GeminiProvider::with_base_url(
        config.ai.api_key.clone().map(SecretString::from),
        config.ai.base_url.clone(),
    );
    let ai = ModelInterviewer::new(
        Arc::new(provider) as Arc<dyn ModelProvider>,
        InterviewerConfig {
            model: config.ai.model.clone(),
            timeout: config.interview.ai_timeout(),
            ..InterviewerConfig::default()
        },
    );

    let profiles = match &config.profiles.path {
        Some(path) => {
            let directory = MemoryProfileDirectory::load(path)
                .await
                .with_context(|| format!("Failed to load profiles from {}", path.display()))?;
            info!(
                users = directory.user_count().await,
                "Loaded candidate profiles"
            );
            directory
        }
        None => {
            warn!("No [profiles] path configured; every start_interview will fail with NOT_FOUND");
            MemoryProfileDirectory::new()
        }
    };

    let service = InterviewService::new(
        Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>,
        Arc::new(ai),
        Arc::new(profiles) as Arc<dyn ProfileProvider>,
        ServiceConfig {
            pacing_delay: config.interview.pacing_delay(),
        },
    );

    Ok(AppState::new(service).with_abandon_on_disconnect(config.interview.abandon_on_disconnect))
}
