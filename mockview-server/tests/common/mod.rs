//! Shared test utilities for mockview-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mockview_core::{
    AuthConfig, CandidateProfile, InterviewService, InterviewerConfig, MemoryProfileDirectory,
    MemorySessionStore, ModelInterviewer, ProfileProvider, ServiceConfig, SessionStore,
    TokenValidator,
};
use mockview_models::{ModelProvider, ScriptedProvider};
use mockview_server::{AppState, MockviewServer, ServerConfig};
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A running server plus handles for driving and inspecting it
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub provider: Arc<ScriptedProvider>,
    pub store: Arc<MemorySessionStore>,
}

impl TestServer {
    /// Mint a token for `user_id` signed with the server's secret
    #[allow(dead_code)]
    pub fn token_for(&self, user_id: &str) -> String {
        TokenValidator::new(TEST_SECRET)
            .issue(user_id, chrono::Duration::hours(1))
            .unwrap()
    }
}

/// Creates a test server with users `u1` and `u2`, a short pacing delay,
/// and sessions abandoned on disconnect
#[allow(dead_code)]
pub async fn create_test_server() -> TestServer {
    create_test_server_with(true).await
}

/// Creates a test server, choosing whether disconnects abandon sessions
#[allow(dead_code)]
pub async fn create_test_server_with(abandon_on_disconnect: bool) -> TestServer {
    let provider = Arc::new(ScriptedProvider::new());
    let store = Arc::new(MemorySessionStore::new());
    let profiles = Arc::new(MemoryProfileDirectory::new());
    for user_id in ["u1", "u2"] {
        profiles
            .set_profile(
                user_id,
                CandidateProfile {
                    name: user_id.to_uppercase(),
                    ..Default::default()
                },
            )
            .await;
    }

    let ai = Arc::new(ModelInterviewer::new(
        Arc::clone(&provider) as Arc<dyn ModelProvider>,
        InterviewerConfig::default(),
    ));
    let service = InterviewService::new(
        Arc::clone(&store) as Arc<dyn SessionStore>,
        ai,
        profiles as Arc<dyn ProfileProvider>,
        ServiceConfig {
            pacing_delay: Duration::from_millis(50),
        },
    );
    let state = Arc::new(
        AppState::new(service).with_abandon_on_disconnect(abandon_on_disconnect),
    );

    let config = ServerConfig::new("127.0.0.1", 0).with_auth(AuthConfig::new(TEST_SECRET));
    let server = MockviewServer::with_state(config, Arc::clone(&state));
    let addr = spawn_server(server).await;

    TestServer {
        addr,
        state,
        provider,
        store,
    }
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: MockviewServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}
