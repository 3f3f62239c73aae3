use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default host for the mockview server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the mockview server
pub const DEFAULT_PORT: u16 = 7450;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const REDACTED: &str = "********";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMockviewConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub interview: RawInterviewConfig,

    #[serde(default)]
    pub ai: RawAiConfig,

    #[serde(default)]
    pub auth: RawAuthConfig,

    #[serde(default)]
    pub profiles: ProfilesConfigSection,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInterviewConfig {
    pub pacing_delay_secs: Option<u64>,
    pub ai_timeout_secs: Option<u64>,
    pub abandon_on_disconnect: Option<bool>,
    pub stale_after_mins: Option<u64>,
    pub reap_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAiConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MockviewConfig {
    #[serde(default)]
    pub server: ServerConfigSection,

    #[serde(default)]
    pub interview: InterviewConfigSection,

    #[serde(default)]
    pub ai: AiConfigSection,

    #[serde(default)]
    pub auth: AuthConfigSection,

    #[serde(default)]
    pub profiles: ProfilesConfigSection,
}

impl MockviewConfig {
    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.ai.api_key.is_some() {
            config.ai.api_key = Some(REDACTED.to_string());
        }
        if !config.auth.jwt_secret.is_empty() {
            config.auth.jwt_secret = REDACTED.to_string();
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfigSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfigSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Interview pacing and session lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfigSection {
    /// Wait between feedback and the next question
    pub pacing_delay_secs: u64,
    /// Upper bound on one model call
    pub ai_timeout_secs: u64,
    /// Abandon a connection's sessions when it drops
    pub abandon_on_disconnect: bool,
    /// Idle time after which the reaper abandons a session
    pub stale_after_mins: u64,
    pub reap_interval_secs: u64,
}

impl Default for InterviewConfigSection {
    fn default() -> Self {
        Self {
            pacing_delay_secs: 3,
            ai_timeout_secs: 30,
            abandon_on_disconnect: true,
            stale_after_mins: 60,
            reap_interval_secs: 300,
        }
    }
}

impl InterviewConfigSection {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_mins * 60)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfigSection {
    pub model: String,
    pub base_url: String,
    /// Prefer `GEMINI_API_KEY` over storing this in a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for AiConfigSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: mockview_models::providers::DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfigSection {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl Default for AuthConfigSection {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
        }
    }
}

impl AuthConfigSection {
    pub fn to_auth_config(&self) -> mockview_core::AuthConfig {
        mockview_core::AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: self.token_ttl_hours,
            ..mockview_core::AuthConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesConfigSection {
    /// JSON file seeding candidate profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
