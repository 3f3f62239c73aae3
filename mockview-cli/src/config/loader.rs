use super::types::{
    AiConfigSection, AuthConfigSection, DEFAULT_HOST, DEFAULT_PORT, InterviewConfigSection,
    MockviewConfig, ProfilesConfigSection, RawAiConfig, RawAuthConfig, RawInterviewConfig,
    RawMockviewConfig, RawServerConfig, ServerConfigSection,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the token signing secret
pub const JWT_SECRET_ENV: &str = "MOCKVIEW_JWT_SECRET";

/// Overrides the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "MOCKVIEW_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user, project, then environment)
    pub fn load() -> Result<MockviewConfig> {
        Self::load_from(
            Self::user_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Load from explicit file locations, then apply the environment
    pub fn load_from(user_path: Option<&Path>, project_path: &Path) -> Result<MockviewConfig> {
        let mut raw = RawMockviewConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user_path {
            if user_path.exists() {
                raw = Self::merge_raw(raw, Self::read(user_path)?);
            }
        }

        // Layer 2: Project config
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read(project_path)?);
        }

        // Layer 3: Environment
        raw = Self::apply_env(raw);

        Ok(Self::finalize(raw))
    }

    fn read(path: &Path) -> Result<RawMockviewConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mockview").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with MOCKVIEW_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".mockview/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawMockviewConfig, overlay: RawMockviewConfig) -> RawMockviewConfig {
        RawMockviewConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            interview: RawInterviewConfig {
                pacing_delay_secs: overlay
                    .interview
                    .pacing_delay_secs
                    .or(base.interview.pacing_delay_secs),
                ai_timeout_secs: overlay
                    .interview
                    .ai_timeout_secs
                    .or(base.interview.ai_timeout_secs),
                abandon_on_disconnect: overlay
                    .interview
                    .abandon_on_disconnect
                    .or(base.interview.abandon_on_disconnect),
                stale_after_mins: overlay
                    .interview
                    .stale_after_mins
                    .or(base.interview.stale_after_mins),
                reap_interval_secs: overlay
                    .interview
                    .reap_interval_secs
                    .or(base.interview.reap_interval_secs),
            },
            ai: RawAiConfig {
                model: overlay.ai.model.or(base.ai.model),
                base_url: overlay.ai.base_url.or(base.ai.base_url),
                api_key: overlay.ai.api_key.or(base.ai.api_key),
            },
            auth: RawAuthConfig {
                jwt_secret: overlay.auth.jwt_secret.or(base.auth.jwt_secret),
                token_ttl_hours: overlay.auth.token_ttl_hours.or(base.auth.token_ttl_hours),
            },
            profiles: ProfilesConfigSection {
                path: overlay.profiles.path.or(base.profiles.path),
            },
        }
    }

    /// Credentials from the environment win over files
    fn apply_env(mut raw: RawMockviewConfig) -> RawMockviewConfig {
        if let Some(key) = non_empty_env(API_KEY_ENV) {
            raw.ai.api_key = Some(key);
        }
        if let Some(secret) = non_empty_env(JWT_SECRET_ENV) {
            raw.auth.jwt_secret = Some(secret);
        }
        raw
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawMockviewConfig) -> MockviewConfig {
        let interview = InterviewConfigSection::default();
        let ai = AiConfigSection::default();
        let auth = AuthConfigSection::default();

        MockviewConfig {
            server: ServerConfigSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            interview: InterviewConfigSection {
                pacing_delay_secs: raw
                    .interview
                    .pacing_delay_secs
                    .unwrap_or(interview.pacing_delay_secs),
                ai_timeout_secs: raw
                    .interview
                    .ai_timeout_secs
                    .unwrap_or(interview.ai_timeout_secs),
                abandon_on_disconnect: raw
                    .interview
                    .abandon_on_disconnect
                    .unwrap_or(interview.abandon_on_disconnect),
                stale_after_mins: raw
                    .interview
                    .stale_after_mins
                    .unwrap_or(interview.stale_after_mins),
                reap_interval_secs: raw
                    .interview
                    .reap_interval_secs
                    .unwrap_or(interview.reap_interval_secs),
            },
            ai: AiConfigSection {
                model: raw.ai.model.unwrap_or(ai.model),
                base_url: raw.ai.base_url.unwrap_or(ai.base_url),
                api_key: raw.ai.api_key,
            },
            auth: AuthConfigSection {
                jwt_secret: raw.auth.jwt_secret.unwrap_or(auth.jwt_secret),
                token_ttl_hours: raw.auth.token_ttl_hours.unwrap_or(auth.token_ttl_hours),
            },
            profiles: raw.profiles,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
