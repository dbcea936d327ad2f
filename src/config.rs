//! Layered configuration for the school evaluation service
//!
//! Sources are applied in order, later ones winning:
//! 1. Built-in defaults
//! 2. `school-eval.toml` (or the file given with `--config`)
//! 3. Environment variables prefixed `SCHOOL_EVAL__`, e.g.
//!    `SCHOOL_EVAL__LLM__MODEL` or `SCHOOL_EVAL__SERVER__ADDR`
//!
//! The gateway API key may also come from `LLM_GATEWAY_API_KEY`.

use crate::error::{EvalError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "school-eval.toml";

/// bcrypt work factor for new and upgraded credentials
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Environment variable consulted when `llm.api_key` is not configured
pub const API_KEY_ENV: &str = "LLM_GATEWAY_API_KEY";

/// Fully resolved service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub auth: AuthSettings,
    pub projects: ProjectSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path of the local libsql database file
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path().to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible chat-completion gateway
    pub base_url: String,
    /// Fixed model identifier sent with every request
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Lifetime of an issued session token
    pub session_ttl_hours: i64,
    /// bcrypt work factor for new and upgraded credentials
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Seed standard questions when a project is created
    pub auto_generate_questions: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            auto_generate_questions: true,
        }
    }
}

/// Get the default database path using XDG_DATA_HOME standard
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("school-eval")
        .join("school-eval.db")
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    ///
    /// When `path` is `None` the default file is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!("Loading configuration (file: {:?})", file);

        if path.is_some() && !file.exists() {
            return Err(EvalError::Config(config::ConfigError::Message(format!(
                "configuration file not found: {}",
                file.display()
            ))));
        }

        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("SCHOOL_EVAL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| EvalError::Config(config::ConfigError::Message(msg));

        self.server
            .addr
            .parse::<SocketAddr>()
            .map_err(|e| invalid(format!("server.addr '{}': {}", self.server.addr, e)))?;

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty".to_string()));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(invalid("auth.session_ttl_hours must be positive".to_string()));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(invalid(format!(
                "auth.bcrypt_cost must be within 4..=31, got {}",
                self.auth.bcrypt_cost
            )));
        }
        Ok(())
    }

    /// Listen address (validated on load)
    pub fn server_addr(&self) -> Result<SocketAddr> {
        self.server
            .addr
            .parse()
            .map_err(|e| EvalError::InvalidInput(format!("invalid address: {}", e)))
    }

    /// Resolve the LLM client configuration, reading the key from the
    /// environment when the file does not carry one
    pub fn llm_config(&self) -> LlmConfig {
        let api_key = self
            .llm
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()));

        if api_key.is_none() {
            warn!(
                "No LLM gateway key configured ({} or llm.api_key); analysis and reports will fail",
                API_KEY_ENV
            );
        }

        LlmConfig {
            base_url: self.llm.base_url.trim_end_matches('/').to_string(),
            model: self.llm.model.clone(),
            api_key: SecretString::from(api_key.unwrap_or_default()),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    /// Render the settings as a TOML template (secrets omitted)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EvalError::Other(e.to_string()))
    }
}

/// Connection settings for the chat-completion gateway
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: SecretString,
    pub timeout: Duration,
}
