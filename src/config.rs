//! Configuration loading and management.
//!
//! Loads pagepulse configuration from `./config.toml` (or
//! `$PULSE_CONFIG_PATH`). Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

// ── Top-level config ────────────────────────────────────────────

/// Top-level pagepulse configuration loaded from TOML.
///
/// Path: `./config.toml` or `$PULSE_CONFIG_PATH`.
/// Env vars override file values; file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// HTTP server settings (`[server]`).
    pub server: ServerConfig,
    /// Facebook Graph API settings (`[facebook]`).
    pub facebook: FacebookConfig,
    /// Conversation triage constants (`[triage]`).
    pub triage: TriageConfig,
    /// Gemini model settings (`[gemini]`).
    pub gemini: GeminiConfig,
}

impl PulseConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$PULSE_CONFIG_PATH` or `./config.toml`.
    /// If the file does not exist, returns defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file(None)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Like [`PulseConfig::load`] but with an explicit file path
    /// (CLI `--config` override).
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let mut config = Self::load_from_file(Some(path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => Self::config_path_with(|key| std::env::var(key).ok()),
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: PulseConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(PulseConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("PULSE_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("config.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Server.
        if let Some(v) = env("PULSE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env("PULSE_PORT") {
            match v.parse() {
                Ok(n) => self.server.port = n,
                Err(_) => tracing::warn!(
                    var = "PULSE_PORT",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("PULSE_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Some(v) = env("PULSE_LOGS_DIR") {
            self.server.logs_dir = Some(v);
        }
        if let Some(v) = env("PULSE_REQUEST_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.server.request_timeout_seconds = n,
                Err(_) => tracing::warn!(
                    var = "PULSE_REQUEST_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Facebook. The access token keeps the deployment's historical
        // env var name rather than a PULSE_ prefix.
        if let Some(v) = env("FACEBOOK_ACCESS_TOKEN") {
            self.facebook.access_token = Some(v);
        }
        if let Some(v) = env("PULSE_FACEBOOK_PAGE_ID") {
            self.facebook.page_id = v;
        }
        if let Some(v) = env("PULSE_FACEBOOK_API_VERSION") {
            self.facebook.api_version = v;
        }

        // Gemini.
        if let Some(v) = env("GEMINI_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = env("PULSE_GEMINI_MODEL") {
            self.gemini.model = v;
        }
    }

    /// Parse a TOML string into config (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: PulseConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Server config ───────────────────────────────────────────────

/// HTTP server settings (`[server]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Tracing log level filter (overridable via `RUST_LOG`).
    pub log_level: String,
    /// Directory for rotated JSON log files. Console-only when unset.
    pub logs_dir: Option<String>,
    /// Timeout applied to each outbound collaborator call, in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            logs_dir: None,
            request_timeout_seconds: 30,
        }
    }
}

// ── Facebook config ─────────────────────────────────────────────

/// Facebook Graph API settings (`[facebook]`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    /// Graph API base URL.
    pub graph_api_base: String,
    /// Graph API version segment.
    pub api_version: String,
    /// The Page whose conversations are fetched.
    pub page_id: String,
    /// Page access token. Fetching fails eagerly when absent.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("graph_api_base", &self.graph_api_base)
            .field("api_version", &self.api_version)
            .field("page_id", &self.page_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "__REDACTED__"),
            )
            .finish()
    }
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            graph_api_base: "https://graph.facebook.com".to_string(),
            api_version: "v22.0".to_string(),
            page_id: "145247595328632".to_string(),
            access_token: None,
        }
    }
}

// ── Triage config ───────────────────────────────────────────────

/// Conversation triage constants (`[triage]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// The business-side display name filtered out when resolving
    /// the customer's identity.
    pub page_owner: String,
    /// Substring whose case-insensitive presence in a message marks
    /// a subscription event.
    pub subscription_keyword: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            page_owner: "Ai Egypt".to_string(),
            subscription_keyword: "وصل".to_string(),
        }
    }
}

// ── Gemini config ───────────────────────────────────────────────

/// Gemini model settings (`[gemini]`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Generative Language API base URL.
    pub api_base: String,
    /// Model identifier for `generateContent` calls.
    pub model: String,
    /// API key. Analysis fails (wrapped) when absent.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
