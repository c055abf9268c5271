//! Client configuration file.
//!
//! `config.json` in the config directory records which server to talk to
//! and which plan is current. Environment variables override the file and
//! command-line flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::XdgDirs;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_API_HOST: &str = "https://api.modelsync.dev";
pub const DEFAULT_TOKEN_ENV_VAR: &str = "MODELSYNC_TOKEN";

const API_HOST_ENV: &str = "MODELSYNC_API_HOST";
const CLOUD_ENV: &str = "MODELSYNC_CLOUD";

/// Error type for client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Not authenticated: set {0}")]
    MissingToken(String),

    #[error("No current plan. Pass --plan or set currentPlan in {0}")]
    NoCurrentPlan(PathBuf),
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_token_env_var() -> String {
    DEFAULT_TOKEN_ENV_VAR.to_string()
}

/// Connection and current-plan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Managed cloud hosting: no custom providers, no local-provider packs
    #[serde(default)]
    pub is_cloud: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
    #[serde(default = "default_branch")]
    pub current_branch: String,
    /// Environment variable holding the auth token
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            is_cloud: false,
            org_id: None,
            current_plan: None,
            current_branch: default_branch(),
            token_env_var: default_token_env_var(),
        }
    }
}

impl ClientConfig {
    /// Path of the config file inside `dirs`.
    pub fn path_in(dirs: &XdgDirs) -> PathBuf {
        dirs.config.join(CONFIG_FILE_NAME)
    }

    /// Load from the config directory, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load(dirs: &XdgDirs) -> Result<Self, ConfigError> {
        let mut config = match Self::load_from_path(&Self::path_in(dirs)) {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Apply `MODELSYNC_API_HOST` and `MODELSYNC_CLOUD`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var(API_HOST_ENV) {
            if !host.trim().is_empty() {
                self.api_host = host.trim().to_string();
            }
        }
        if let Ok(value) = std::env::var(CLOUD_ENV) {
            self.is_cloud = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                var: CLOUD_ENV,
                value,
            })?;
        }
        Ok(())
    }

    /// Auth token from the configured environment variable.
    pub fn token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.token_env_var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env_var.clone()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
