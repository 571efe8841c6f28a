//! Provider configuration
//!
//! Values arrive in the ConfigureProvider payload; anything left unset falls
//! back to the `FORTIMANAGER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const ENV_HOSTNAME: &str = "FORTIMANAGER_ACCESS_HOSTNAME";
pub const ENV_USERNAME: &str = "FORTIMANAGER_ADMIN_USERNAME";
pub const ENV_PASSWORD: &str = "FORTIMANAGER_ADMIN_PASSWORD";
pub const ENV_TOKEN: &str = "FORTIMANAGER_ACCESS_TOKEN";
pub const ENV_INSECURE: &str = "FORTIMANAGER_INSECURE_FLAG";
pub const ENV_CABUNDLE: &str = "FORTIMANAGER_CA_CABUNDLE";

/// Configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("hostname is required (set it in the provider block or FORTIMANAGER_ACCESS_HOSTNAME)")]
    MissingHostname,
    #[error("either token or username/password must be provided")]
    MissingCredentials,
    #[error("invalid import option '{0}', expected key=value")]
    InvalidImportOption(String),
    #[error("invalid {field} '{value}', expected one of: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

/// Provider configuration as written in the `provider` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub insecure: Option<bool>,
    pub cabundlefile: Option<String>,
    pub adom: Option<String>,
    pub workspace_mode: Option<String>,
    #[serde(default)]
    pub import_options: Option<Vec<String>>,
    pub retries: Option<u32>,
}

/// How the provider authenticates against FortiManager
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Token(String),
    Session { username: String, password: String },
}

/// ADOM workspace handling for write operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceMode {
    #[default]
    Disable,
    Normal,
}

/// Fully resolved provider settings
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub hostname: String,
    pub credentials: Credentials,
    pub insecure: bool,
    pub cabundlefile: Option<String>,
    pub adom: String,
    pub workspace_mode: WorkspaceMode,
    pub import_options: ImportOptions,
    pub retries: u32,
}

impl ProviderConfig {
    /// Resolve against the process environment
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using `env` for fallback lookups
    pub fn resolve_with<F>(self, env: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: Option<String>, key: &str| {
            value.filter(|v| !v.is_empty()).or_else(|| env(key).filter(|v| !v.is_empty()))
        };

        let hostname = pick(self.hostname, ENV_HOSTNAME).ok_or(ConfigError::MissingHostname)?;
        let hostname = normalize_hostname(&hostname);

        let credentials = match pick(self.token, ENV_TOKEN) {
            Some(token) => Credentials::Token(token),
            None => match (pick(self.username, ENV_USERNAME), pick(self.password, ENV_PASSWORD)) {
                (Some(username), Some(password)) => Credentials::Session { username, password },
                _ => return Err(ConfigError::MissingCredentials),
            },
        };

        let insecure = match self.insecure {
            Some(flag) => flag,
            None => env(ENV_INSECURE)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(false),
        };

        let workspace_mode = match self.workspace_mode.as_deref() {
            None | Some("disable") => WorkspaceMode::Disable,
            Some("normal") => WorkspaceMode::Normal,
            Some(other) => {
                return Err(ConfigError::InvalidChoice {
                    field: "workspace_mode",
                    value: other.to_string(),
                    allowed: "disable, normal",
                })
            }
        };

        Ok(ResolvedConfig {
            hostname,
            credentials,
            insecure,
            cabundlefile: pick(self.cabundlefile, ENV_CABUNDLE),
            adom: self.adom.unwrap_or_else(|| "root".to_string()),
            workspace_mode,
            import_options: ImportOptions::parse(&self.import_options.unwrap_or_default())?,
            retries: self.retries.unwrap_or(1).max(1),
        })
    }
}

/// Prefix a bare host with `https://` and strip trailing slashes
fn normalize_hostname(hostname: &str) -> String {
    let trimmed = hostname.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// `key=value` pairs that supply path parameters when importing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOptions {
    values: HashMap<String, String>,
}

impl ImportOptions {
    pub fn parse(options: &[String]) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for option in options {
            let (key, value) = option
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| ConfigError::InvalidImportOption(option.clone()))?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}
