//! SentinelKey configuration loading and parsing

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sentinelkey/config.toml";
pub const CONFIG_PATH_ENV: &str = "SENTINELKEY_CONFIG";
pub const CREDENTIAL_ENV: &str = "API_KEY";
pub const MODEL_ENV: &str = "SENTINELKEY_MODEL";
pub const BASE_URL_ENV: &str = "SENTINELKEY_BASE_URL";

/// Stand-in credential used when the operator explicitly allows running without one.
pub const PLACEHOLDER_CREDENTIAL: &str = "MISSING_KEY";

/// Root configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SentinelConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Generative backend settings. The credential is deliberately absent: it is
/// only ever taken from the process environment.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub allow_placeholder_credential: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            allow_placeholder_credential: false,
        }
    }
}

impl BackendConfig {
    /// Apply `SENTINELKEY_MODEL` / `SENTINELKEY_BASE_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(MODEL_ENV).ok(),
            std::env::var(BASE_URL_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, model: Option<String>, base_url: Option<String>) {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "backend.model",
                reason: "must not be empty".into(),
            });
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                field: "backend.base_url",
                reason: format!("expected an http(s) URL, got {:?}", self.base_url),
            });
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "backend.timeout_seconds",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Backend credential. Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    placeholder: bool,
}

impl Credential {
    /// Read the credential from `API_KEY`.
    pub fn from_env(allow_placeholder: bool) -> Result<Self, ConfigError> {
        Self::resolve(std::env::var(CREDENTIAL_ENV).ok(), allow_placeholder)
    }

    /// Resolve a credential from an optional raw value. An absent or blank
    /// value is an error unless the placeholder is allowed.
    pub fn resolve(raw: Option<String>, allow_placeholder: bool) -> Result<Self, ConfigError> {
        match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(value) => Ok(Self {
                value,
                placeholder: false,
            }),
            None if allow_placeholder => {
                tracing::warn!(
                    "{CREDENTIAL_ENV} not found, continuing with placeholder credential; requests will be rejected by the backend"
                );
                Ok(Self {
                    value: PLACEHOLDER_CREDENTIAL.to_string(),
                    placeholder: true,
                })
            }
            None => Err(ConfigError::MissingCredential(CREDENTIAL_ENV)),
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.placeholder {
            f.write_str("Credential(placeholder)")
        } else {
            f.write_str("Credential(***)")
        }
    }
}

// Default value functions
fn default_log_level() -> String { "info".into() }
fn default_model() -> String { "gemini-3-flash-preview".into() }
fn default_base_url() -> String { "https://generativelanguage.googleapis.com".into() }
fn default_timeout() -> u64 { 120 }

/// Load configuration from `$SENTINELKEY_CONFIG`, or /etc/sentinelkey/config.toml
pub fn load_config() -> Result<SentinelConfig, ConfigError> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(Path::new(&config_path))
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<SentinelConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str::<SentinelConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path.display());
        SentinelConfig::default()
    };

    config.backend.apply_env_overrides();
    config.backend.validate()?;
    Ok(config)
}
