use crate::auth::Role;
use crate::error::{NotesError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub token: String,
    pub name: String,
    pub role: Role,
}

/// Bearer tokens accepted by the server. With no tokens configured every
/// request runs as the local editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn lookup(&self, token: &str) -> Option<&ApiToken> {
        self.tokens.iter().find(|t| t.token == token)
    }
}

// ---------------------------------------------------------------------------
// PersistenceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_save_attempts")]
    pub save_attempts: u32,
    /// Initial delay between save attempts; doubles after each failure.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_save_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    25
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_attempts: default_save_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(NotesError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.persistence.save_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "persistence.save_attempts must be at least 1".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for t in &self.auth.tokens {
            if t.token.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("auth token for '{}' is empty", t.name),
                });
            } else if !seen.insert(t.token.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("auth token for '{}' is a duplicate", t.name),
                });
            }
        }

        if !self.auth.enabled() && self.server.bind != "127.0.0.1" && self.server.bind != "localhost" {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "server binds to {} with no auth tokens; every caller is an editor",
                    self.server.bind
                ),
            });
        }

        warnings
    }
}
