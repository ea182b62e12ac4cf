//! Configuration management for phab-tools.
//!
//! Handles loading and saving configuration from TOML files, and resolving
//! Conduit credentials. Config files are stored in platform-specific
//! locations:
//!
//! - **macOS/Linux**: `~/.config/phab-tools/config.toml`
//! - **Windows**: `%APPDATA%\phab-tools\config.toml`
//!
//! Credential resolution order: explicit per-call token → environment
//! (`PHABRICATOR_TOKEN` / `PHABRICATOR_URL`) → config file. The result is a
//! plain [`Credentials`] value resolved once per request and passed down,
//! never ambient state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "phab-tools";

/// Environment variable holding the API token.
pub const TOKEN_ENV_VAR: &str = "PHABRICATOR_TOKEN";

/// Environment variable holding the instance URL.
pub const URL_ENV_VAR: &str = "PHABRICATOR_URL";

/// Default Phabricator instance when none is configured.
pub const DEFAULT_PHABRICATOR_URL: &str = "https://phabricator.wikimedia.org";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Conduit endpoint configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conduit: Option<ConduitConfig>,
}

/// Conduit endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConduitConfig {
    /// Phabricator instance URL
    #[serde(default = "default_phabricator_url")]
    pub url: String,
    /// Fallback API token (environment and per-call tokens take precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_phabricator_url() -> String {
    DEFAULT_PHABRICATOR_URL.to_string()
}

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `conduit.url` or `conduit.token`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "conduit.url" | "url" => {
                let conduit = self.conduit.get_or_insert_with(|| ConduitConfig {
                    url: default_phabricator_url(),
                    token: None,
                });
                conduit.url = value.to_string();
            }
            "conduit.token" | "token" => {
                let conduit = self.conduit.get_or_insert_with(|| ConduitConfig {
                    url: default_phabricator_url(),
                    token: None,
                });
                conduit.token = Some(value.to_string());
            }
            _ => {
                return Err(Error::Config(format!(
                    "Unknown config key '{}'. Expected conduit.url or conduit.token",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(conduit) = &self.conduit else {
            return match key {
                "conduit.url" | "url" | "conduit.token" | "token" => Ok(None),
                _ => Err(Error::Config(format!("Unknown config key '{}'", key))),
            };
        };
        match key {
            "conduit.url" | "url" => Ok(Some(conduit.url.clone())),
            "conduit.token" | "token" => Ok(conduit.token.clone()),
            _ => Err(Error::Config(format!("Unknown config key '{}'", key))),
        }
    }
}

// =============================================================================
// Credential resolution
// =============================================================================

/// Resolved Conduit credentials for a single request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub token: String,
}

impl Credentials {
    /// Resolve credentials from an optional per-call token, the environment,
    /// and the on-disk config, in that order.
    pub fn resolve(explicit_token: Option<&str>) -> Result<Self> {
        let config = Config::load().unwrap_or_default();
        Self::resolve_with(
            explicit_token,
            std::env::var(TOKEN_ENV_VAR).ok().as_deref(),
            std::env::var(URL_ENV_VAR).ok().as_deref(),
            &config,
        )
    }

    /// Resolution logic with every input passed explicitly (testable).
    pub fn resolve_with(
        explicit_token: Option<&str>,
        env_token: Option<&str>,
        env_url: Option<&str>,
        config: &Config,
    ) -> Result<Self> {
        let url = env_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| config.conduit.as_ref().map(|c| c.url.clone()))
            .unwrap_or_else(default_phabricator_url);

        let token = explicit_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| {
                env_token
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            })
            .or_else(|| config.conduit.as_ref().and_then(|c| c.token.clone()))
            .ok_or_else(|| {
                Error::Auth(format!(
                    "No API token available. Pass api_token, set {}, or run `phab config set conduit.token <token>`",
                    TOKEN_ENV_VAR
                ))
            })?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.conduit.is_none());
        assert_eq!(config.get("conduit.token").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("conduit.url", "https://phab.example.com").unwrap();
        config.set("conduit.token", "api-abc123").unwrap();

        assert_eq!(
            config.get("conduit.url").unwrap(),
            Some("https://phab.example.com".to_string())
        );
        assert_eq!(
            config.get("conduit.token").unwrap(),
            Some("api-abc123".to_string())
        );
    }

    #[test]
    fn test_invalid_key() {
        let mut config = Config::default();
        assert!(config.set("unknown.key", "value").is_err());
        assert!(config.get("unknown.key").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config::default();
        config.conduit = Some(ConduitConfig {
            url: "https://phab.example.com".to_string(),
            token: Some("api-xyz".to_string()),
        });

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("url = \"https://phab.example.com\""));
        assert!(contents.contains("token = \"api-xyz\""));

        let loaded = Config::load_from(&path).unwrap();
        let conduit = loaded.conduit.unwrap();
        assert_eq!(conduit.url, "https://phab.example.com");
        assert_eq!(conduit.token.as_deref(), Some("api-xyz"));
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.conduit.is_none());
    }

    #[test]
    fn test_resolve_explicit_token_wins() {
        let config = Config {
            conduit: Some(ConduitConfig {
                url: "https://from-config.example.com".to_string(),
                token: Some("config-token".to_string()),
            }),
        };

        let creds = Credentials::resolve_with(
            Some("explicit-token"),
            Some("env-token"),
            None,
            &config,
        )
        .unwrap();

        assert_eq!(creds.token, "explicit-token");
        assert_eq!(creds.url, "https://from-config.example.com");
    }

    #[test]
    fn test_resolve_env_over_config() {
        let config = Config {
            conduit: Some(ConduitConfig {
                url: "https://from-config.example.com".to_string(),
                token: Some("config-token".to_string()),
            }),
        };

        let creds = Credentials::resolve_with(
            None,
            Some("env-token"),
            Some("https://from-env.example.com/"),
            &config,
        )
        .unwrap();

        assert_eq!(creds.token, "env-token");
        // Trailing slash trimmed
        assert_eq!(creds.url, "https://from-env.example.com");
    }

    #[test]
    fn test_resolve_config_fallback() {
        let config = Config {
            conduit: Some(ConduitConfig {
                url: default_phabricator_url(),
                token: Some("config-token".to_string()),
            }),
        };

        let creds = Credentials::resolve_with(None, None, None, &config).unwrap();
        assert_eq!(creds.token, "config-token");
        assert_eq!(creds.url, DEFAULT_PHABRICATOR_URL);
    }

    #[test]
    fn test_resolve_no_token_errors() {
        let config = Config::default();
        let result = Credentials::resolve_with(None, None, None, &config);
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test]
    fn test_resolve_blank_tokens_skipped() {
        let config = Config {
            conduit: Some(ConduitConfig {
                url: default_phabricator_url(),
                token: Some("config-token".to_string()),
            }),
        };

        // Whitespace-only explicit and env tokens fall through to config
        let creds = Credentials::resolve_with(Some("  "), Some(""), None, &config).unwrap();
        assert_eq!(creds.token, "config-token");
    }
}
