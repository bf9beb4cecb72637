//! Service configuration
//!
//! Loaded from an optional TOML file, then overridden by `CASEGEN_*`
//! environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CASEGEN_LLM_API_KEY` | `llm.api_key` |
//! | `CASEGEN_LLM_PROVIDER` | `llm.provider` |
//! | `CASEGEN_LLM_MODEL` | `llm.model` |
//! | `CASEGEN_GITHUB_CLIENT_ID` | `github.client_id` |
//! | `CASEGEN_GITHUB_CLIENT_SECRET` | `github.client_secret` |
//! | `CASEGEN_OAUTH_CALLBACK_URL` | `github.callback_url` |
//! | `CASEGEN_GITHUB_TOKEN` | `github.webhook_token` |
//! | `CASEGEN_DB_PATH` | `store.path` (selects the SQLite backend) |
//! | `CASEGEN_PORT` | `server.port` |

use casegen_core::DEFAULT_SEPARATOR;
use casegen_github::{OAuthApp, GITHUB_API_BASE, GITHUB_OAUTH_BASE};
use casegen_llm::LlmSettings;
use casegen_store::{StoreBackend, StoreSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override holds an unusable value
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Validation failed
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// GitHub settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// REST API base
    pub api_base: String,
    /// OAuth base
    pub oauth_base: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// OAuth redirect URI
    pub callback_url: String,
    /// Token used to read pull requests named by webhook deliveries
    pub webhook_token: Option<String>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            oauth_base: GITHUB_OAUTH_BASE.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:8080/auth/github/callback".to_string(),
            webhook_token: None,
        }
    }
}

impl GitHubSettings {
    /// OAuth application credentials
    #[must_use]
    pub fn oauth_app(&self) -> OAuthApp {
        OAuthApp {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            callback_url: self.callback_url.clone(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Token separating test cases in LLM replies
    pub separator: String,
    /// Completion provider
    pub llm: LlmSettings,
    /// GitHub access
    pub github: GitHubSettings,
    /// Persistence
    pub store: StoreSettings,
    /// HTTP listener
    pub server: ServerSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            llm: LlmSettings::default(),
            github: GitHubSettings::default(),
            store: StoreSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With completion settings
    #[inline]
    #[must_use]
    pub fn with_llm(mut self, llm: LlmSettings) -> Self {
        self.llm = llm;
        self
    }

    /// With store settings
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: StoreSettings) -> Self {
        self.store = store;
        self
    }

    /// With listener port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// With separator token
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on invalid TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` on invalid TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// File (if any) plus process environment
    ///
    /// # Errors
    /// Returns error if the file or an override is invalid
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        tracing::debug!(
            provider = %config.llm.provider,
            backend = ?config.store.backend,
            port = config.server.port,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Apply `CASEGEN_*` overrides from a variable lookup
    ///
    /// # Errors
    /// - `ConfigError::InvalidEnv` for an unknown provider or bad port
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = lookup("CASEGEN_LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(provider) = lookup("CASEGEN_LLM_PROVIDER") {
            self.llm.provider = provider.parse().map_err(|e: casegen_llm::LlmError| {
                ConfigError::InvalidEnv {
                    var: "CASEGEN_LLM_PROVIDER",
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(model) = lookup("CASEGEN_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(id) = lookup("CASEGEN_GITHUB_CLIENT_ID") {
            self.github.client_id = id;
        }
        if let Some(secret) = lookup("CASEGEN_GITHUB_CLIENT_SECRET") {
            self.github.client_secret = secret;
        }
        if let Some(url) = lookup("CASEGEN_OAUTH_CALLBACK_URL") {
            self.github.callback_url = url;
        }
        if let Some(token) = lookup("CASEGEN_GITHUB_TOKEN") {
            self.github.webhook_token = Some(token);
        }
        if let Some(path) = lookup("CASEGEN_DB_PATH") {
            self.store = StoreSettings::sqlite(path);
        }
        if let Some(port) = lookup("CASEGEN_PORT") {
            self.server.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: "CASEGEN_PORT",
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    /// Check the settings the server cannot start without
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.api_key is required (or set CASEGEN_LLM_API_KEY)".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.separator.trim().is_empty() {
            return Err(ConfigError::Invalid("separator must not be empty".into()));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.path.is_none() {
            return Err(ConfigError::Invalid("store.path is required for sqlite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegen_llm::LlmProvider;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::new();
        assert_eq!(config.separator, "ROW_SEPARATOR");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.github.api_base, "https://api.github.com");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            separator = "---CASE---"

            [llm]
            provider = "gemini"
            api_key = "g"

            [store]
            backend = "sqlite"
            path = "data/casegen.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.separator, "---CASE---");
        assert_eq!(config.store.path.as_deref(), Some(Path::new("data/casegen.db")));
        assert_eq!(config.server.port, 8080);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file() {
        let mut config = ServiceConfig::new();
        config
            .apply_env(env(&[
                ("CASEGEN_LLM_API_KEY", "sk-test"),
                ("CASEGEN_LLM_PROVIDER", "Gemini"),
                ("CASEGEN_DB_PATH", "/tmp/c.db"),
                ("CASEGEN_PORT", "9090"),
                ("CASEGEN_GITHUB_TOKEN", "ghp_x"),
            ]))
            .unwrap();
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.github.webhook_token.as_deref(), Some("ghp_x"));
    }

    #[test]
    fn bad_env_values_rejected() {
        let err = ServiceConfig::new()
            .apply_env(env(&[("CASEGEN_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CASEGEN_PORT", .. }));

        let err = ServiceConfig::new()
            .apply_env(env(&[("CASEGEN_LLM_PROVIDER", "mystery")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "CASEGEN_LLM_PROVIDER", .. }));
    }

    #[test]
    fn validate_requires_api_key() {
        let err = ServiceConfig::new().validate().unwrap_err();
        assert!(err.to_string().contains("llm.api_key"));
    }

    #[test]
    fn from_file_missing() {
        let err = ServiceConfig::from_file("/nonexistent/casegen.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casegen.toml");
        let config = ServiceConfig::new()
            .with_port(7000)
            .with_llm(LlmSettings::new().with_api_key("k"));
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(ServiceConfig::from_file(&path).unwrap(), config);
    }
}
