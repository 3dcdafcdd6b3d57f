//! Configuration for the Prompt School engine.
//!
//! Configuration comes from `school.json` in the working directory (missing
//! file means defaults) plus environment variables for the remote store
//! credentials, which are secrets and never live in the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "school.json";

/// Environment variable carrying the remote store base URL.
pub const STORE_URL_ENV: &str = "SCHOOL_STORE_URL";

/// Environment variable carrying the remote store API key.
pub const STORE_KEY_ENV: &str = "SCHOOL_STORE_KEY";

/// Default directory for locally persisted state (progress, identity).
fn default_data_dir() -> String {
    ".school".to_string()
}

/// Default output directory for generated reports.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Default port for the HTTP API server.
const fn default_port() -> u16 {
    4000
}

/// Default remote request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    10
}

/// Main configuration for the engine and its API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the progress file and cached learner identity.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Output directory for generated progress reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Port for the HTTP API server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Remote store settings. Sync stays disabled until a URL is configured.
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            port: default_port(),
            remote: RemoteConfig::default(),
        }
    }
}

/// Remote store connection settings.
///
/// The URL may come from `school.json` or the environment; the key only ever
/// comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Base URL of the remote store, e.g. `https://project.example.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// API key for the remote store. Environment-only; never serialized.
    #[serde(skip)]
    pub key: Option<String>,

    /// Request timeout in seconds. Defensive engineering, not a contract.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Returns `true` when a remote store is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

impl Config {
    /// Loads configuration from the current working directory, applying
    /// environment credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            EngineError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `school.json` in the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON, or if
    /// the resulting configuration is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration. Environment
    /// credentials are applied before validation so a URL-only file plus a
    /// key in the environment validates cleanly.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ConfigParseError` for unreadable or invalid
    /// JSON and `EngineError::ConfigValidationError` for invalid values.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Self>(&contents)
                .map_err(|e| EngineError::config_parse(path, e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(EngineError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overrides remote settings from the environment.
    ///
    /// `SCHOOL_STORE_URL` overrides the configured URL; `SCHOOL_STORE_KEY`
    /// supplies the key (there is no file-based fallback for the key).
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(STORE_URL_ENV) {
            if !url.trim().is_empty() {
                self.remote.url = Some(url);
            }
        }
        if let Ok(key) = std::env::var(STORE_KEY_ENV) {
            if !key.trim().is_empty() {
                self.remote.key = Some(key);
            }
        }
    }

    /// Path of the persisted progress record.
    #[must_use]
    pub fn progress_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("progress.json")
    }

    /// Path of the cached learner identity.
    #[must_use]
    pub fn identity_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("learner.json")
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(EngineError::config_validation(
                "dataDir must not be empty",
                "Provide a directory for local state in your school.json (default '.school')",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(EngineError::config_validation(
                "outputDir must not be empty",
                "Provide a report output directory in your school.json (use '.' for current directory)",
            ));
        }

        if self.port == 0 {
            return Err(EngineError::config_validation(
                "port must be greater than 0",
                "Set port to a usable TCP port in your school.json",
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(EngineError::config_validation(
                "remote.timeoutSecs must be greater than 0",
                "Set remote.timeoutSecs to at least 1 second in your school.json",
            ));
        }

        if let Some(url) = &self.remote.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EngineError::config_validation(
                    format!("remote.url '{url}' is not an http(s) URL"),
                    "Use the full base URL of your remote store, including the scheme",
                ));
            }
            if self.remote.key.is_none() {
                return Err(EngineError::config_validation(
                    "remote store URL is configured but no API key is set",
                    format!("Export {STORE_KEY_ENV} with your store's API key"),
                ));
            }
        }

        Ok(())
    }
}
