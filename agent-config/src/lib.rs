//! Configuration management for tool-calling agents.
//!
//! [`AgentConfig`] holds the model endpoint settings and the prompt. Values
//! come from built-in defaults, an optional TOML file, and environment
//! overrides, applied in that order.

#![warn(missing_docs, clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding [`AgentConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "OLLAMA_HOST";
/// Environment variable overriding [`AgentConfig::model`].
pub const ENV_MODEL: &str = "OLLAMA_MODEL";

const MAX_TEMPERATURE: f32 = 2.0;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config `{}`: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AgentConfig`].
    #[error("failed to parse config: {source}")]
    Parse {
        /// Underlying TOML failure.
        #[from]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Settings for a single-prompt agent run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Base URL of the Ollama daemon.
    pub endpoint: String,
    /// Model identifier, e.g. `qwen2.5:14b`.
    pub model: String,
    /// Sampling temperature; `0.0` keeps tool selection as repeatable as the
    /// model allows.
    pub temperature: f32,
    /// HTTP timeout for the model call, in seconds.
    pub timeout_secs: u64,
    /// Prompt sent to the model.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Execute independent tool calls concurrently.
    pub concurrent: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_owned(),
            model: "qwen2.5:14b".to_owned(),
            temperature: 0.0,
            timeout_secs: 60,
            prompt: "Add 3 and 4, multiply the result by 77".to_owned(),
            system_prompt: None,
            concurrent: false,
        }
    }
}

impl AgentConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
    /// errors of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded agent config");
        Self::from_toml_str(&raw)
    }

    /// Applies [`ENV_ENDPOINT`] and [`ENV_MODEL`] from the process environment.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup (the environment in
    /// production). Blank values are ignored.
    #[must_use]
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key| lookup(key).filter(|value: &String| !value.trim().is_empty());
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = normalize_host(&endpoint);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("endpoint", "cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "cannot be empty"));
        }
        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ConfigError::invalid(
                "temperature",
                format!("must be within 0.0..={MAX_TEMPERATURE}"),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than zero"));
        }
        if self.prompt.trim().is_empty() {
            return Err(ConfigError::invalid("prompt", "cannot be empty"));
        }
        Ok(())
    }

    /// Returns the model call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// `OLLAMA_HOST` is commonly set without a scheme, e.g. `0.0.0.0:11434`.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    }
}
