use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the optional per-project config file
pub const CONFIG_FILE_NAME: &str = "git-versioner.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub git: GitConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub program: String,
    pub timeout_seconds: u64,
    pub remote: String,
    pub c_locale: bool,
    pub on_missing_tool: MissingToolPolicy,
}

/// What to do when the readiness check cannot run git at all
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingToolPolicy {
    /// Return the spawn error to the caller
    #[default]
    Fail,
    /// Log a warning and carry on as if the directory were not a repository
    Degrade,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout_seconds: 30,
            remote: "origin".to_string(),
            c_locale: true,
            on_missing_tool: MissingToolPolicy::Fail,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Load `git-versioner.toml` from the project directory, or defaults when absent
    pub fn discover<P: AsRef<Path>>(project_dir: P) -> Result<Self, ConfigError> {
        let path = project_dir.as_ref().join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "program must not be empty".to_string(),
            ));
        }

        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // The remote becomes a ref prefix, so it has to be a single path segment
        let remote = &self.git.remote;
        if remote.is_empty() || remote.contains('/') || remote.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid remote name: '{}'",
                remote
            )));
        }

        Ok(())
    }
}
