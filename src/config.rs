// ============================================
// config.rs - Configuration Management
// ============================================
// Loads and validates configuration from YAML file
// Supports environment variable substitution

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::Dialect;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dialect used when the command line does not pick one
    #[serde(default)]
    pub default_dialect: Dialect,

    /// Known access hashes by user id, used to turn
    /// tg://user?id= links into mentions
    #[serde(default)]
    pub access_hashes: HashMap<i64, i64>,

    // Output
    #[serde(default)]
    pub output: OutputConfig,

    // Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_true")]
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub json_format: bool,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    #[serde(default)]
    pub caller_info: bool,
}

// Default value functions
fn default_true() -> bool { true }
fn default_log_level() -> String { "warn".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            color: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json_format: false,
            timestamps: true,
            caller_info: false,
        }
    }
}

impl Config {
    /// Default config location: ~/.config/tgmarkup/config.yaml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tgmarkup").join("config.yaml"))
    }

    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Expand ~ in path
        let expanded_path = expand_tilde(path.as_ref());

        let contents = std::fs::read_to_string(&expanded_path).map_err(|source| Error::Io {
            path: expanded_path.clone(),
            source,
        })?;

        Self::from_yaml(&contents)
    }

    /// Load the config at `path`, or the default location when `path` is
    /// `None`. A missing default file yields the default config.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // Substitute environment variables
        let contents = substitute_env_vars(contents);

        let config: Config = serde_yaml::from_str(&contents)?;

        // Validate
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = self.access_hashes.keys().find(|id| **id <= 0) {
            return Err(Error::InvalidConfig(format!(
                "access_hashes: user id {} must be positive",
                id
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::InvalidConfig("logging.level is empty".to_string()));
        }

        Ok(())
    }

    /// Get log file path with expansion
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|p| expand_tilde(Path::new(p)))
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            let path_str = path.to_string_lossy();
            let expanded = path_str.replacen("~", &home.to_string_lossy(), 1);
            return PathBuf::from(expanded);
        }
    }
    path.to_path_buf()
}

/// Substitute environment variables in format ${VAR_NAME}
fn substitute_env_vars(text: &str) -> String {
    let mut result = text.to_string();

    for cap in ENV_VAR.captures_iter(text) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
