#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::tools::data_processor::DataProcessorConfig;
use crate::tools::file_manager::FileManagerConfig;
use crate::tools::web_api::WebApiConfig;

/// Deepest object nesting `analyze` may be configured to expand.
pub const MAX_ANALYSIS_DEPTH: usize = 64;

/// Longest simulated web API latency accepted, in milliseconds.
pub const MAX_SIMULATED_LATENCY_MS: u64 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub file_manager: FileManagerConfig,
    #[serde(default)]
    pub web_api: WebApiConfig,
    #[serde(default)]
    pub data_processor: DataProcessorConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: Some(
                "Tool server exposing echo, calculator, text analysis, file management, \
                 web API and JSON processing tools"
                    .to_string(),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid server name: {0:?} (cannot be empty)")]
    InvalidServerName(String),
    #[error("Invalid file manager settings: {0}")]
    InvalidFileManager(String),
    #[error("Invalid allowed domain: {0:?} (must be a bare host name)")]
    InvalidDomain(String),
    #[error("Invalid header name: {0:?} (cannot be empty)")]
    InvalidHeaderName(String),
    #[error("Invalid simulated latency: {0}ms (must be at most 10000ms)")]
    InvalidLatency(u64),
    #[error("Invalid analysis depth: {0} (must be at most 64)")]
    InvalidMaxDepth(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load `config.toml` from `config_dir`, falling back to defaults when the
    /// file does not exist.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load from the default configuration directory.
    #[inline]
    pub fn load_default() -> Result<Self> {
        let dir = Self::config_dir()?;
        Self::load(dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = self.to_toml()?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Render the configuration as TOML.
    #[inline]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `~/.mcp-toolkit`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".mcp-toolkit"))
            .or_else(|| {
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("mcp-toolkit"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::InvalidServerName(self.server.name.clone()));
        }

        self.file_manager
            .validate()
            .map_err(ConfigError::InvalidFileManager)?;

        self.validate_web_api()?;

        if self.data_processor.max_depth > MAX_ANALYSIS_DEPTH {
            return Err(ConfigError::InvalidMaxDepth(self.data_processor.max_depth));
        }

        Ok(())
    }

    fn validate_web_api(&self) -> Result<(), ConfigError> {
        let web_api = &self.web_api;

        for domain in &web_api.allowed_domains {
            let parsed = Url::parse(&format!("http://{}/", domain))
                .map_err(|_| ConfigError::InvalidDomain(domain.clone()))?;
            if parsed.host_str() != Some(domain.as_str()) || parsed.port().is_some() {
                return Err(ConfigError::InvalidDomain(domain.clone()));
            }
        }

        if let Some(name) = web_api.default_headers.keys().find(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidHeaderName(name.clone()));
        }

        if web_api.simulated_latency_ms > MAX_SIMULATED_LATENCY_MS {
            return Err(ConfigError::InvalidLatency(web_api.simulated_latency_ms));
        }

        Ok(())
    }
}
