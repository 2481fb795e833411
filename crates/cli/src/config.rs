use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use campaign_runner_core::config::{ExecutorConfig, FilterConfig};
use campaign_runner_developer_platforms::moderne::{DEFAULT_DOMAIN, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::CliError;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = ".campaign-runner.toml";

/// Default directory holding the campaign definitions
pub const DEFAULT_CAMPAIGNS_DIRECTORY: &str = "campaigns";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Configuration for the campaign runner CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub moderne: ModerneConfig,

    #[serde(default)]
    pub campaigns: CampaignsConfig,

    /// Polling and recovery settings
    #[serde(default)]
    pub execution: ExecutorConfig,

    /// Repository filter settings
    #[serde(default)]
    pub filters: FilterConfig,
}

impl AppConfig {
    /// Load configuration from the specified file
    pub fn load(path: &Path) -> Result<Self, CliError> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(CliError::ConfigError(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CliError::ConfigError(format!("Failed to read configuration file: {}", e))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            CliError::ConfigError(format!("Failed to parse configuration file: {}", e))
        })?;

        config.execution.validate()?;
        Ok(config)
    }

    /// Loads the configuration file, if there is one.
    ///
    /// An explicitly requested file must exist; a missing default file means
    /// the built-in defaults are used.
    pub fn load_or_default(config_path: Option<&str>) -> Result<Self, CliError> {
        let path = get_config_path(config_path);
        if config_path.is_none() && !path.exists() {
            info!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }
}

/// Settings for reaching the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerneConfig {
    #[serde(default = "ModerneConfig::default_domain")]
    pub domain: String,

    #[serde(default = "ModerneConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ModerneConfig {
    fn default_domain() -> String {
        DEFAULT_DOMAIN.to_string()
    }

    fn default_request_timeout_secs() -> u64 {
        DEFAULT_REQUEST_TIMEOUT.as_secs()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ModerneConfig {
    fn default() -> Self {
        Self {
            domain: Self::default_domain(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

/// Where campaign definitions are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignsConfig {
    #[serde(default = "CampaignsConfig::default_directory")]
    pub directory: PathBuf,
}

impl CampaignsConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from(DEFAULT_CAMPAIGNS_DIRECTORY)
    }
}

impl Default for CampaignsConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
        }
    }
}

/// Get the path to the configuration file
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        // Look for config in current directory
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
