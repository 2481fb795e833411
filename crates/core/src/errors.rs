use campaign_runner_developer_platforms::errors::Error as PlatformError;
use thiserror::Error;

use crate::filters::FilterReason;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign '{name}' could not be loaded: {message}")]
    CampaignLoad { name: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load the critical projects list: {0}")]
    CriticalProjectsList(String),

    #[error("Invalid repository '{0}'. Expected 'origin/owner/name[@branch]'")]
    InvalidRepository(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The recipe submission timed out and no run carrying the correlation
    /// token showed up in the recent run history.
    #[error(
        "Recipe run submission timed out and no run with correlation token '{correlation_token}' was found after {attempts} attempts"
    )]
    RecoveryExhausted {
        correlation_token: String,
        attempts: u32,
        #[source]
        source: PlatformError,
    },

    #[error("No repository filter is registered for reason {0}")]
    UnregisteredFilter(FilterReason),
}

impl CampaignError {
    /// Returns `true` when the failure was ultimately a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CampaignError::Platform(e) if e.is_timeout())
    }
}
