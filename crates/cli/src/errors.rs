use std::process::ExitCode;

use campaign_runner_core::errors::CampaignError;
use campaign_runner_developer_platforms::errors::Error as PlatformError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The user interrupted the running command
    #[error("Interrupted by user")]
    Interrupted,

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::ConfigError(_) => 2,
            CliError::AuthError(_) => 3,
            CliError::NetworkError(_) => 4,
            CliError::InvalidArguments(_) => 5,
            CliError::Interrupted => 130,
            CliError::Other(_) => 1,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err.to_string())
    }
}

impl From<PlatformError> for CliError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::AuthError(_) | PlatformError::MissingEnvironmentVariables(_) => {
                CliError::AuthError(err.to_string())
            }
            PlatformError::Timeout { .. }
            | PlatformError::Transport(_)
            | PlatformError::HttpStatus { .. }
            | PlatformError::GraphQl(_) => CliError::NetworkError(err.to_string()),
            PlatformError::InvalidResponse(_)
            | PlatformError::NotConnected
            | PlatformError::PaginationLimitExceeded(_) => CliError::Other(err.to_string()),
        }
    }
}

impl From<CampaignError> for CliError {
    fn from(err: CampaignError) -> Self {
        match err {
            CampaignError::Platform(inner) => inner.into(),
            CampaignError::RecoveryExhausted { .. } => CliError::NetworkError(error_chain(&err)),
            CampaignError::ConfigError(_)
            | CampaignError::CampaignLoad { .. }
            | CampaignError::UnregisteredFilter(_) => CliError::ConfigError(err.to_string()),
            CampaignError::InvalidRepository(_) => CliError::InvalidArguments(err.to_string()),
            CampaignError::CriticalProjectsList(_) => CliError::Other(err.to_string()),
        }
    }
}

/// Renders `err` followed by each of its sources, separated by `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl std::process::Termination for CliError {
    fn report(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }
}
