//! Configuration settings for campaign execution and repository filtering.
//!
//! Every field has a default, so an empty TOML table deserializes into the
//! standard behaviour.
use std::collections::BTreeMap;
use std::time::Duration;

use campaign_runner_developer_platforms::{
    github::RAW_CONTENT_BASE_URL,
    models::{RecipeRunPriority, RunState},
    paged::DEFAULT_MAX_PAGES,
};
use serde::{Deserialize, Serialize};

use crate::{errors::CampaignError, filters::FilterReason};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Organization the recipe runs against when none is given
pub const DEFAULT_ORGANIZATION_ID: &str = "Default";

/// Organization the forks for pull requests are created in
pub const DEFAULT_FORK_ORGANIZATION: &str = "BulkSecurityGeneratorProjectV2";

/// User agent the robots-exclusion filter checks for
pub const DEFAULT_ROBOTS_USER_AGENT: &str = "JLLeitschuh/security-research";

/// Published CSV of the top ten thousand critical OSS projects
pub const DEFAULT_CRITICAL_PROJECTS_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQJjUIa78qOs19mmZ2AmpehplONAsnAsAoji-oQcd8phurjEyoG6_BgPeTgCYzAtEzgkC_W6Bx2LZOD/pub?output=csv";

/// Settings of the polling and recovery loops of the campaign executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Seconds between two status polls
    pub poll_interval_secs: u64,

    /// How often the recent run history is searched after a submission timeout
    pub recovery_attempts: u32,

    /// Seconds to wait before each recovery attempt
    pub recovery_delay_secs: u64,

    /// Recipe run states that end the poll loop
    pub terminal_run_states: Vec<RunState>,

    /// Upper bound on the pages of one paged traversal
    pub max_pages: usize,

    pub priority: RecipeRunPriority,

    pub fork_organization: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            recovery_attempts: 20,
            recovery_delay_secs: 10,
            terminal_run_states: vec![RunState::Finished, RunState::Canceled],
            max_pages: DEFAULT_MAX_PAGES,
            priority: RecipeRunPriority::Low,
            fork_organization: DEFAULT_FORK_ORGANIZATION.to_string(),
        }
    }
}

impl ExecutorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_secs(self.recovery_delay_secs)
    }

    pub fn is_terminal(&self, state: RunState) -> bool {
        self.terminal_run_states.contains(&state)
    }

    /// Rejects settings under which a loop could never end or never start.
    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.terminal_run_states.is_empty() {
            return Err(CampaignError::ConfigError(
                "terminal_run_states must name at least one state".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(CampaignError::ConfigError(
                "max_pages must be greater than zero".to_string(),
            ));
        }
        if self.recovery_attempts == 0 {
            return Err(CampaignError::ConfigError(
                "recovery_attempts must be greater than zero".to_string(),
            ));
        }
        if self.fork_organization.trim().is_empty() {
            return Err(CampaignError::ConfigError(
                "fork_organization must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of the repository filter chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// The filters to apply, in evaluation order
    pub enabled: Vec<FilterReason>,

    pub robots_user_agents: Vec<String>,

    pub robots_base_url: String,

    pub critical_projects_url: String,

    /// Additional repository URLs to exclude, with the reasons why.
    /// Merged over the built-in exclusion list.
    pub exclusions: BTreeMap<String, Vec<String>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: FilterReason::ALL.to_vec(),
            robots_user_agents: vec![DEFAULT_ROBOTS_USER_AGENT.to_string()],
            robots_base_url: RAW_CONTENT_BASE_URL.to_string(),
            critical_projects_url: DEFAULT_CRITICAL_PROJECTS_URL.to_string(),
            exclusions: BTreeMap::new(),
        }
    }
}
