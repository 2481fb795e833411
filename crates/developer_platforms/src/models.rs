//! # Models
//!
//! This module contains the data models exchanged with the code-transformation
//! service.
//!
//! Field names follow the service's camelCase wire format through serde
//! renames so that the structs can be deserialized directly from query
//! results and serialized directly into mutation variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// A repository known to the code-transformation service.
///
/// Equality, ordering and hashing use all three fields, so the same path on
/// two branches is two different repositories.
///
/// # Examples
///
/// ```
/// use campaign_runner_developer_platforms::models::Repository;
///
/// let repository = Repository::new("github.com", "acme/widgets", "main");
/// assert_eq!(repository.as_url(), "https://github.com/acme/widgets");
/// assert_eq!(repository.to_string(), "github.com/acme/widgets@main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Repository {
    /// The host the repository lives on, e.g. `github.com`
    pub origin: String,

    /// The `owner/name` path of the repository
    pub path: String,

    /// The branch the recipe ran against
    pub branch: String,
}

impl Repository {
    pub fn new(
        origin: impl Into<String>,
        path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            branch: branch.into(),
        }
    }

    /// The canonical web URL of the repository.
    pub fn as_url(&self) -> String {
        format!("https://{}/{}", self.origin, self.path)
    }

    /// Splits the path into `(owner, name)`.
    ///
    /// Returns `None` when the path is not exactly two segments.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.path.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.origin, self.path, self.branch)
    }
}

/// Lifecycle state of a recipe run, or of one repository within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Created,
    Queued,
    Loading,
    Running,
    Finished,
    Error,
    Canceled,
    Unavailable,
}

impl RunState {
    /// Every state, in the order the service documents them.
    pub const ALL: [RunState; 8] = [
        RunState::Created,
        RunState::Queued,
        RunState::Loading,
        RunState::Running,
        RunState::Finished,
        RunState::Error,
        RunState::Canceled,
        RunState::Unavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Created => "CREATED",
            RunState::Queued => "QUEUED",
            RunState::Loading => "LOADING",
            RunState::Running => "RUNNING",
            RunState::Finished => "FINISHED",
            RunState::Error => "ERROR",
            RunState::Canceled => "CANCELED",
            RunState::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown recipe run state: {}", s))
    }
}

/// Priority a recipe run is scheduled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeRunPriority {
    #[default]
    Low,
    Normal,
}

/// Aggregate totals reported for a whole recipe run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeRunTotals {
    pub total_files_changed: u64,
    pub total_files_searched: u64,
    pub total_repositories_successful: u64,
    pub total_repositories_with_errors: u64,
    pub total_repositories_with_results: u64,
    pub total_repositories_with_no_changes: u64,
    pub total_results: u64,
    /// ISO-8601 duration, e.g. `PT1H30M`
    pub total_time_savings: String,
}

impl RecipeRunTotals {
    /// Number of repositories the run has looked at so far.
    pub fn repositories_searched(&self) -> u64 {
        self.total_repositories_with_errors
            + self.total_repositories_successful
            + self.total_repositories_with_no_changes
            + self.total_repositories_with_results
    }
}

/// Top-level status of a recipe run.
///
/// Two statuses compare equal only when both the state and every total match;
/// the executor relies on this to suppress duplicate progress reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRunStatus {
    pub id: String,
    pub state: RunState,
    #[serde(default)]
    pub totals: RecipeRunTotals,
}

/// Timing information for one repository of a recipe run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRunPerformance {
    /// ISO-8601 duration of the recipe execution on this repository
    #[serde(default)]
    pub recipe_run: String,
}

/// Per-repository outcome of a recipe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRunSummary {
    #[serde(default)]
    pub debug_markers: u64,
    #[serde(default)]
    pub error_markers: u64,
    #[serde(default)]
    pub info_markers: u64,
    #[serde(default)]
    pub warning_markers: u64,
    #[serde(default)]
    pub time_savings: String,
    pub total_changed: u64,
    pub total_searched: u64,
    pub state: RunState,
    #[serde(default)]
    pub performance: RecipeRunPerformance,
    pub repository: Repository,
}

/// Recipe reference carried by a run in the recent-runs listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeReference {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of the recent recipe run history, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentRecipeRun {
    pub id: String,
    pub state: RunState,
    pub recipe: RecipeReference,
}

/// Lifecycle state of one commit within a commit job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitState {
    Queued,
    Processing,
    Completed,
    Failed,
    NoChanges,
    Orphaned,
    Canceled,
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CommitState::Queued => "QUEUED",
            CommitState::Processing => "PROCESSING",
            CommitState::Completed => "COMPLETED",
            CommitState::Failed => "FAILED",
            CommitState::NoChanges => "NO_CHANGES",
            CommitState::Orphaned => "ORPHANED",
            CommitState::Canceled => "CANCELED",
        };
        f.write_str(value)
    }
}

/// A single commit (and pull request) produced by a commit job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(default)]
    pub modified: Option<String>,
    pub repository: Repository,
    #[serde(default)]
    pub result_link: Option<String>,
    pub state: CommitState,
    #[serde(default)]
    pub state_message: Option<String>,
}

/// Job-level counters of a commit job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitJobSummaryResults {
    pub count: u64,
    pub failed_count: u64,
    pub no_change_count: u64,
    pub successful_count: u64,
}

/// Summary of a commit job as returned by the service.
///
/// `state` is only present when the service reports it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitJobSummary {
    pub id: String,
    pub completed: u64,
    pub summary_results: CommitJobSummaryResults,
    #[serde(default)]
    pub state: Option<String>,
}

/// GPG key material attached to generated commits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpgKey {
    pub passphrase: String,
    pub private_key: String,
    pub public_key: String,
}

impl fmt::Debug for GpgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpgKey").finish_non_exhaustive()
    }
}

/// Everything the service needs to fork repositories and open pull requests
/// for the results of a recipe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkAndPullRequestInput {
    pub recipe_run_id: String,
    pub branch_name: String,
    pub gpg_key: GpgKey,
    pub commit_message: String,
    /// Base64 encoded extended commit message
    pub extended_message: String,
    pub repositories: Vec<Repository>,
    /// Organization the forks are created in
    pub organization: String,
    pub pull_request_title: String,
    /// Base64 encoded pull request body
    pub pull_request_body: String,
}
