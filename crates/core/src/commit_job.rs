//! State of a commit job, derived from its summary and commit records.

use std::fmt;

use campaign_runner_developer_platforms::models::{Commit, CommitJobSummary, CommitState};

#[cfg(test)]
#[path = "commit_job_tests.rs"]
mod tests;

/// Reported state of a commit job.
///
/// The service rarely reports a job state itself, so the state is usually
/// derived from the job counters. An explicit state the service does report is
/// kept verbatim, even when it is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommitJobState {
    Running,
    Completed,
    Canceled,
    Other(String),
}

impl CommitJobState {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "RUNNING" => CommitJobState::Running,
            "COMPLETED" => CommitJobState::Completed,
            "CANCELED" => CommitJobState::Canceled,
            other => CommitJobState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommitJobState::Running => "RUNNING",
            CommitJobState::Completed => "COMPLETED",
            CommitJobState::Canceled => "CANCELED",
            CommitJobState::Other(value) => value,
        }
    }

    pub fn is_running(&self) -> bool {
        *self == CommitJobState::Running
    }
}

impl fmt::Display for CommitJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the job state, first match wins:
///
/// 1. an explicit state reported by the service
/// 2. `CANCELED` if any commit was canceled
/// 3. `COMPLETED` if every commit is complete
/// 4. `RUNNING` if fewer commits reached an outcome than the job holds
/// 5. `COMPLETED` otherwise
pub fn derive_commit_job_state(summary: &CommitJobSummary, commits: &[Commit]) -> CommitJobState {
    if let Some(state) = &summary.state {
        return CommitJobState::from_remote(state);
    }

    if commits.iter().any(|c| c.state == CommitState::Canceled) {
        return CommitJobState::Canceled;
    }

    let results = &summary.summary_results;
    if results.count == summary.completed {
        return CommitJobState::Completed;
    }

    if results.failed_count + results.no_change_count + results.successful_count < results.count {
        return CommitJobState::Running;
    }

    CommitJobState::Completed
}
