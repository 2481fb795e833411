//! Observer interface for campaign progress.

use campaign_runner_developer_platforms::models::{
    Commit, RecipeRunStatus, RecipeRunSummary, RunState,
};

use crate::{commit_job::CommitJobState, FilteredRecipeExecutionResult};

/// Receives every state transition of a campaign.
///
/// The executor never renders anything itself; all reporting goes through
/// this trait.
pub trait ProgressMonitor: Send + Sync {
    fn on_recipe_run_started(&self, run_id: &str);

    /// Called whenever the run status changed since the previous poll.
    ///
    /// `summaries` holds finished repositories with results, most results
    /// first, followed by repositories that have not finished yet.
    fn on_recipe_progress(
        &self,
        run_id: &str,
        status: &RecipeRunStatus,
        summaries: &[RecipeRunSummary],
    );

    fn on_recipe_run_completed(&self, run_id: &str, state: RunState);

    fn on_repositories_filtered(&self, result: &FilteredRecipeExecutionResult);

    fn on_pull_request_generation_started(&self, commit_job_id: &str);

    /// Called on every poll of the commit job, changed or not.
    fn on_pull_request_generation_progress(
        &self,
        commit_job_id: &str,
        state: &CommitJobState,
        commits: &[Commit],
    );

    fn on_pull_request_generation_completed(&self, commit_job_id: &str, state: &CommitJobState);
}
