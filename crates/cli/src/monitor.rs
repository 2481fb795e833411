//! Console rendering of campaign progress.

use campaign_runner_core::{
    campaign::Campaign, commit_job::CommitJobState, progress::ProgressMonitor,
    FilteredRecipeExecutionResult,
};
use campaign_runner_developer_platforms::models::{
    Commit, RecipeRunStatus, RecipeRunSummary, RunState,
};

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

pub fn recipe_run_link(domain: &str, run_id: &str) -> String {
    format!("https://{}/results/{}", domain, run_id)
}

pub fn commit_job_link(domain: &str, commit_job_id: &str) -> String {
    format!("https://{}/commits/{}", domain, commit_job_id)
}

/// Run totals followed by one line per repository.
///
/// Finished repositories without changes are left out.
pub fn render_recipe_progress(
    run_id: &str,
    status: &RecipeRunStatus,
    summaries: &[RecipeRunSummary],
) -> String {
    let totals = &status.totals;
    let mut lines = vec![
        format!("[{}] {}", run_id, status.state),
        format!(
            "  Repositories searched: {}, changed: {}, files searched: {}, files changed: {}, results: {}, time savings: {}",
            totals.repositories_searched(),
            totals.total_repositories_with_results,
            totals.total_files_searched,
            totals.total_files_changed,
            totals.total_results,
            totals.total_time_savings
        ),
    ];

    for summary in summaries {
        if summary.total_changed == 0 && summary.state == RunState::Finished {
            continue;
        }
        lines.push(format!(
            "  {:<11} {} ({}) results: {}, files searched: {}, run time: {}",
            summary.state.as_str(),
            summary.repository.path,
            summary.repository.branch,
            summary.total_changed,
            summary.total_searched,
            summary.performance.recipe_run
        ));
    }

    lines.join("\n")
}

/// Excluded repositories grouped by reason; empty when nothing was excluded.
pub fn render_filtered(result: &FilteredRecipeExecutionResult) -> String {
    if result.filtered_repositories.is_empty() {
        return String::new();
    }

    let mut lines = vec!["Filtered repositories".to_string()];
    for (reason, entries) in result.by_reason() {
        lines.push(format!("  {}", reason));
        for (repository, details) in entries {
            lines.push(format!("    {} ({})", repository, details));
        }
    }
    lines.join("\n")
}

pub fn render_commits(commit_job_id: &str, state: &CommitJobState, commits: &[Commit]) -> String {
    let mut lines = vec![format!("[{}] {}", commit_job_id, state)];
    for commit in commits {
        let mut line = format!("  {:<10} {}", commit.state.to_string(), commit.repository);
        if let Some(link) = &commit.result_link {
            line.push_str(&format!(" {}", link));
        }
        if let Some(message) = commit.state_message.as_deref().filter(|m| !m.is_empty()) {
            line.push_str(&format!(" ({})", message));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn render_campaign(campaign: &Campaign) -> String {
    format!(
        "Campaign(name={})\n  Recipe Id: {}\n  Branch: {}\n  Commit Message:\n{}\n{}\n  Pull Request:\n# {}\n{}",
        campaign.name,
        campaign.recipe_id,
        campaign.branch,
        campaign.commit_title,
        campaign.commit_extended,
        campaign.pr_title,
        campaign.pr_body
    )
}

/// Prints every progress event to standard output.
#[derive(Debug, Clone)]
pub struct ConsoleProgressMonitor {
    domain: String,
}

impl ConsoleProgressMonitor {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl ProgressMonitor for ConsoleProgressMonitor {
    fn on_recipe_run_started(&self, run_id: &str) {
        println!(
            "View live on Moderne {}",
            recipe_run_link(&self.domain, run_id)
        );
    }

    fn on_recipe_progress(
        &self,
        run_id: &str,
        status: &RecipeRunStatus,
        summaries: &[RecipeRunSummary],
    ) {
        println!("{}", render_recipe_progress(run_id, status, summaries));
    }

    fn on_recipe_run_completed(&self, run_id: &str, state: RunState) {
        println!("Recipe run {} completed with state {}", run_id, state);
    }

    fn on_repositories_filtered(&self, result: &FilteredRecipeExecutionResult) {
        println!(
            "{} repositories remain after filtering, {} excluded",
            result.repositories.len(),
            result.filtered_repositories.len()
        );
        let filtered = render_filtered(result);
        if !filtered.is_empty() {
            println!("{}", filtered);
        }
    }

    fn on_pull_request_generation_started(&self, commit_job_id: &str) {
        println!(
            "View live on Moderne {}",
            commit_job_link(&self.domain, commit_job_id)
        );
    }

    fn on_pull_request_generation_progress(
        &self,
        commit_job_id: &str,
        state: &CommitJobState,
        commits: &[Commit],
    ) {
        println!("{}", render_commits(commit_job_id, state, commits));
    }

    fn on_pull_request_generation_completed(&self, commit_job_id: &str, state: &CommitJobState) {
        println!("Commit job {} completed with state {}", commit_job_id, state);
    }
}
