//! # Campaign Runner Core
//!
//! Core logic for running bulk code-fix campaigns against the remote
//! code-transformation service.
//!
//! A campaign runs in three steps:
//! - a recipe run is submitted and polled until it reaches a terminal state
//! - the repositories with results are passed through the repository filters
//! - a commit job opens pull requests for the surviving repositories and is
//!   polled until it completes
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campaign_runner_core::{
//!     campaign::Campaign, config::FilterConfig, filters::FilterRegistry,
//!     progress::ProgressMonitor, CampaignExecutor,
//! };
//! use campaign_runner_developer_platforms::{
//!     github::HttpFileFetcher, models::GpgKey, moderne::ModerneClient, QueryExecutor,
//! };
//!
//! async fn run<E: QueryExecutor, M: ProgressMonitor>(
//!     client: ModerneClient<E>,
//!     monitor: M,
//!     campaign: Campaign,
//!     gpg_key: GpgKey,
//! ) -> anyhow::Result<()> {
//!     let executor = CampaignExecutor::new(client, monitor);
//!
//!     let run_id = executor
//!         .launch_recipe_against_organization(&campaign, "Default")
//!         .await?;
//!     let result = executor.await_recipe(&run_id).await?;
//!
//!     let registry = FilterRegistry::with_defaults(
//!         &FilterConfig::default(),
//!         Arc::new(HttpFileFetcher::new()?),
//!     );
//!     let filter = registry.create_all().await?;
//!     let filtered = executor.filter_recipe_result(&filter, result).await?;
//!
//!     let commit_job_id = executor
//!         .launch_pull_request(&campaign, &gpg_key, &filtered)
//!         .await?;
//!     executor.await_pull_request(&commit_job_id).await?;
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;

use campaign_runner_developer_platforms::{
    errors::Error as PlatformError,
    models::{ForkAndPullRequestInput, GpgKey, RecipeRunStatus, Repository},
    moderne::ModerneClient,
    QueryExecutor,
};
use tracing::{debug, info, instrument, warn};

pub mod campaign;
use campaign::Campaign;

pub mod commit_job;
use commit_job::{derive_commit_job_state, CommitJobState};

pub mod config;
use config::ExecutorConfig;

pub mod errors;
use errors::CampaignError;

pub mod filters;
use filters::{FilterDetailedReason, RepositoryFilter};

pub mod progress;
use progress::ProgressMonitor;

pub mod recovery;
use recovery::{new_correlation_token, recover_run_id, RecoveryPolicy};

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Repositories of a finished recipe run that produced results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeExecutionResult {
    pub run_id: String,
    pub repositories: Vec<Repository>,
}

/// A recipe execution result after filtering.
///
/// `repositories` holds the surviving repositories; every excluded repository
/// is a key of `filtered_repositories` together with its reasons. The two
/// never overlap and together hold every input repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredRecipeExecutionResult {
    pub run_id: String,
    pub repositories: Vec<Repository>,
    pub filtered_repositories: BTreeMap<Repository, Vec<FilterDetailedReason>>,
}

impl FilteredRecipeExecutionResult {
    /// Excluded repositories grouped by filter reason.
    pub fn by_reason(&self) -> BTreeMap<filters::FilterReason, Vec<(&Repository, &str)>> {
        let mut grouped: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for (repository, reasons) in &self.filtered_repositories {
            for reason in reasons {
                grouped
                    .entry(reason.reason)
                    .or_default()
                    .push((repository, reason.details.as_str()));
            }
        }
        grouped
    }
}

/// How a [`CampaignExecutor::run_session`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome<T> {
    /// The work ran to completion, successfully or not.
    Completed(T),
    /// The cancellation signal fired first and the work was dropped.
    Cancelled,
}

/// Drives recipe runs and commit jobs through their remote life cycle.
///
/// `CampaignExecutor` submits jobs, polls them until they reach a terminal
/// state and reports every transition to its [`ProgressMonitor`].
///
/// # Examples
///
/// ```rust,no_run
/// use campaign_runner_core::{progress::ProgressMonitor, CampaignExecutor};
/// use campaign_runner_developer_platforms::{moderne::ModerneClient, QueryExecutor};
///
/// async fn attach<E: QueryExecutor, M: ProgressMonitor>(
///     client: ModerneClient<E>,
///     monitor: M,
/// ) -> anyhow::Result<()> {
///     let executor = CampaignExecutor::new(client, monitor);
///     let result = executor.await_recipe("existing-run-id").await?;
///     println!("{} repositories have results", result.repositories.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CampaignExecutor<E: QueryExecutor, M: ProgressMonitor> {
    client: ModerneClient<E>,
    monitor: M,
    config: ExecutorConfig,
}

impl<E: QueryExecutor, M: ProgressMonitor> CampaignExecutor<E, M> {
    /// Creates an executor with the default configuration.
    pub fn new(client: ModerneClient<E>, monitor: M) -> Self {
        Self::with_config(client, monitor, ExecutorConfig::default())
    }

    /// Creates an executor; `config.max_pages` caps every paged traversal of
    /// `client`.
    pub fn with_config(client: ModerneClient<E>, monitor: M, config: ExecutorConfig) -> Self {
        Self {
            client: client.with_max_pages(config.max_pages),
            monitor,
            config,
        }
    }

    pub fn client(&self) -> &ModerneClient<E> {
        &self.client
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs `work` with a connected client, racing it against `cancel`.
    ///
    /// Once connected, the client is closed whether `work` completes or is
    /// cancelled. A failure to close is logged and does not change the
    /// outcome.
    #[instrument(skip(self, work, cancel))]
    pub async fn run_session<T, W, C>(
        &self,
        work: W,
        cancel: C,
    ) -> Result<SessionOutcome<T>, CampaignError>
    where
        W: Future<Output = T>,
        C: Future<Output = ()>,
    {
        self.client.connect().await?;

        let outcome = tokio::select! {
            output = work => SessionOutcome::Completed(output),
            () = cancel => {
                warn!("Session cancelled, abandoning in-flight work");
                SessionOutcome::Cancelled
            }
        };

        if let Err(e) = self.client.close().await {
            warn!(error = %e, "Failed to close the client");
        }
        Ok(outcome)
    }

    /// Submits the campaign's recipe against every repository of an
    /// organization.
    ///
    /// # Returns
    ///
    /// The id of the recipe run, recovered from the run history if the
    /// submission itself timed out.
    #[instrument(skip(self, campaign), fields(campaign = %campaign.name))]
    pub async fn launch_recipe_against_organization(
        &self,
        campaign: &Campaign,
        organization_id: &str,
    ) -> Result<String, CampaignError> {
        let correlation_token = new_correlation_token();
        let yaml = campaign.recipe_yaml_base64(&correlation_token);
        let submission = self
            .client
            .run_yaml_recipe(&yaml, organization_id, self.config.priority);

        let run_id = self.submit_recipe(&correlation_token, submission).await?;
        self.monitor.on_recipe_run_started(&run_id);
        Ok(run_id)
    }

    /// Submits the campaign's recipe against an explicit list of repositories.
    #[instrument(skip(self, campaign, repositories), fields(campaign = %campaign.name, repositories = repositories.len()))]
    pub async fn launch_recipe_against_repositories(
        &self,
        campaign: &Campaign,
        repositories: &[Repository],
    ) -> Result<String, CampaignError> {
        let correlation_token = new_correlation_token();
        let yaml = campaign.recipe_yaml_base64(&correlation_token);
        let submission = self.client.run_yaml_recipe_on_repositories(
            &yaml,
            repositories,
            self.config.priority,
        );

        let run_id = self.submit_recipe(&correlation_token, submission).await?;
        self.monitor.on_recipe_run_started(&run_id);
        Ok(run_id)
    }

    async fn submit_recipe<F>(
        &self,
        correlation_token: &str,
        submission: F,
    ) -> Result<String, CampaignError>
    where
        F: Future<Output = Result<String, PlatformError>>,
    {
        match submission.await {
            Ok(run_id) => Ok(run_id),
            Err(e) if e.is_timeout() => {
                let policy = RecoveryPolicy {
                    attempts: self.config.recovery_attempts,
                    delay: self.config.recovery_delay(),
                };
                recover_run_id(&self.client, correlation_token, policy, e).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Polls a recipe run until it reaches a terminal state.
    ///
    /// The repository breakdown is only fetched and reported when the run
    /// status differs from the previous poll.
    ///
    /// # Returns
    ///
    /// The finished repositories that had at least one result.
    #[instrument(skip(self))]
    pub async fn await_recipe(&self, run_id: &str) -> Result<RecipeExecutionResult, CampaignError> {
        let mut previous: Option<RecipeRunStatus> = None;

        loop {
            let status = self.client.query_recipe_run_status(run_id).await?;

            if previous.as_ref() != Some(&status) {
                debug!(state = %status.state, "Recipe run status changed");
                let summaries = self.client.query_recipe_run_sorted_by_results(run_id).await?;
                self.monitor.on_recipe_progress(run_id, &status, &summaries);
            }

            if self.config.is_terminal(status.state) {
                info!(state = %status.state, "Recipe run reached a terminal state");
                self.monitor.on_recipe_run_completed(run_id, status.state);
                break;
            }

            previous = Some(status);
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        let repositories = self
            .client
            .query_recipe_run_results_repositories(run_id)
            .await?;
        info!(repositories = repositories.len(), "Fetched repositories with results");

        Ok(RecipeExecutionResult {
            run_id: run_id.to_string(),
            repositories,
        })
    }

    /// Applies `filter` to a recipe result and reports the outcome.
    pub async fn filter_recipe_result<F>(
        &self,
        filter: &F,
        result: RecipeExecutionResult,
    ) -> Result<FilteredRecipeExecutionResult, CampaignError>
    where
        F: RepositoryFilter + ?Sized,
    {
        let filtered = filters::filter_repositories(filter, result).await?;
        self.monitor.on_repositories_filtered(&filtered);
        Ok(filtered)
    }

    /// Starts a commit job opening pull requests for the surviving
    /// repositories.
    ///
    /// There is no recovery path here: a timed out submission is an error.
    #[instrument(skip(self, campaign, gpg_key, result), fields(campaign = %campaign.name, run_id = %result.run_id))]
    pub async fn launch_pull_request(
        &self,
        campaign: &Campaign,
        gpg_key: &GpgKey,
        result: &FilteredRecipeExecutionResult,
    ) -> Result<String, CampaignError> {
        let input = ForkAndPullRequestInput {
            recipe_run_id: result.run_id.clone(),
            branch_name: campaign.branch.clone(),
            gpg_key: gpg_key.clone(),
            commit_message: campaign.commit_title.clone(),
            extended_message: campaign.commit_extended_base64(),
            repositories: result.repositories.clone(),
            organization: self.config.fork_organization.clone(),
            pull_request_title: campaign.pr_title.clone(),
            pull_request_body: campaign.pr_body_base64(),
        };

        let commit_job_id = self.client.fork_and_pull_request(&input).await?;
        self.monitor.on_pull_request_generation_started(&commit_job_id);
        Ok(commit_job_id)
    }

    /// Polls a commit job until its derived state is no longer `RUNNING`.
    ///
    /// Every poll re-fetches all commit records and reports them.
    #[instrument(skip(self))]
    pub async fn await_pull_request(
        &self,
        commit_job_id: &str,
    ) -> Result<CommitJobState, CampaignError> {
        loop {
            let commits = self.client.query_commit_job_commits(commit_job_id).await?;
            let summary = self.client.query_commit_job_summary(commit_job_id).await?;
            let state = derive_commit_job_state(&summary, &commits);

            self.monitor
                .on_pull_request_generation_progress(commit_job_id, &state, &commits);

            if !state.is_running() {
                info!(state = %state, "Commit job finished");
                self.monitor
                    .on_pull_request_generation_completed(commit_job_id, &state);
                return Ok(state);
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}
