use std::future::Future;
use std::io;
use std::sync::Arc;

use campaign_runner_core::{
    campaign::Campaign, commit_job::CommitJobState, filters::FilterRegistry,
    progress::ProgressMonitor, CampaignExecutor, FilteredRecipeExecutionResult,
    RecipeExecutionResult, SessionOutcome,
};
use campaign_runner_developer_platforms::{
    auth::{load_api_token, load_gpg_key},
    github::HttpFileFetcher,
    models::GpgKey,
    moderne::{ModerneClient, ModerneGraphQlClient},
    QueryExecutor,
};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::CliError;
use crate::monitor::ConsoleProgressMonitor;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Recipe-run attachment commands
pub mod attach;
/// Campaign inspection commands
pub mod campaign;
/// Recipe submission commands
pub mod run;

/// Executor talking to the remote service and printing to the console
pub type ConsoleExecutor = CampaignExecutor<ModerneGraphQlClient, ConsoleProgressMonitor>;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
}

impl Context {
    /// Applies the global command-line overrides to the loaded configuration.
    pub fn new(mut config: AppConfig, moderne_domain: Option<String>) -> Self {
        if let Some(domain) = moderne_domain {
            config.moderne.domain = domain;
        }
        Self { config }
    }

    pub fn domain(&self) -> &str {
        &self.config.moderne.domain
    }

    pub fn load_campaign(&self, name: &str) -> Result<Campaign, CliError> {
        Ok(Campaign::load(&self.config.campaigns.directory, name)?)
    }

    /// Builds an executor for the configured service, reading the API token.
    pub fn create_executor(&self) -> Result<ConsoleExecutor, CliError> {
        let token = load_api_token()?;
        let graphql = ModerneGraphQlClient::new(
            self.domain(),
            token,
            self.config.moderne.request_timeout(),
        );
        let client = ModerneClient::new(self.domain(), graphql);

        Ok(CampaignExecutor::with_config(
            client,
            ConsoleProgressMonitor::new(self.domain()),
            self.config.execution.clone(),
        ))
    }
}

/// Runs `work` with a connected client, abandoning it on Ctrl-C.
///
/// Cancellation is reported as [`CliError::Interrupted`].
pub async fn run_session<E, M, T, F>(
    executor: &CampaignExecutor<E, M>,
    work: F,
) -> Result<T, CliError>
where
    E: QueryExecutor,
    M: ProgressMonitor,
    F: Future<Output = Result<T, CliError>>,
{
    match executor
        .run_session(work, interrupted(tokio::signal::ctrl_c()))
        .await?
    {
        SessionOutcome::Completed(result) => result,
        SessionOutcome::Cancelled => Err(CliError::Interrupted),
    }
}

/// Resolves once `signal` reports an interrupt.
///
/// If the signal listener cannot be installed this never resolves and the
/// work runs to completion.
pub async fn interrupted<S>(signal: S)
where
    S: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => warn!("Interrupted by user"),
        Err(e) => {
            warn!(error = %e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await
        }
    }
}

/// Runs the configured repository filters over a recipe result.
#[instrument(skip(context, executor, result), fields(run_id = %result.run_id))]
pub async fn filter_result(
    context: &Context,
    executor: &ConsoleExecutor,
    result: RecipeExecutionResult,
) -> Result<FilteredRecipeExecutionResult, CliError> {
    let fetcher = Arc::new(HttpFileFetcher::new()?);
    let registry = FilterRegistry::with_defaults(&context.config.filters, fetcher);
    let filter = registry
        .create_filter(&context.config.filters.enabled)
        .await?;

    Ok(executor.filter_recipe_result(&filter, result).await?)
}

/// Reads the GPG key used to sign generated commits.
///
/// Commands that open pull requests call this before contacting the service.
pub fn load_signing_key() -> Result<GpgKey, CliError> {
    Ok(load_gpg_key()?)
}

/// Opens pull requests for the surviving repositories and waits for the
/// commit job.
///
/// Returns `None` without touching the service when nothing survived
/// filtering.
#[instrument(skip(executor, campaign, gpg_key, filtered), fields(campaign = %campaign.name))]
pub async fn create_pull_requests(
    executor: &ConsoleExecutor,
    campaign: &Campaign,
    gpg_key: &GpgKey,
    filtered: &FilteredRecipeExecutionResult,
) -> Result<Option<CommitJobState>, CliError> {
    if filtered.repositories.is_empty() {
        info!("No repositories left after filtering, skipping pull request generation");
        println!("No repositories left after filtering. No pull requests will be created.");
        return Ok(None);
    }

    println!(
        "Forking and creating pull requests for campaign {}...",
        campaign.name
    );
    let commit_job_id = executor
        .launch_pull_request(campaign, gpg_key, filtered)
        .await?;
    let state = executor.await_pull_request(&commit_job_id).await?;
    Ok(Some(state))
}
