use campaign_runner_core::campaign::{parse_repository, Campaign};
use campaign_runner_developer_platforms::models::{GpgKey, Repository};
use clap::Args;
use tracing::{info, instrument};

use super::{
    create_pull_requests, filter_result, load_signing_key, run_session, ConsoleExecutor, Context,
};
use crate::errors::CliError;

/// Organization the recipe runs against when no repositories are given
pub const DEFAULT_ORGANIZATION: &str = "Default";

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Arguments for the run-recipe and run-pull-requests commands
#[derive(Args, Debug)]
pub struct RunRecipeArgs {
    /// The campaign to run
    pub campaign: String,

    /// The organization to run the campaign under
    #[arg(long, default_value = DEFAULT_ORGANIZATION, conflicts_with = "repository_filter")]
    pub moderne_organization: String,

    /// Repository to run the campaign against, as `origin/owner/repo[@branch]`.
    /// The branch defaults to `main`. Can be given multiple times.
    #[arg(long, value_parser = parse_repository_arg)]
    pub repository_filter: Vec<Repository>,
}

fn parse_repository_arg(value: &str) -> Result<Repository, String> {
    parse_repository(value).map_err(|e| e.to_string())
}

/// Runs the campaign's recipe and, if `generate_prs` is set, opens pull
/// requests for the repositories that survive filtering.
#[instrument(skip(context, args), fields(campaign = %args.campaign))]
pub async fn execute(
    context: &Context,
    args: RunRecipeArgs,
    generate_prs: bool,
) -> Result<(), CliError> {
    if generate_prs {
        println!("Pull request generation enabled. Pull requests will be created!");
    } else {
        println!("Pull request generation not enabled. No pull requests will be created!");
    }

    let campaign = context.load_campaign(&args.campaign)?;
    let gpg_key = if generate_prs {
        Some(load_signing_key()?)
    } else {
        None
    };
    let executor = context.create_executor()?;

    run_session(
        &executor,
        run_campaign(context, &executor, &campaign, &args, gpg_key.as_ref()),
    )
    .await
}

async fn run_campaign(
    context: &Context,
    executor: &ConsoleExecutor,
    campaign: &Campaign,
    args: &RunRecipeArgs,
    gpg_key: Option<&GpgKey>,
) -> Result<(), CliError> {
    println!("Running campaign {}...", campaign.name);
    let run_id = if args.repository_filter.is_empty() {
        executor
            .launch_recipe_against_organization(campaign, &args.moderne_organization)
            .await?
    } else {
        executor
            .launch_recipe_against_repositories(campaign, &args.repository_filter)
            .await?
    };
    info!(run_id = %run_id, "Recipe run submitted");

    let result = executor.await_recipe(&run_id).await?;
    let filtered = filter_result(context, executor, result).await?;

    let Some(gpg_key) = gpg_key else {
        println!("Pull request generation not enabled. Complete!");
        return Ok(());
    };

    if let Some(state) = create_pull_requests(executor, campaign, gpg_key, &filtered).await? {
        println!("Pull request generation finished with state {}", state);
    }
    Ok(())
}
