use campaign_runner_core::campaign::Campaign;
use campaign_runner_developer_platforms::models::GpgKey;
use clap::Args;
use tracing::instrument;

use super::{
    create_pull_requests, filter_result, load_signing_key, run_session, ConsoleExecutor, Context,
};
use crate::errors::CliError;
use crate::monitor::{commit_job_link, recipe_run_link};

/// Arguments for the recipe-attach command
#[derive(Args, Debug)]
pub struct RecipeAttachArgs {
    /// The recipe run to attach to
    pub run_id: String,
}

/// Arguments for the recipe-attach-and-run-pull-request command
#[derive(Args, Debug)]
pub struct RecipeAttachAndPullRequestArgs {
    /// The campaign whose commit and pull request text is used
    pub campaign: String,

    /// The recipe run to attach to
    pub run_id: String,
}

/// Arguments for the pr-attach command
#[derive(Args, Debug)]
pub struct PullRequestAttachArgs {
    /// The commit job to attach to
    pub commit_id: String,
}

/// Follows an existing recipe run and reports which repositories would be
/// filtered.
#[instrument(skip(context))]
pub async fn recipe(context: &Context, args: RecipeAttachArgs) -> Result<(), CliError> {
    let executor = context.create_executor()?;
    println!(
        "View live on Moderne {}",
        recipe_run_link(context.domain(), &args.run_id)
    );

    run_session(&executor, follow_recipe(context, &executor, &args.run_id, None)).await
}

/// Follows an existing recipe run, then opens pull requests for its results.
///
/// The campaign and the GPG key are loaded before attaching to the run.
#[instrument(skip(context))]
pub async fn recipe_and_pull_request(
    context: &Context,
    args: RecipeAttachAndPullRequestArgs,
) -> Result<(), CliError> {
    let campaign = context.load_campaign(&args.campaign)?;
    let gpg_key = load_signing_key()?;
    let executor = context.create_executor()?;
    println!(
        "View live on Moderne {}",
        recipe_run_link(context.domain(), &args.run_id)
    );

    run_session(
        &executor,
        follow_recipe(context, &executor, &args.run_id, Some((&campaign, &gpg_key))),
    )
    .await
}

/// Follows an existing commit job until it finishes.
#[instrument(skip(context))]
pub async fn pull_request(context: &Context, args: PullRequestAttachArgs) -> Result<(), CliError> {
    let executor = context.create_executor()?;
    println!(
        "View live on Moderne {}",
        commit_job_link(context.domain(), &args.commit_id)
    );

    let state = run_session(&executor, async {
        Ok::<_, CliError>(executor.await_pull_request(&args.commit_id).await?)
    })
    .await?;
    println!("Pull request generation finished with state {}", state);
    Ok(())
}

async fn follow_recipe(
    context: &Context,
    executor: &ConsoleExecutor,
    run_id: &str,
    pull_requests: Option<(&Campaign, &GpgKey)>,
) -> Result<(), CliError> {
    let result = executor.await_recipe(run_id).await?;
    let filtered = filter_result(context, executor, result).await?;

    let Some((campaign, gpg_key)) = pull_requests else {
        println!("Pull request generation not enabled. Complete!");
        return Ok(());
    };

    if let Some(state) = create_pull_requests(executor, campaign, gpg_key, &filtered).await? {
        println!("Pull request generation finished with state {}", state);
    }
    Ok(())
}
