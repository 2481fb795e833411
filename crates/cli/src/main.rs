//! # Campaign Runner CLI
//!
//! Command-line interface for running bulk code-fix campaigns.
//!
//! A campaign's recipe is run on the remote code-transformation service, the
//! repositories with results are filtered, and pull requests are opened for
//! the repositories that remain.
//!
//! # Commands
//!
//! - `run-recipe` - Run a campaign's recipe without creating pull requests
//! - `run-pull-requests` - Run a campaign's recipe and create pull requests
//! - `recipe-attach` - Follow a running recipe execution
//! - `recipe-attach-and-run-pull-request` - Follow a recipe execution, then
//!   create pull requests from it
//! - `pr-attach` - Follow a running pull request job
//! - `campaign` - Print a campaign
//! - `list-campaigns` - List the available campaigns
//!
//! # Examples
//!
//! ```bash
//! # Dry run against the default organization
//! campaign-runner run-recipe https-everywhere
//!
//! # Run against two repositories and open pull requests
//! campaign-runner run-pull-requests https-everywhere \
//!     --repository-filter github.com/acme/widgets \
//!     --repository-filter github.com/acme/gadgets@develop
//! ```

#![deny(missing_docs)]

use std::process::{ExitCode, Termination};

use clap::{Parser, Subcommand};
use tracing::{debug, error, instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command implementations for the CLI.
mod commands;

/// Configuration management for the CLI.
mod config;

/// Error types specific to the CLI.
mod errors;

/// Console progress rendering.
mod monitor;

use commands::{
    attach::{PullRequestAttachArgs, RecipeAttachAndPullRequestArgs, RecipeAttachArgs},
    campaign::CampaignArgs,
    run::RunRecipeArgs,
    Context,
};
use config::AppConfig;
use errors::CliError;

/// Environment variable holding the log filter directives
const LOG_ENV_VAR: &str = "CAMPAIGN_RUNNER_LOG";

/// Command-line interface structure for the campaign runner.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The Moderne SaaS domain to communicate with [default: public.moderne.io]
    #[arg(long, global = true)]
    moderne_domain: Option<String>,

    /// Alternate config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the campaign runner.
#[derive(Subcommand)]
enum Commands {
    /// Run a recipe without creating pull requests
    RunRecipe(RunRecipeArgs),

    /// Run a recipe and create pull requests
    RunPullRequests(RunRecipeArgs),

    /// Attach to a running recipe execution
    RecipeAttach(RecipeAttachArgs),

    /// Attach to a running recipe execution, then generate pull requests from it
    RecipeAttachAndRunPullRequest(RecipeAttachAndPullRequestArgs),

    /// Attach to a running pull request execution
    PrAttach(PullRequestAttachArgs),

    /// Print data about a campaign
    Campaign(CampaignArgs),

    /// List the available campaigns
    ListCampaigns,
}

/// Sets up the global tracing subscriber.
///
/// `CAMPAIGN_RUNNER_LOG` takes precedence; otherwise `--verbose` selects the
/// `debug` level and `info` is used. Logs go to stderr.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Main entry point for the campaign runner CLI.
///
/// Failures are reported on stderr and mapped to the exit code of their
/// [`CliError`] category.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e);
            e.report()
        }
    }
}

/// Dispatches to the command handler.
#[instrument(skip(cli))]
async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let context = Context::new(config, cli.moderne_domain);
    debug!(domain = context.domain(), "Configuration loaded");

    match cli.command {
        Commands::RunRecipe(args) => commands::run::execute(&context, args, false).await,
        Commands::RunPullRequests(args) => commands::run::execute(&context, args, true).await,
        Commands::RecipeAttach(args) => commands::attach::recipe(&context, args).await,
        Commands::RecipeAttachAndRunPullRequest(args) => {
            commands::attach::recipe_and_pull_request(&context, args).await
        }
        Commands::PrAttach(args) => commands::attach::pull_request(&context, args).await,
        Commands::Campaign(args) => commands::campaign::print(&context, args),
        Commands::ListCampaigns => commands::campaign::list(&context),
    }
}
