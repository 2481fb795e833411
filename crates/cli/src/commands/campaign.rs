use campaign_runner_core::campaign::Campaign;
use clap::Args;

use super::Context;
use crate::errors::CliError;
use crate::monitor::render_campaign;

/// Arguments for the campaign command
#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// The campaign to print
    pub campaign: String,
}

/// Prints a loaded campaign. Does not contact the service.
pub fn print(context: &Context, args: CampaignArgs) -> Result<(), CliError> {
    let campaign = context.load_campaign(&args.campaign)?;
    println!("{}", render_campaign(&campaign));
    Ok(())
}

/// Prints the name of every campaign in the campaigns directory.
pub fn list(context: &Context) -> Result<(), CliError> {
    let names = Campaign::list_campaigns(&context.config.campaigns.directory)?;
    if names.is_empty() {
        println!(
            "No campaigns found in {}",
            context.config.campaigns.directory.display()
        );
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
