//! Recovery of a recipe run id lost to a submission timeout.
//!
//! The service may start a run even though the submitting request timed out.
//! Every submitted recipe carries a correlation token in its name, so the run
//! can be found again in the recent run history.

use std::time::Duration;

use campaign_runner_developer_platforms::{
    errors::Error as PlatformError, models::RecentRecipeRun, moderne::ModerneClient,
    QueryExecutor,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::CampaignError;

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;

/// A fresh correlation token, usable inside a recipe name.
pub fn new_correlation_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// How persistently the run history is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Finds the run whose recipe carries the correlation token.
pub fn find_run<'a>(
    runs: &'a [RecentRecipeRun],
    correlation_token: &str,
) -> Option<&'a RecentRecipeRun> {
    runs.iter().find(|run| {
        run.recipe.id.contains(correlation_token)
            || run
                .recipe
                .name
                .as_deref()
                .is_some_and(|name| name.contains(correlation_token))
    })
}

/// Searches the first page of the recent run history for the run carrying
/// `correlation_token`.
///
/// Each attempt waits `policy.delay` first. An attempt that times out counts
/// as "not found yet"; any other failure ends the search. When every attempt
/// has been used, the error carries `submission_timeout` as its source.
#[instrument(skip(client, submission_timeout))]
pub async fn recover_run_id<E: QueryExecutor>(
    client: &ModerneClient<E>,
    correlation_token: &str,
    policy: RecoveryPolicy,
    submission_timeout: PlatformError,
) -> Result<String, CampaignError> {
    warn!(
        error = %submission_timeout,
        "Recipe run submission timed out, searching the run history for the run"
    );

    for attempt in 1..=policy.attempts {
        tokio::time::sleep(policy.delay).await;

        let runs = match client.query_recent_recipe_runs().await {
            Ok(runs) => runs,
            Err(e) if e.is_timeout() => {
                warn!(attempt, "Run history lookup timed out");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(run) = find_run(&runs, correlation_token) {
            info!(attempt, run_id = %run.id, "Recovered recipe run id");
            return Ok(run.id.clone());
        }

        info!(attempt, attempts = policy.attempts, "Recipe run not found yet");
    }

    Err(CampaignError::RecoveryExhausted {
        correlation_token: correlation_token.to_string(),
        attempts: policy.attempts,
        source: submission_timeout,
    })
}
