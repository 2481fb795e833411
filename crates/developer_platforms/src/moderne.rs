//! Access to the code-transformation service.
//!
//! [`ModerneGraphQlClient`] is the reqwest based transport implementing
//! [`QueryExecutor`]. [`ModerneClient`] layers the typed operations a campaign
//! needs (recipe submission, run status, result pages, commit jobs) on top of
//! any executor.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use indoc::indoc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::Error,
    models::{
        Commit, CommitJobSummary, ForkAndPullRequestInput, RecentRecipeRun, RecipeRunPriority,
        RecipeRunStatus, RecipeRunSummary, Repository,
    },
    paged::{PagedQuery, DEFAULT_MAX_PAGES},
    QueryExecutor,
};

#[cfg(test)]
#[path = "moderne_tests.rs"]
mod tests;

/// Domain of the public code-transformation service.
pub const DEFAULT_DOMAIN: &str = "public.moderne.io";

/// Request timeout, kept slightly below the service's own 60 second limit so a
/// slow request is reported as a client-side timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(55);

const USER_AGENT: &str = concat!("campaign-runner/", env!("CARGO_PKG_VERSION"));

/// Per-repository states that have not reached a successful end.
const UNFINISHED_STATES: [&str; 6] = [
    "ERROR",
    "LOADING",
    "QUEUED",
    "RUNNING",
    "CREATED",
    "UNAVAILABLE",
];

const RUN_YAML_RECIPE: &str = indoc! {"
    mutation runYamlRecipe($organizationId: ID, $yaml: Base64!, $priority: RecipeRunPriority) {
      runYamlRecipe(organizationId: $organizationId, yaml: $yaml, priority: $priority) {
        id
        start
      }
    }
"};

const RUN_YAML_RECIPE_ON_REPOSITORIES: &str = indoc! {"
    mutation runYamlRecipeOnRepositories(
      $repositoryFilter: [RepositoryInput!],
      $yaml: Base64!,
      $priority: RecipeRunPriority
    ) {
      runYamlRecipe(repositoryFilter: $repositoryFilter, yaml: $yaml, priority: $priority) {
        id
        start
      }
    }
"};

const RECIPE_RUN_STATUS: &str = indoc! {"
    query getRecipeRunStatus($id: ID!) {
      recipeRun(id: $id) {
        id
        state
        totals {
          totalFilesChanged
          totalFilesSearched
          totalRepositoriesSuccessful
          totalRepositoriesWithErrors
          totalRepositoriesWithResults
          totalRepositoriesWithNoChanges
          totalResults
          totalTimeSavings
        }
      }
    }
"};

const RECIPE_RUN_SUMMARY_PAGES: &str = indoc! {"
    query getRecipeRunSummaryResults(
      $id: ID!,
      $after: String,
      $filterBy: SummaryResultsFilterInput,
      $orderBy: SummaryResultsOrderInput
    ) {
      recipeRun(id: $id) {
        id
        state
        summaryResultsPages(after: $after, filterBy: $filterBy, orderBy: $orderBy) {
          pageInfo {
            hasNextPage
            endCursor
          }
          edges {
            node {
              debugMarkers
              errorMarkers
              infoMarkers
              warningMarkers
              timeSavings
              totalChanged
              totalSearched
              state
              performance {
                recipeRun
              }
              repository {
                origin
                path
                branch
              }
            }
          }
        }
      }
    }
"};

const RECENT_RECIPE_RUNS: &str = indoc! {"
    query getRecentRecipeRuns($after: String) {
      recipeRuns(after: $after, orderBy: { field: START, direction: DESC }) {
        pageInfo {
          hasNextPage
          endCursor
        }
        edges {
          node {
            id
            state
            recipe {
              id
              name
            }
          }
        }
      }
    }
"};

const FORK_AND_PULL_REQUEST: &str = indoc! {"
    mutation forkAndPullRequest(
      $commit: CommitInput!,
      $organization: String!,
      $pullRequestBody: Base64!,
      $pullRequestTitle: String!
    ) {
      forkAndPullRequest(
        commit: $commit,
        draft: false,
        maintainerCanModify: true,
        organization: $organization,
        pullRequestBody: $pullRequestBody,
        pullRequestTitle: $pullRequestTitle,
        shouldPrefixOrganizationName: true
      ) {
        id
      }
    }
"};

const COMMIT_JOB_COMMITS: &str = indoc! {"
    query getCommitJobCommits($id: ID!, $after: String) {
      commitJob(id: $id) {
        id
        commits(after: $after) {
          pageInfo {
            hasNextPage
            endCursor
          }
          edges {
            node {
              modified
              repository {
                origin
                path
                branch
              }
              resultLink
              state
              stateMessage
            }
          }
        }
      }
    }
"};

const COMMIT_JOB_SUMMARY: &str = indoc! {"
    query getCommitJobSummary($id: ID!) {
      commitJob(id: $id) {
        id
        completed
        summaryResults {
          count
          failedCount
          noChangeCount
          successfulCount
        }
      }
    }
"};

const RECIPE_RUN_SUMMARIES: PagedQuery<RecipeRunSummary> =
    PagedQuery::new(RECIPE_RUN_SUMMARY_PAGES, &["recipeRun", "summaryResultsPages"]);

const RECENT_RUNS: PagedQuery<RecentRecipeRun> =
    PagedQuery::new(RECENT_RECIPE_RUNS, &["recipeRuns"]);

const COMMIT_JOB_COMMIT_PAGES: PagedQuery<Commit> =
    PagedQuery::new(COMMIT_JOB_COMMITS, &["commitJob", "commits"]);

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorMessage>>,
}

/// GraphQL transport for the code-transformation service.
///
/// Every request carries the API token as a bearer credential and is bounded
/// by the configured timeout.
pub struct ModerneGraphQlClient {
    endpoint: String,
    token: String,
    timeout: Duration,
    http: Mutex<Option<reqwest::Client>>,
}

impl fmt::Debug for ModerneGraphQlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerneGraphQlClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ModerneGraphQlClient {
    /// Creates a client for `https://api.{domain}/`.
    pub fn new(domain: &str, token: String, timeout: Duration) -> Self {
        Self::with_endpoint(format!("https://api.{}/", domain), token, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, token: String, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            timeout,
            http: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connected_client(&self) -> Result<reqwest::Client, Error> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotConnected)
    }

    fn classify(&self, error: reqwest::Error, start: Instant) -> Error {
        if error.is_timeout() {
            let elapsed = start.elapsed();
            warn!(endpoint = %self.endpoint, ?elapsed, "Request to the remote service timed out");
            Error::Timeout { elapsed }
        } else {
            Error::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl QueryExecutor for ModerneGraphQlClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn connect(&self) -> Result<(), Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build the HTTP client: {}", e)))?;

        *self.http.lock().unwrap_or_else(PoisonError::into_inner) = Some(http);
        debug!("Connected to the remote service");
        Ok(())
    }

    async fn execute(&self, document: &str, variables: Value) -> Result<Value, Error> {
        let http = self.connected_client()?;
        let start = Instant::now();

        let response = http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await
            .map_err(|e| self.classify(e, start))?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "Remote service rejected the request");
            return Err(Error::HttpStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e, start)
            } else {
                Error::InvalidResponse(format!("response body is not valid JSON: {}", e))
            }
        })?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            return Err(Error::GraphQl(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        body.data
            .ok_or_else(|| Error::InvalidResponse("response contained no data".to_string()))
    }

    async fn close(&self) -> Result<(), Error> {
        if self
            .http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            debug!(endpoint = %self.endpoint, "Closed the connection to the remote service");
        }
        Ok(())
    }
}

/// Typed operations against the code-transformation service.
#[derive(Debug)]
pub struct ModerneClient<E: QueryExecutor> {
    domain: String,
    executor: E,
    max_pages: usize,
}

impl<E: QueryExecutor> ModerneClient<E> {
    pub fn new(domain: impl Into<String>, executor: E) -> Self {
        Self {
            domain: domain.into(),
            executor,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Limits how many pages any exhaustive traversal may request.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// The service domain, used to build links for humans.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub async fn connect(&self) -> Result<(), Error> {
        self.executor.connect().await
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.executor.close().await
    }

    /// Submits a recipe run against every repository of an organization.
    ///
    /// # Arguments
    ///
    /// * `recipe_yaml_base64` - The declarative recipe, base64 encoded
    /// * `organization_id` - The organization to run against, e.g. `Default`
    /// * `priority` - The scheduling priority
    ///
    /// # Returns
    ///
    /// The id of the new recipe run.
    #[instrument(skip(self, recipe_yaml_base64))]
    pub async fn run_yaml_recipe(
        &self,
        recipe_yaml_base64: &str,
        organization_id: &str,
        priority: RecipeRunPriority,
    ) -> Result<String, Error> {
        let variables = json!({
            "organizationId": organization_id,
            "yaml": recipe_yaml_base64,
            "priority": priority,
        });
        let data = self.executor.execute(RUN_YAML_RECIPE, variables).await?;
        let run_id: String = field(data, &["runYamlRecipe", "id"])?;

        info!(run_id = %run_id, "Submitted recipe run");
        Ok(run_id)
    }

    /// Submits a recipe run against an explicit list of repositories.
    #[instrument(skip(self, recipe_yaml_base64, repositories), fields(repositories = repositories.len()))]
    pub async fn run_yaml_recipe_on_repositories(
        &self,
        recipe_yaml_base64: &str,
        repositories: &[Repository],
        priority: RecipeRunPriority,
    ) -> Result<String, Error> {
        let variables = json!({
            "repositoryFilter": repositories,
            "yaml": recipe_yaml_base64,
            "priority": priority,
        });
        let data = self
            .executor
            .execute(RUN_YAML_RECIPE_ON_REPOSITORIES, variables)
            .await?;
        let run_id: String = field(data, &["runYamlRecipe", "id"])?;

        info!(run_id = %run_id, "Submitted recipe run");
        Ok(run_id)
    }

    /// Fetches the state and aggregate totals of a recipe run.
    pub async fn query_recipe_run_status(&self, run_id: &str) -> Result<RecipeRunStatus, Error> {
        let data = self
            .executor
            .execute(RECIPE_RUN_STATUS, json!({ "id": run_id }))
            .await?;
        field(data, &["recipeRun"])
    }

    /// Fetches every per-repository summary of a run matching the filter.
    pub async fn query_recipe_run(
        &self,
        run_id: &str,
        filter_by: Option<Value>,
        order_by: Option<Value>,
    ) -> Result<Vec<RecipeRunSummary>, Error> {
        RECIPE_RUN_SUMMARIES
            .with_max_pages(self.max_pages)
            .get_all(&self.executor, summary_variables(run_id, filter_by, order_by))
            .await
    }

    /// Repository breakdown for progress reports: finished repositories with
    /// results, most results first, followed by the first page of
    /// repositories that have not finished.
    ///
    /// The two lookups are independent and run concurrently.
    #[instrument(skip(self))]
    pub async fn query_recipe_run_sorted_by_results(
        &self,
        run_id: &str,
    ) -> Result<Vec<RecipeRunSummary>, Error> {
        let finished = self.query_recipe_run(
            run_id,
            Some(json!({ "statuses": ["FINISHED"], "onlyWithResults": true })),
            Some(json!({ "direction": "DESC", "field": "TOTAL_RESULTS" })),
        );
        let first_page = RECIPE_RUN_SUMMARIES;
        let unfinished = first_page.get_first_page(
            &self.executor,
            summary_variables(
                run_id,
                Some(json!({ "statuses": UNFINISHED_STATES })),
                None,
            ),
        );

        let (mut finished, unfinished) = tokio::try_join!(finished, unfinished)?;
        finished.extend(unfinished);
        Ok(finished)
    }

    /// Repositories that finished with at least one result.
    #[instrument(skip(self))]
    pub async fn query_recipe_run_results_repositories(
        &self,
        run_id: &str,
    ) -> Result<Vec<Repository>, Error> {
        let summaries = self
            .query_recipe_run(
                run_id,
                Some(json!({ "statuses": ["FINISHED"], "onlyWithResults": true })),
                None,
            )
            .await?;
        Ok(summaries.into_iter().map(|s| s.repository).collect())
    }

    /// The most recent recipe runs visible to the caller, newest first.
    ///
    /// Only the first page is requested.
    pub async fn query_recent_recipe_runs(&self) -> Result<Vec<RecentRecipeRun>, Error> {
        RECENT_RUNS.get_first_page(&self.executor, Map::new()).await
    }

    /// Starts a commit job that forks each repository and opens a pull request.
    ///
    /// # Returns
    ///
    /// The id of the commit job.
    #[instrument(skip(self, input), fields(recipe_run_id = %input.recipe_run_id, repositories = input.repositories.len()))]
    pub async fn fork_and_pull_request(
        &self,
        input: &ForkAndPullRequestInput,
    ) -> Result<String, Error> {
        let variables = json!({
            "commit": {
                "branchName": input.branch_name,
                "gpgKey": input.gpg_key,
                "message": input.commit_message,
                "extendedMessage": input.extended_message,
                "recipeRunId": input.recipe_run_id,
                "repositories": input.repositories,
            },
            "organization": input.organization,
            "pullRequestTitle": input.pull_request_title,
            "pullRequestBody": input.pull_request_body,
        });
        let data = self
            .executor
            .execute(FORK_AND_PULL_REQUEST, variables)
            .await?;
        let commit_job_id: String = field(data, &["forkAndPullRequest", "id"])?;

        info!(commit_job_id = %commit_job_id, "Submitted commit job");
        Ok(commit_job_id)
    }

    /// Every commit record of a commit job.
    pub async fn query_commit_job_commits(&self, commit_job_id: &str) -> Result<Vec<Commit>, Error> {
        let mut variables = Map::new();
        variables.insert("id".to_string(), json!(commit_job_id));
        COMMIT_JOB_COMMIT_PAGES
            .with_max_pages(self.max_pages)
            .get_all(&self.executor, variables)
            .await
    }

    /// Job-level counters of a commit job.
    pub async fn query_commit_job_summary(
        &self,
        commit_job_id: &str,
    ) -> Result<CommitJobSummary, Error> {
        let data = self
            .executor
            .execute(COMMIT_JOB_SUMMARY, json!({ "id": commit_job_id }))
            .await?;
        field(data, &["commitJob"])
    }
}

fn summary_variables(
    run_id: &str,
    filter_by: Option<Value>,
    order_by: Option<Value>,
) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert("id".to_string(), json!(run_id));
    if let Some(filter_by) = filter_by {
        variables.insert("filterBy".to_string(), filter_by);
    }
    if let Some(order_by) = order_by {
        variables.insert("orderBy".to_string(), order_by);
    }
    variables
}

fn field<T: DeserializeOwned>(mut data: Value, path: &[&str]) -> Result<T, Error> {
    for key in path {
        data = data
            .get_mut(*key)
            .map(Value::take)
            .ok_or_else(|| Error::InvalidResponse(format!("missing field '{}' in response", key)))?;
    }
    serde_json::from_value(data).map_err(|e| {
        Error::InvalidResponse(format!("field '{}' is malformed: {}", path.join("."), e))
    })
}
