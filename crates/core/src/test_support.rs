//! In-memory stand-ins for the remote service, the file fetcher and the
//! progress monitor.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use campaign_runner_developer_platforms::{
    errors::Error,
    models::{Commit, RecipeRunStatus, RecipeRunSummary, Repository, RunState},
    FileFetcher, QueryExecutor,
};
use serde_json::{json, Value};

use crate::{
    campaign::Campaign, commit_job::CommitJobState, progress::ProgressMonitor,
    FilteredRecipeExecutionResult,
};

/// Name of the operation a GraphQL document declares, e.g. `getRecipeRunStatus`.
pub fn operation_name(document: &str) -> String {
    document
        .split_whitespace()
        .nth(1)
        .and_then(|token| token.split('(').next())
        .unwrap_or_default()
        .to_string()
}

/// Answers queries from per-operation queues and records every call.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, Error>>>>,
    calls: Mutex<Vec<(String, Value)>>,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, operation: &str, data: Value) -> &Self {
        self.push(operation, Ok(data))
    }

    pub fn fail(&self, operation: &str, error: Error) -> &Self {
        self.push(operation, Err(error))
    }

    fn push(&self, operation: &str, response: Result<Value, Error>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == operation)
            .map(|(_, variables)| variables)
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn connect(&self) -> Result<(), Error> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(&self, document: &str, variables: Value) -> Result<Value, Error> {
        let operation = operation_name(document);
        self.calls
            .lock()
            .unwrap()
            .push((operation.clone(), variables));

        self.responses
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(Error::Transport(format!(
                    "no response scripted for {}",
                    operation
                )))
            })
    }

    async fn close(&self) -> Result<(), Error> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A scripted HTTP status for one URL.
#[derive(Debug, Clone)]
pub enum FetchResponse {
    Ok(String),
    NotFound,
    Status(u16),
}

/// Serves files from a URL map; unknown URLs are 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    files: HashMap<String, FetchResponse>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, response: FetchResponse) -> Self {
        self.files.insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileFetcher for ScriptedFetcher {
    async fn fetch_file(&self, url: &str) -> Result<Option<String>, Error> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.files.get(url) {
            Some(FetchResponse::Ok(content)) => Ok(Some(content.clone())),
            Some(FetchResponse::Status(status)) => Err(Error::HttpStatus {
                url: url.to_string(),
                status: *status,
            }),
            Some(FetchResponse::NotFound) | None => Ok(None),
        }
    }
}

/// A monitor event, with just enough detail for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RecipeRunStarted(String),
    RecipeProgress(RunState, usize),
    RecipeRunCompleted(RunState),
    RepositoriesFiltered(usize, usize),
    PullRequestGenerationStarted(String),
    PullRequestGenerationProgress(CommitJobState, usize),
    PullRequestGenerationCompleted(CommitJobState),
}

#[derive(Debug, Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<Event>>,
}

impl RecordingMonitor {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressMonitor for RecordingMonitor {
    fn on_recipe_run_started(&self, run_id: &str) {
        self.record(Event::RecipeRunStarted(run_id.to_string()));
    }

    fn on_recipe_progress(
        &self,
        _run_id: &str,
        status: &RecipeRunStatus,
        summaries: &[RecipeRunSummary],
    ) {
        self.record(Event::RecipeProgress(status.state, summaries.len()));
    }

    fn on_recipe_run_completed(&self, _run_id: &str, state: RunState) {
        self.record(Event::RecipeRunCompleted(state));
    }

    fn on_repositories_filtered(&self, result: &FilteredRecipeExecutionResult) {
        self.record(Event::RepositoriesFiltered(
            result.repositories.len(),
            result.filtered_repositories.len(),
        ));
    }

    fn on_pull_request_generation_started(&self, commit_job_id: &str) {
        self.record(Event::PullRequestGenerationStarted(
            commit_job_id.to_string(),
        ));
    }

    fn on_pull_request_generation_progress(
        &self,
        _commit_job_id: &str,
        state: &CommitJobState,
        commits: &[Commit],
    ) {
        self.record(Event::PullRequestGenerationProgress(
            state.clone(),
            commits.len(),
        ));
    }

    fn on_pull_request_generation_completed(&self, _commit_job_id: &str, state: &CommitJobState) {
        self.record(Event::PullRequestGenerationCompleted(state.clone()));
    }
}

pub fn repository(path: &str) -> Repository {
    Repository::new("github.com", path, "main")
}

pub fn repository_json(repository: &Repository) -> Value {
    json!({
        "origin": repository.origin,
        "path": repository.path,
        "branch": repository.branch
    })
}

pub fn campaign() -> Campaign {
    Campaign {
        name: "https-everywhere".to_string(),
        recipe_id: "org.openrewrite.java.security.SecureHttp".to_string(),
        branch: "fix/https".to_string(),
        commit_title: "Use HTTPS for dependency resolution".to_string(),
        commit_extended: "Body\n".to_string(),
        pr_title: "Use HTTPS".to_string(),
        pr_body: "PR body\n".to_string(),
    }
}

/// `getRecipeRunStatus` data for a run in `state`.
pub fn status_data(run_id: &str, state: &str, total_results: u64) -> Value {
    json!({
        "recipeRun": {
            "id": run_id,
            "state": state,
            "totals": { "totalResults": total_results, "totalTimeSavings": "PT0S" }
        }
    })
}

/// `getRecipeRunSummaryResults` data holding one page of summaries.
pub fn summaries_data(run_id: &str, repositories: &[Repository], state: &str) -> Value {
    let edges: Vec<Value> = repositories
        .iter()
        .map(|repository| {
            json!({
                "node": {
                    "totalChanged": 1,
                    "totalSearched": 1,
                    "state": state,
                    "performance": { "recipeRun": "PT1S" },
                    "repository": repository_json(repository)
                }
            })
        })
        .collect();

    json!({
        "recipeRun": {
            "id": run_id,
            "state": state,
            "summaryResultsPages": {
                "pageInfo": { "hasNextPage": false, "endCursor": null },
                "edges": edges
            }
        }
    })
}

/// `getRecentRecipeRuns` data listing runs of the given recipe ids.
pub fn recent_runs_data(runs: &[(&str, &str)]) -> Value {
    let edges: Vec<Value> = runs
        .iter()
        .map(|(run_id, recipe_id)| {
            json!({
                "node": { "id": run_id, "state": "RUNNING", "recipe": { "id": recipe_id } }
            })
        })
        .collect();

    json!({
        "recipeRuns": {
            "pageInfo": { "hasNextPage": false, "endCursor": null },
            "edges": edges
        }
    })
}
