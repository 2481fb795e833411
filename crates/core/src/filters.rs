//! # Repository Filters
//!
//! This module decides which repositories of a finished recipe run are
//! eligible for pull requests.
//!
//! Each filter maps a repository to zero or more [`FilterDetailedReason`]s; an
//! empty list means "keep". The filters are organized into submodules:
//! - `robots`: honours a `.github/GH-ROBOTS.txt` file in the repository
//! - `top_projects`: excludes the top ten thousand critical OSS projects
//! - `exclusion_list`: excludes an explicit list of repository URLs
//!
//! Filters are created through a [`FilterRegistry`], which maps every
//! [`FilterReason`] to the factory that builds its filter.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use campaign_runner_developer_platforms::{models::Repository, FileFetcher};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    config::FilterConfig, errors::CampaignError, FilteredRecipeExecutionResult,
    RecipeExecutionResult,
};

pub mod exclusion_list;
pub mod robots;
pub mod top_projects;

use exclusion_list::ExclusionListFilterFactory;
use robots::RobotsTxtFilterFactory;
use top_projects::TopProjectsFilterFactory;

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;

/// Why a repository was excluded from pull-request generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterReason {
    /// The repository opted out through its robots-exclusion file
    GhRobotsTxt,

    /// The repository is one of the top ten thousand critical projects
    TopTenThousand,

    /// The repository is on the explicit exclusion list
    Other,
}

impl FilterReason {
    pub const ALL: [FilterReason; 3] = [
        FilterReason::GhRobotsTxt,
        FilterReason::TopTenThousand,
        FilterReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::GhRobotsTxt => "GH_ROBOTS_TXT",
            FilterReason::TopTenThousand => "TOP_TEN_THOUSAND",
            FilterReason::Other => "OTHER",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterReason::ALL
            .iter()
            .copied()
            .find(|reason| reason.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown filter reason: {}", s))
    }
}

/// One match from one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDetailedReason {
    pub reason: FilterReason,
    pub details: String,
}

impl FilterDetailedReason {
    pub fn new(reason: FilterReason, details: impl Into<String>) -> Self {
        Self {
            reason,
            details: details.into(),
        }
    }
}

/// A predicate deciding whether a repository must be excluded.
#[async_trait]
pub trait RepositoryFilter: Send + Sync {
    /// Returns every reason the repository must be excluded for.
    ///
    /// An empty list means the repository is kept. Failing to consult a data
    /// source is an error, never an empty list.
    async fn should_filter_repository(
        &self,
        repository: &Repository,
    ) -> Result<Vec<FilterDetailedReason>, CampaignError>;
}

/// Partitions the repositories of a recipe run into the ones that survive the
/// filter and the ones that were excluded, with their reasons.
///
/// Surviving repositories keep their original order with duplicates removed.
/// Any filter failure aborts the whole pass.
#[instrument(skip(filter, result), fields(run_id = %result.run_id, repositories = result.repositories.len()))]
pub async fn filter_repositories<F>(
    filter: &F,
    result: RecipeExecutionResult,
) -> Result<FilteredRecipeExecutionResult, CampaignError>
where
    F: RepositoryFilter + ?Sized,
{
    let mut seen = HashSet::new();
    let mut repositories = Vec::new();
    let mut filtered_repositories = BTreeMap::new();

    for repository in result.repositories {
        if !seen.insert(repository.clone()) {
            continue;
        }

        let reasons = filter.should_filter_repository(&repository).await?;
        if reasons.is_empty() {
            repositories.push(repository);
        } else {
            debug!(repository = %repository, reasons = reasons.len(), "Repository filtered");
            filtered_repositories.insert(repository, reasons);
        }
    }

    info!(
        kept = repositories.len(),
        filtered = filtered_repositories.len(),
        "Filtered recipe run repositories"
    );

    Ok(FilteredRecipeExecutionResult {
        run_id: result.run_id,
        repositories,
        filtered_repositories,
    })
}

/// Evaluates every child filter and concatenates their reasons in order.
///
/// Evaluation never short-circuits.
pub struct CombinedFilter {
    filters: Vec<(FilterReason, Box<dyn RepositoryFilter>)>,
}

impl CombinedFilter {
    pub fn new(filters: Vec<(FilterReason, Box<dyn RepositoryFilter>)>) -> Self {
        Self { filters }
    }

    /// The reasons of the child filters, in evaluation order.
    pub fn reasons(&self) -> Vec<FilterReason> {
        self.filters.iter().map(|(reason, _)| *reason).collect()
    }
}

impl fmt::Debug for CombinedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedFilter")
            .field("filters", &self.reasons())
            .finish()
    }
}

#[async_trait]
impl RepositoryFilter for CombinedFilter {
    async fn should_filter_repository(
        &self,
        repository: &Repository,
    ) -> Result<Vec<FilterDetailedReason>, CampaignError> {
        let mut reasons = Vec::new();
        for (_, filter) in &self.filters {
            reasons.extend(filter.should_filter_repository(repository).await?);
        }
        Ok(reasons)
    }
}

/// Builds the filter for one [`FilterReason`].
///
/// Filters backed by a remote data set load it here, once.
#[async_trait]
pub trait FilterFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn RepositoryFilter>, CampaignError>;
}

/// Maps filter reasons to the factories building their filters.
#[derive(Default, Clone)]
pub struct FilterRegistry {
    factories: HashMap<FilterReason, Arc<dyn FilterFactory>>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<_> = self.factories.keys().collect();
        registered.sort();
        f.debug_struct("FilterRegistry")
            .field("registered", &registered)
            .finish()
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in filter for every reason, configured
    /// from `config` and reading remote data through `fetcher`.
    pub fn with_defaults(config: &FilterConfig, fetcher: Arc<dyn FileFetcher>) -> Self {
        let mut registry = Self::new();
        registry.register(
            FilterReason::GhRobotsTxt,
            Arc::new(RobotsTxtFilterFactory::new(
                fetcher.clone(),
                config.robots_base_url.clone(),
                config.robots_user_agents.clone(),
            )),
        );
        registry.register(
            FilterReason::TopTenThousand,
            Arc::new(TopProjectsFilterFactory::new(
                fetcher,
                config.critical_projects_url.clone(),
            )),
        );
        registry.register(
            FilterReason::Other,
            Arc::new(ExclusionListFilterFactory::new(config.exclusions.clone())),
        );
        registry
    }

    /// Registers a factory, replacing any previous one for the same reason.
    pub fn register(&mut self, reason: FilterReason, factory: Arc<dyn FilterFactory>) {
        self.factories.insert(reason, factory);
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, reason: FilterReason) -> bool {
        self.factories.contains_key(&reason)
    }

    /// Builds a [`CombinedFilter`] evaluating the given reasons in order.
    ///
    /// A reason listed twice is only evaluated once.
    #[instrument(skip(self))]
    pub async fn create_filter(
        &self,
        reasons: &[FilterReason],
    ) -> Result<CombinedFilter, CampaignError> {
        let mut filters: Vec<(FilterReason, Box<dyn RepositoryFilter>)> = Vec::new();
        for reason in reasons {
            if filters.iter().any(|(existing, _)| existing == reason) {
                continue;
            }

            let factory = self
                .factories
                .get(reason)
                .ok_or(CampaignError::UnregisteredFilter(*reason))?;
            filters.push((*reason, factory.create().await?));
        }

        debug!(filters = filters.len(), "Created combined repository filter");
        Ok(CombinedFilter::new(filters))
    }

    /// Builds a filter for every known reason.
    pub async fn create_all(&self) -> Result<CombinedFilter, CampaignError> {
        self.create_filter(&FilterReason::ALL).await
    }
}
