//! Excludes the top ten thousand critical OSS projects.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use campaign_runner_developer_platforms::{models::Repository, FileFetcher};
use tracing::{info, instrument};

use super::{FilterDetailedReason, FilterFactory, FilterReason, RepositoryFilter};
use crate::errors::CampaignError;

#[cfg(test)]
#[path = "top_projects_tests.rs"]
mod tests;

/// Column holding the canonical repository URL
pub const URL_COLUMN: &str = "URL";

const DETAILS: &str = "The repository is in the top 10,000 critical OSS projects.";

/// Matches repositories by canonical URL against the critical projects list.
///
/// The list is loaded once and kept in memory.
#[derive(Debug, Clone, Default)]
pub struct TopProjectsFilter {
    urls: HashSet<String>,
}

impl TopProjectsFilter {
    pub fn new(urls: HashSet<String>) -> Self {
        Self { urls }
    }

    /// Reads the non-empty values of the `URL` column of a CSV document.
    ///
    /// Rows may have fewer or more fields than the header.
    pub fn from_csv(content: &str) -> Result<Self, CampaignError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| CampaignError::CriticalProjectsList(e.to_string()))?;
        let column = headers
            .iter()
            .position(|header| header.trim() == URL_COLUMN)
            .ok_or_else(|| {
                CampaignError::CriticalProjectsList(format!("missing '{}' column", URL_COLUMN))
            })?;

        let mut urls = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(|e| CampaignError::CriticalProjectsList(e.to_string()))?;
            if let Some(url) = record.get(column).map(str::trim).filter(|url| !url.is_empty()) {
                urls.insert(url.to_string());
            }
        }

        Ok(Self { urls })
    }

    /// Downloads and parses the list.
    ///
    /// A missing list is an error; filtering without it would let critical
    /// projects through.
    #[instrument(skip(fetcher))]
    pub async fn load(fetcher: &dyn FileFetcher, url: &str) -> Result<Self, CampaignError> {
        let content = fetcher.fetch_file(url).await?.ok_or_else(|| {
            CampaignError::CriticalProjectsList(format!("{} was not found", url))
        })?;
        let filter = Self::from_csv(&content)?;

        info!(projects = filter.len(), "Loaded critical projects list");
        Ok(filter)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, repository: &Repository) -> bool {
        self.urls.contains(&repository.as_url())
    }
}

#[async_trait]
impl RepositoryFilter for TopProjectsFilter {
    async fn should_filter_repository(
        &self,
        repository: &Repository,
    ) -> Result<Vec<FilterDetailedReason>, CampaignError> {
        if self.contains(repository) {
            Ok(vec![FilterDetailedReason::new(
                FilterReason::TopTenThousand,
                DETAILS,
            )])
        } else {
            Ok(Vec::new())
        }
    }
}

pub struct TopProjectsFilterFactory {
    fetcher: Arc<dyn FileFetcher>,
    url: String,
}

impl TopProjectsFilterFactory {
    pub fn new(fetcher: Arc<dyn FileFetcher>, url: String) -> Self {
        Self { fetcher, url }
    }
}

#[async_trait]
impl FilterFactory for TopProjectsFilterFactory {
    async fn create(&self) -> Result<Box<dyn RepositoryFilter>, CampaignError> {
        let filter = TopProjectsFilter::load(self.fetcher.as_ref(), &self.url).await?;
        Ok(Box::new(filter))
    }
}
