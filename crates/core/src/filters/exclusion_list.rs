//! Excludes an explicit list of repositories.

use std::collections::BTreeMap;

use async_trait::async_trait;
use campaign_runner_developer_platforms::models::Repository;

use super::{FilterDetailedReason, FilterFactory, FilterReason, RepositoryFilter};
use crate::errors::CampaignError;

#[cfg(test)]
#[path = "exclusion_list_tests.rs"]
mod tests;

/// Repositories that are always excluded, keyed by canonical URL.
pub fn builtin_exclusions() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(
        "https://github.com/wmaintw/DependencyCheck".to_string(),
        vec!["Fork of the upstream `jeremylong/DependencyCheck`".to_string()],
    )])
}

/// Maps canonical repository URLs to free-text exclusion reasons.
///
/// Each reason of a listed repository becomes one `OTHER` reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionListFilter {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for ExclusionListFilter {
    fn default() -> Self {
        Self::new(builtin_exclusions())
    }
}

impl ExclusionListFilter {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// The built-in list with `additional` entries layered on top.
    ///
    /// An additional entry for an already listed URL replaces its reasons.
    pub fn with_additional(additional: BTreeMap<String, Vec<String>>) -> Self {
        let mut entries = builtin_exclusions();
        entries.extend(additional);
        Self::new(entries)
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entries
    }
}

#[async_trait]
impl RepositoryFilter for ExclusionListFilter {
    async fn should_filter_repository(
        &self,
        repository: &Repository,
    ) -> Result<Vec<FilterDetailedReason>, CampaignError> {
        Ok(self
            .entries
            .get(&repository.as_url())
            .map(|reasons| {
                reasons
                    .iter()
                    .map(|details| FilterDetailedReason::new(FilterReason::Other, details.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub struct ExclusionListFilterFactory {
    additional: BTreeMap<String, Vec<String>>,
}

impl ExclusionListFilterFactory {
    pub fn new(additional: BTreeMap<String, Vec<String>>) -> Self {
        Self { additional }
    }
}

#[async_trait]
impl FilterFactory for ExclusionListFilterFactory {
    async fn create(&self) -> Result<Box<dyn RepositoryFilter>, CampaignError> {
        Ok(Box::new(ExclusionListFilter::with_additional(
            self.additional.clone(),
        )))
    }
}
