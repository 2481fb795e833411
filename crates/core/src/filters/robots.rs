//! Honours the `.github/GH-ROBOTS.txt` opt-out file of a repository.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_runner_developer_platforms::{
    github::{robots_file_url, ROBOTS_FILE_PATH},
    models::Repository,
    FileFetcher,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument};

use super::{FilterDetailedReason, FilterFactory, FilterReason, RepositoryFilter};
use crate::errors::CampaignError;

#[cfg(test)]
#[path = "robots_tests.rs"]
mod tests;

/// Only repositories hosted here have a robots-exclusion file to consult.
pub const GITHUB_ORIGIN: &str = "github.com";

lazy_static! {
    /// A `field: value` line of a robots-exclusion document
    static ref ROBOTS_LINE_REGEX: Regex =
        Regex::new(r"^\s*([A-Za-z-]+)\s*:\s*(.*?)\s*$").expect("Failed to compile robots line regex");
}

/// One `User-agent` group of a robots-exclusion document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsGroup {
    pub user_agents: Vec<String>,
    pub disallow: Vec<String>,
    pub allow: Vec<String>,
}

/// A parsed robots-exclusion document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsDocument {
    groups: Vec<RobotsGroup>,
}

impl RobotsDocument {
    /// Parses the document line by line.
    ///
    /// Consecutive `User-agent` lines share a group; a `User-agent` line
    /// following a rule starts a new one. Comments, blank lines, unknown
    /// fields and rules outside any group are ignored.
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<RobotsGroup> = Vec::new();
        let mut in_rules = false;

        for raw_line in content.lines() {
            let line = raw_line.split('#').next().unwrap_or_default();
            let Some(captures) = ROBOTS_LINE_REGEX.captures(line) else {
                continue;
            };
            let field = captures[1].to_ascii_lowercase();
            let value = captures[2].to_string();

            match field.as_str() {
                "user-agent" => {
                    if in_rules || groups.is_empty() {
                        groups.push(RobotsGroup::default());
                        in_rules = false;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.user_agents.push(value);
                    }
                }
                "disallow" | "allow" => {
                    let Some(group) = groups.last_mut() else {
                        continue;
                    };
                    in_rules = true;
                    if field == "disallow" {
                        group.disallow.push(value);
                    } else {
                        group.allow.push(value);
                    }
                }
                _ => {}
            }
        }

        Self { groups }
    }

    #[cfg(test)]
    pub(crate) fn groups(&self) -> &[RobotsGroup] {
        &self.groups
    }

    /// Returns `true` when a group naming this agent disallows anything.
    ///
    /// A group applies when one of its agent tokens is contained in
    /// `user_agent`, ignoring case. Wildcard groups are not considered; they
    /// target crawlers in general rather than this tool.
    pub fn disallows(&self, user_agent: &str) -> bool {
        let user_agent = user_agent.to_lowercase();
        self.groups.iter().any(|group| {
            let applies = group.user_agents.iter().any(|agent| {
                let agent = agent.to_lowercase();
                agent != "*" && !agent.is_empty() && user_agent.contains(&agent)
            });
            applies && group.disallow.iter().any(|path| !path.is_empty())
        })
    }
}

/// Excludes GitHub repositories whose robots-exclusion file disallows one of
/// the configured user agents.
pub struct RobotsTxtFilter {
    fetcher: Arc<dyn FileFetcher>,
    base_url: String,
    user_agents: Vec<String>,
}

impl RobotsTxtFilter {
    pub fn new(fetcher: Arc<dyn FileFetcher>, base_url: String, user_agents: Vec<String>) -> Self {
        Self {
            fetcher,
            base_url,
            user_agents,
        }
    }
}

#[async_trait]
impl RepositoryFilter for RobotsTxtFilter {
    #[instrument(skip(self), fields(repository = %repository))]
    async fn should_filter_repository(
        &self,
        repository: &Repository,
    ) -> Result<Vec<FilterDetailedReason>, CampaignError> {
        if repository.origin != GITHUB_ORIGIN {
            return Ok(Vec::new());
        }

        let (owner, name) = repository
            .owner_and_name()
            .ok_or_else(|| CampaignError::InvalidRepository(repository.to_string()))?;
        let url = robots_file_url(&self.base_url, owner, name, &repository.branch);

        let Some(content) = self.fetcher.fetch_file(&url).await? else {
            debug!("No robots-exclusion file present");
            return Ok(Vec::new());
        };

        let document = RobotsDocument::parse(&content);
        Ok(self
            .user_agents
            .iter()
            .filter(|agent| document.disallows(agent))
            .map(|agent| {
                FilterDetailedReason::new(
                    FilterReason::GhRobotsTxt,
                    format!(
                        "Repository {}/{} is disallowed by {} containing agent {}.",
                        owner, name, ROBOTS_FILE_PATH, agent
                    ),
                )
            })
            .collect())
    }
}

pub struct RobotsTxtFilterFactory {
    fetcher: Arc<dyn FileFetcher>,
    base_url: String,
    user_agents: Vec<String>,
}

impl RobotsTxtFilterFactory {
    pub fn new(fetcher: Arc<dyn FileFetcher>, base_url: String, user_agents: Vec<String>) -> Self {
        Self {
            fetcher,
            base_url,
            user_agents,
        }
    }
}

#[async_trait]
impl FilterFactory for RobotsTxtFilterFactory {
    async fn create(&self) -> Result<Box<dyn RepositoryFilter>, CampaignError> {
        Ok(Box::new(RobotsTxtFilter::new(
            self.fetcher.clone(),
            self.base_url.clone(),
            self.user_agents.clone(),
        )))
    }
}
