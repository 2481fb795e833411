//! # Campaigns
//!
//! A campaign bundles the recipe to run with the commit and pull-request text
//! used for its results. Campaigns live in a directory per campaign:
//!
//! ```text
//! campaigns/
//! ├── commit_footer.txt          (optional, appended to every commit body)
//! ├── pr_message_footer.md       (optional, appended to every PR body)
//! └── <name>/
//!     ├── campaign.toml          (recipe_id, branch)
//!     ├── commit.txt             (first line = title, rest = body)
//!     └── pr_message.md          (first line = title, rest = body)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use campaign_runner_developer_platforms::models::Repository;
use indoc::formatdoc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::CampaignError;

#[cfg(test)]
#[path = "campaign_tests.rs"]
mod tests;

pub const MANIFEST_FILE: &str = "campaign.toml";
pub const COMMIT_FILE: &str = "commit.txt";
pub const PR_MESSAGE_FILE: &str = "pr_message.md";
pub const COMMIT_FOOTER_FILE: &str = "commit_footer.txt";
pub const PR_MESSAGE_FOOTER_FILE: &str = "pr_message_footer.md";

/// Branch used for repositories given without one
pub const DEFAULT_BRANCH: &str = "main";

/// Name prefix of the generated declarative recipe
const RECIPE_NAME_PREFIX: &str = "org.jlleitschuh.research.SecurityFixRecipe";

lazy_static! {
    /// `origin/owner/name[@branch]`
    static ref REPOSITORY_REGEX: Regex =
        Regex::new(r"^(?P<origin>[^/@\s]+)/(?P<owner>[^/@\s]+)/(?P<name>[^/@\s]+)(@(?P<branch>\S+))?$")
            .expect("Failed to compile repository regex");
}

/// Parses a repository given as `origin/owner/name[@branch]`.
///
/// The branch defaults to `main`.
pub fn parse_repository(value: &str) -> Result<Repository, CampaignError> {
    let captures = REPOSITORY_REGEX
        .captures(value.trim())
        .ok_or_else(|| CampaignError::InvalidRepository(value.to_string()))?;

    Ok(Repository::new(
        &captures["origin"],
        format!("{}/{}", &captures["owner"], &captures["name"]),
        captures
            .name("branch")
            .map_or(DEFAULT_BRANCH, |branch| branch.as_str()),
    ))
}

#[derive(Debug, Deserialize)]
struct CampaignManifest {
    recipe_id: String,
    #[serde(alias = "branch_name")]
    branch: String,
}

/// A fully rendered campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Campaign {
    pub name: String,
    pub recipe_id: String,
    pub branch: String,
    pub commit_title: String,
    pub commit_extended: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl Campaign {
    /// The declarative recipe wrapping the campaign's recipe.
    ///
    /// The recipe is applicable to sources that are likely not tests, and its
    /// name carries `correlation_token` so that a run can be found in the
    /// run history if its submission times out.
    pub fn recipe_yaml(&self, correlation_token: &str) -> String {
        formatdoc! {"
            type: specs.openrewrite.org/v1beta/recipe
            name: {prefix}_{token}
            displayName: Apply `{recipe}`
            description: >
              Applies the `{recipe}` to non-test sources first, if changes are made, then apply to all sources.
            applicability:
              anySource:
                - org.openrewrite.java.search.IsLikelyNotTest
                - {recipe}
            recipeList:
              - {recipe}
            ",
            prefix = RECIPE_NAME_PREFIX,
            token = correlation_token,
            recipe = self.recipe_id,
        }
    }

    pub fn recipe_yaml_base64(&self, correlation_token: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.recipe_yaml(correlation_token))
    }

    pub fn commit_extended_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.commit_extended)
    }

    pub fn pr_body_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.pr_body)
    }

    /// Loads the campaign `name` from `campaigns_dir`.
    #[instrument]
    pub fn load(campaigns_dir: &Path, name: &str) -> Result<Self, CampaignError> {
        let campaign_dir = campaigns_dir.join(name);
        if !campaign_dir.is_dir() {
            return Err(load_error(
                name,
                format!("directory {} does not exist", campaign_dir.display()),
            ));
        }

        let manifest: CampaignManifest =
            toml::from_str(&read_required(name, &campaign_dir.join(MANIFEST_FILE))?)
                .map_err(|e| load_error(name, format!("{} is invalid: {}", MANIFEST_FILE, e)))?;

        let (commit_title, commit_body) =
            split_title_and_body(&read_required(name, &campaign_dir.join(COMMIT_FILE))?);
        let (pr_title, pr_body) =
            split_title_and_body(&read_required(name, &campaign_dir.join(PR_MESSAGE_FILE))?);

        let commit_footer = read_optional(name, &campaigns_dir.join(COMMIT_FOOTER_FILE))?;
        let pr_footer = read_optional(name, &campaigns_dir.join(PR_MESSAGE_FOOTER_FILE))?;

        debug!(recipe_id = %manifest.recipe_id, branch = %manifest.branch, "Loaded campaign");
        Ok(Self {
            name: name.to_string(),
            recipe_id: manifest.recipe_id,
            branch: manifest.branch,
            commit_title,
            commit_extended: commit_body + &commit_footer,
            pr_title,
            pr_body: pr_body + &pr_footer,
        })
    }

    /// Names of every campaign in `campaigns_dir`, sorted.
    pub fn list_campaigns(campaigns_dir: &Path) -> Result<Vec<String>, CampaignError> {
        let entries = fs::read_dir(campaigns_dir).map_err(|e| {
            CampaignError::ConfigError(format!(
                "Failed to read campaigns directory {}: {}",
                campaigns_dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path: PathBuf = entry
                .map_err(|e| CampaignError::ConfigError(e.to_string()))?
                .path();
            if path.join(MANIFEST_FILE).is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn load_error(name: &str, message: String) -> CampaignError {
    CampaignError::CampaignLoad {
        name: name.to_string(),
        message,
    }
}

fn read_required(name: &str, path: &Path) -> Result<String, CampaignError> {
    fs::read_to_string(path)
        .map_err(|e| load_error(name, format!("failed to read {}: {}", path.display(), e)))
}

fn read_optional(name: &str, path: &Path) -> Result<String, CampaignError> {
    if path.is_file() {
        read_required(name, path)
    } else {
        Ok(String::new())
    }
}

/// First line is the title; the remainder, trimmed and newline terminated, is
/// the body.
fn split_title_and_body(content: &str) -> (String, String) {
    let (title, body) = content.split_once('\n').unwrap_or((content, ""));
    (title.trim().to_string(), format!("{}\n", body.trim()))
}
