//! Plain HTTP access to repository hosts and static data files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::{errors::Error, FileFetcher};

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;

/// Host serving raw repository content.
pub const RAW_CONTENT_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Path of the robots-exclusion file inside a repository.
pub const ROBOTS_FILE_PATH: &str = ".github/GH-ROBOTS.txt";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the raw-content URL of the robots-exclusion file of a repository
/// branch.
///
/// # Examples
///
/// ```
/// use campaign_runner_developer_platforms::github::robots_file_url;
///
/// assert_eq!(
///     robots_file_url("https://raw.githubusercontent.com", "acme", "widgets", "main"),
///     "https://raw.githubusercontent.com/acme/widgets/main/.github/GH-ROBOTS.txt"
/// );
/// ```
pub fn robots_file_url(base_url: &str, owner: &str, repo: &str, branch: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        owner,
        repo,
        branch,
        ROBOTS_FILE_PATH
    )
}

/// [`FileFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFileFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFileFetcher {
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("campaign-runner/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build the HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    #[instrument(skip(self))]
    async fn fetch_file(&self, url: &str) -> Result<Option<String>, Error> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    elapsed: self.timeout,
                }
            } else {
                Error::Transport(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| Error::InvalidResponse(format!("unreadable body: {}", e)))?;
                debug!(bytes = body.len(), "Fetched file");
                Ok(Some(body))
            }
            StatusCode::NOT_FOUND => {
                debug!("File not found");
                Ok(None)
            }
            status => {
                warn!(status = status.as_u16(), "Unexpected status while fetching file");
                Err(Error::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                })
            }
        }
    }
}
