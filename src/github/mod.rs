use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::types::ChangedFileRecord;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub token is empty")]
    MissingToken,
}

/// The subset of a pull request's metadata needed to page through its files.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub changed_files: u64,
}

/// Read-only view of the GitHub pulls API.
///
/// Implemented by [`GitHubClient`] for real runs and by in-memory fakes in tests.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestSummary, GitHubError>;

    /// List one page of the files changed by a pull request.
    /// `page_index` is 0-based.
    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<ChangedFileRecord>, GitHubError>;
}

/// reqwest-backed client for the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, GitHubError> {
        if token.trim().is_empty() {
            return Err(GitHubError::MissingToken);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn pull_url(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/repos/{}/{}/pulls/{}", self.api_url, owner, repo, number)
    }
}

/// Query for one page of the files listing. GitHub pages are 1-based.
fn files_query(page_index: u64, per_page: u64) -> [(&'static str, u64); 2] {
    [("page", page_index + 1), ("per_page", per_page)]
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestSummary, GitHubError> {
        debug!("fetching PR metadata from GitHub API");
        let summary = self
            .http
            .get(self.pull_url(owner, repo, number))
            .header("User-Agent", "pr-changed-files")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<PullRequestSummary>()
            .await?;
        debug!(changed_files = summary.changed_files, "received PR metadata");
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<ChangedFileRecord>, GitHubError> {
        let url = format!("{}/files", self.pull_url(owner, repo, number));
        let files = self
            .http
            .get(url)
            .query(&files_query(page_index, per_page))
            .header("User-Agent", "pr-changed-files")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ChangedFileRecord>>()
            .await?;
        debug!(records = files.len(), "received changed files page");
        Ok(files)
    }
}
