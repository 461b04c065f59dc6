use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Failed to read event payload: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),

    #[error("Repository not supplied, set GITHUB_REPOSITORY or --repository")]
    MissingRepository,
}

/// Repository the run operates on, as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn parse(slug: &str) -> Result<RepoSlug, ContextError> {
        match slug.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(RepoSlug {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ContextError::InvalidRepository(slug.to_string())),
        }
    }

    /// Parse an optional `owner/repo` input, failing when it was never supplied.
    pub fn from_input(input: Option<&str>) -> Result<RepoSlug, ContextError> {
        input
            .ok_or(ContextError::MissingRepository)
            .and_then(Self::parse)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Pull request as embedded in a `pull_request` event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPullRequest {
    pub number: u64,
    /// Absent from some payloads (e.g. synthetic events); treated as zero.
    #[serde(default)]
    pub changed_files: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<EventPullRequest>,
}

/// The invocation context a run was triggered with.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub repository: RepoSlug,
    pub pull_request: Option<EventPullRequest>,
}

impl EventContext {
    /// Context with no pull request attached.
    pub fn empty(repository: RepoSlug) -> Self {
        Self {
            repository,
            pull_request: None,
        }
    }

    /// Build a context from the event payload at `event_path`.
    /// A missing path or a payload without `pull_request` yields an empty context.
    pub fn load(repository: RepoSlug, event_path: Option<&Path>) -> Result<Self, ContextError> {
        let Some(path) = event_path.filter(|p| p.exists()) else {
            debug!("no event payload available");
            return Ok(Self::empty(repository));
        };
        let contents = fs::read_to_string(path)?;
        let context = Self::from_payload(repository, &contents)?;
        debug!(
            path = %path.display(),
            has_pull_request = context.pull_request.is_some(),
            "loaded event payload"
        );
        Ok(context)
    }

    pub fn from_payload(repository: RepoSlug, payload: &str) -> Result<Self, ContextError> {
        let payload: EventPayload = serde_json::from_str(payload)?;
        Ok(Self {
            repository,
            pull_request: payload.pull_request,
        })
    }
}
