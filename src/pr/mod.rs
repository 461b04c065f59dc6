pub mod classify;
pub mod types;

pub use classify::classify;
pub use types::{ChangedFiles, PullRequestRef};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::context::EventContext;
use crate::github::{GitHubError, PullRequestApi};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Invalid pull request number: {0:?}")]
    InvalidInput(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Could not get pull request from context, exiting")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] GitHubError),
}

/// Determine the pull request this run applies to.
///
/// An explicit, non-empty `explicit_number` wins and is looked up through the API.
/// Otherwise the pull request carried by the event context is used, if any.
#[instrument(skip(api, context), fields(repo = %context.repository))]
pub async fn resolve(
    api: &dyn PullRequestApi,
    explicit_number: Option<&str>,
    context: &EventContext,
) -> Result<PullRequestRef, PrError> {
    let owner = &context.repository.owner;
    let repo = &context.repository.repo;

    if let Some(raw) = explicit_number.map(str::trim).filter(|s| !s.is_empty()) {
        let number = raw
            .parse::<u64>()
            .map_err(|_| PrError::InvalidInput(raw.to_string()))?;
        debug!(pr = number, "fetching explicitly requested pull request");
        let summary = api.get_pull_request(owner, repo, number).await?;
        return Ok(PullRequestRef {
            owner: owner.clone(),
            repo: repo.clone(),
            number: summary.number,
            changed_files: summary.changed_files,
        });
    }

    let pr = context.pull_request.as_ref().ok_or(PrError::NotFound)?;
    let changed_files = pr.changed_files.unwrap_or_else(|| {
        warn!(pr = pr.number, "event payload has no changed_files count, assuming 0");
        0
    });
    debug!(pr = pr.number, changed_files, "using pull request from event context");
    Ok(PullRequestRef {
        owner: owner.clone(),
        repo: repo.clone(),
        number: pr.number,
        changed_files,
    })
}
