use serde::Deserialize;

/// The pull request a run applies to.
/// Resolved once per run, either from an explicit number or from the event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    /// PR number (e.g., 42)
    pub number: u64,
    /// Total changed files as last reported by the API
    pub changed_files: u64,
}

/// Change kind reported by the GitHub API for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    /// `copied`, `changed`, `unchanged` and anything GitHub adds later
    #[serde(other)]
    Other,
}

/// One entry of the pull request files listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFileRecord {
    pub filename: String,
    pub status: FileStatus,
    /// Only set when `status` is `renamed`
    #[serde(default)]
    pub previous_filename: Option<String>,
}

/// Filenames sorted into the three output buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFiles {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangedFiles {
    pub fn count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}
