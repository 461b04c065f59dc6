use regex::Regex;
use tracing::{debug, instrument};

use super::types::{ChangedFileRecord, ChangedFiles, FileStatus, PullRequestRef};
use super::PrError;
use crate::github::PullRequestApi;

/// Page size used when listing pull request files (GitHub's maximum).
pub const PER_PAGE: u64 = 100;

/// Filename filter. No pattern, or an empty one, matches everything.
#[derive(Debug, Clone)]
pub struct FileFilter {
    re: Option<Regex>,
}

impl FileFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self, PrError> {
        let re = match pattern.filter(|p| !p.is_empty()) {
            Some(p) => Some(Regex::new(p)?),
            None => None,
        };
        Ok(Self { re })
    }

    pub fn matches(&self, filename: &str) -> bool {
        self.re.as_ref().is_none_or(|re| re.is_match(filename))
    }
}

/// Pages needed to list `total` files.
fn page_count(total: u64) -> u64 {
    total.div_ceil(PER_PAGE)
}

impl ChangedFiles {
    /// Sort one record into its bucket(s). The record's filename must already
    /// have passed `filter`; the previous name of a rename is checked here.
    fn push(&mut self, record: ChangedFileRecord, filter: &FileFilter) {
        match record.status {
            FileStatus::Added => self.created.push(record.filename),
            FileStatus::Removed => self.deleted.push(record.filename),
            FileStatus::Modified => self.updated.push(record.filename),
            FileStatus::Renamed => {
                self.created.push(record.filename);
                if let Some(previous) = record.previous_filename {
                    if filter.matches(&previous) {
                        self.deleted.push(previous);
                    }
                }
            }
            FileStatus::Other => {}
        }
    }
}

/// Fetch every page of files changed by `pr` and sort the matching ones into
/// created/updated/deleted.
///
/// The number of pages comes from `pr.changed_files` alone; short pages do not
/// end the loop early.
#[instrument(skip(api, pattern), fields(repo = %pr.repo, pr = pr.number, total = pr.changed_files))]
pub async fn classify(
    api: &dyn PullRequestApi,
    pr: &PullRequestRef,
    pattern: Option<&str>,
) -> Result<ChangedFiles, PrError> {
    let filter = FileFilter::new(pattern)?;
    let mut changed = ChangedFiles::default();

    for page_index in 0..page_count(pr.changed_files) {
        let records = api
            .list_changed_files(&pr.owner, &pr.repo, pr.number, page_index, PER_PAGE)
            .await?;
        debug!(page = page_index, records = records.len(), "classifying page");

        for record in records {
            if filter.matches(&record.filename) {
                changed.push(record, &filter);
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::tests::{record, renamed, test_pr_ref, FakeApi};

    #[test]
    fn test_empty_pattern_matches_everything() {
        for pattern in [None, Some("")] {
            let filter = FileFilter::new(pattern).unwrap();
            assert!(filter.matches("src/main.rs"));
            assert!(filter.matches(""));
        }
    }

    #[test]
    fn test_pattern_is_unanchored_search() {
        let filter = FileFilter::new(Some("src/")).unwrap();
        assert!(filter.matches("crates/core/src/lib.rs"));
        assert!(!filter.matches("README.md"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            FileFilter::new(Some("(unclosed")),
            Err(PrError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(100), 1);
        assert_eq!(page_count(201), 3);
        assert_eq!(page_count(u64::MAX), u64::MAX / 100 + 1);
    }

    #[tokio::test]
    async fn test_zero_files_fetches_no_pages() {
        let api = FakeApi::default();
        let changed = classify(&api, &test_pr_ref(0), None).await.unwrap();
        assert_eq!(changed, ChangedFiles::default());
        assert_eq!(changed.count(), 0);
        assert!(api.page_calls().is_empty());
    }

    #[tokio::test]
    async fn test_one_page_all_statuses() {
        let api = FakeApi::with_pages(vec![vec![
            record("a.txt", FileStatus::Modified),
            record("b.txt", FileStatus::Added),
            record("c.txt", FileStatus::Removed),
        ]]);
        let changed = classify(&api, &test_pr_ref(3), None).await.unwrap();
        assert_eq!(changed.created, vec!["b.txt"]);
        assert_eq!(changed.updated, vec!["a.txt"]);
        assert_eq!(changed.deleted, vec!["c.txt"]);
        assert_eq!(changed.count(), 3);
        assert_eq!(api.page_calls(), vec![(0, 100)]);
    }

    #[tokio::test]
    async fn test_rename_with_both_names_matching() {
        let api = FakeApi::with_pages(vec![vec![renamed("new.ts", "old.ts")]]);
        let changed = classify(&api, &test_pr_ref(1), Some(r"\.ts$")).await.unwrap();
        assert_eq!(changed.created, vec!["new.ts"]);
        assert_eq!(changed.deleted, vec!["old.ts"]);
        assert!(changed.updated.is_empty());
    }

    #[tokio::test]
    async fn test_rename_with_previous_name_filtered_out() {
        let api = FakeApi::with_pages(vec![vec![renamed("new.ts", "old.ts")]]);
        let changed = classify(&api, &test_pr_ref(1), Some("^new")).await.unwrap();
        assert_eq!(changed.created, vec!["new.ts"]);
        assert!(changed.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_rename_with_new_name_filtered_out() {
        // old.ts would match, but the record is dropped before classification
        let api = FakeApi::with_pages(vec![vec![renamed("new.rs", "old.ts")]]);
        let changed = classify(&api, &test_pr_ref(1), Some(r"\.ts$")).await.unwrap();
        assert_eq!(changed.count(), 0);
    }

    #[tokio::test]
    async fn test_filter_runs_before_classification() {
        let api = FakeApi::with_pages(vec![vec![
            record("docs/guide.md", FileStatus::Added),
            record("src/lib.rs", FileStatus::Added),
            record("docs/api.md", FileStatus::Removed),
            record("src/main.rs", FileStatus::Modified),
        ]]);
        let changed = classify(&api, &test_pr_ref(4), Some(r"^src/")).await.unwrap();
        assert_eq!(changed.created, vec!["src/lib.rs"]);
        assert_eq!(changed.updated, vec!["src/main.rs"]);
        assert!(changed.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_ignored() {
        let api = FakeApi::with_pages(vec![vec![
            record("copy.txt", FileStatus::Other),
            record("kept.txt", FileStatus::Modified),
        ]]);
        let changed = classify(&api, &test_pr_ref(2), None).await.unwrap();
        assert_eq!(changed.updated, vec!["kept.txt"]);
        assert_eq!(changed.count(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept_in_fetch_order() {
        let api = FakeApi::with_pages(vec![
            vec![record("z.txt", FileStatus::Added), record("a.txt", FileStatus::Added)],
            vec![record("z.txt", FileStatus::Added)],
        ]);
        let changed = classify(&api, &test_pr_ref(101), None).await.unwrap();
        assert_eq!(changed.created, vec!["z.txt", "a.txt", "z.txt"]);
        assert_eq!(changed.count(), 3);
    }

    #[tokio::test]
    async fn test_pagination_boundary() {
        for (total, expected) in [(1, 1), (100, 1), (101, 2), (200, 2), (201, 3)] {
            let api = FakeApi::default();
            classify(&api, &test_pr_ref(total), None).await.unwrap();
            let pages: Vec<u64> = api.page_calls().iter().map(|(page, _)| *page).collect();
            assert_eq!(pages, (0..expected).collect::<Vec<u64>>(), "total = {}", total);
            assert!(api.page_calls().iter().all(|(_, per_page)| *per_page == PER_PAGE));
        }
    }

    #[tokio::test]
    async fn test_short_page_does_not_stop_pagination() {
        let api = FakeApi::with_pages(vec![vec![record("only.txt", FileStatus::Added)]]);
        let changed = classify(&api, &test_pr_ref(201), None).await.unwrap();
        assert_eq!(changed.created, vec!["only.txt"]);
        assert_eq!(api.page_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_run() {
        let api = FakeApi {
            pages: vec![vec![record("a.txt", FileStatus::Added)]],
            fail_on_page: Some(1),
            ..FakeApi::default()
        };
        let err = classify(&api, &test_pr_ref(150), None).await.unwrap_err();
        assert!(matches!(err, PrError::Upstream(_)));
        assert_eq!(api.page_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_pattern_fails_before_fetching() {
        let api = FakeApi::default();
        let err = classify(&api, &test_pr_ref(5), Some("[")).await.unwrap_err();
        assert!(matches!(err, PrError::InvalidPattern(_)));
        assert!(api.page_calls().is_empty());
    }
}
