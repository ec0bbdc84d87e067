//! Finding an already-open issue for a failing test.

use crate::config::Repository;
use crate::error::{ReportError, Result};
use crate::report::Identity;
use crate::tracker::{IssueTracker, cancellable};
use github_post_client::{IssueSearchResult, SearchOptions};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Search results fetched per lookup. A phrase search also matches longer
/// titles (`kv/storage: ...` for `storage: ...`), so more than one is read.
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Search phrase for open issues whose title contains `identity`'s issue title.
pub fn search_query(identity: &Identity, repository: &Repository) -> String {
    format!(
        "\"{}\" in:title repo:{} is:issue is:open",
        identity.title(),
        repository
    )
}

/// Number of the open issue already tracking `identity`, if any.
///
/// Any search failure is returned as an error; it never reads as "not found".
pub async fn find_existing<T>(
    tracker: &T,
    repository: &Repository,
    identity: &Identity,
    cancel: &CancellationToken,
) -> Result<Option<u64>>
where
    T: IssueTracker + ?Sized,
{
    let query = search_query(identity, repository);
    let result = cancellable(
        cancel,
        "search issues",
        &query,
        tracker.search_issues(&query, SearchOptions::first_page(SEARCH_PAGE_SIZE)),
    )
    .await?;
    interpret(&query, &identity.title(), result)
}

/// The issue titled exactly `title` wins; otherwise the first result.
fn interpret(query: &str, title: &str, result: IssueSearchResult) -> Result<Option<u64>> {
    if result.total_count == 0 {
        debug!(query, "no existing issue");
        return Ok(None);
    }
    let exact = result.items.iter().find(|issue| issue.title == title);
    match exact.or_else(|| result.items.first()) {
        Some(issue) => {
            debug!(query, total = result.total_count, number = issue.number, "found existing issue");
            Ok(Some(issue.number))
        }
        None => Err(ReportError::EmptySearchPage {
            query: query.to_string(),
            total: result.total_count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use github_post_client::Issue;

    const TITLE: &str = "storage: TestFoo failed under stress";

    fn identity() -> Identity {
        Identity {
            package_name: "storage".to_string(),
            test_name: "TestFoo".to_string(),
        }
    }

    fn issue(number: u64) -> Issue {
        Issue {
            id: number * 10,
            number,
            title: String::new(),
            html_url: None,
        }
    }

    #[test]
    fn test_search_query_quotes_title() {
        assert_eq!(
            search_query(&identity(), &Repository::new("o", "r")),
            "\"storage: TestFoo failed under stress\" in:title repo:o/r is:issue is:open"
        );
    }

    #[test]
    fn test_zero_total_is_not_found() {
        let result = IssueSearchResult {
            total_count: 0,
            incomplete_results: false,
            items: vec![issue(5)],
        };
        assert_eq!(interpret("q", TITLE, result).unwrap(), None);
    }

    #[test]
    fn test_first_item_wins_without_exact_title() {
        let result = IssueSearchResult {
            total_count: 3,
            incomplete_results: false,
            items: vec![issue(30), issue(12)],
        };
        assert_eq!(interpret("q", TITLE, result).unwrap(), Some(30));
    }

    #[test]
    fn test_exact_title_beats_longer_package_path() {
        let mut nested = issue(40);
        nested.title = "kv/storage: TestFoo failed under stress".to_string();
        let mut exact = issue(12);
        exact.title = TITLE.to_string();
        let result = IssueSearchResult {
            total_count: 2,
            incomplete_results: false,
            items: vec![nested, exact],
        };
        assert_eq!(interpret("q", TITLE, result).unwrap(), Some(12));
    }

    #[test]
    fn test_total_without_items_is_an_error() {
        let result = IssueSearchResult {
            total_count: 1,
            incomplete_results: true,
            items: vec![],
        };
        assert!(matches!(
            interpret("q", TITLE, result),
            Err(ReportError::EmptySearchPage { total: 1, .. })
        ));
    }
}
