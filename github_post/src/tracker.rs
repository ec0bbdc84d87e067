//! # Issue Tracker Seam
//!
//! The reporter never talks to GitHub directly. It goes through [`IssueTracker`],
//! three independent operations that [`GitHubClient`] implements over HTTP and that
//! tests replace with in-memory doubles.

use crate::error::ReportError;
use async_trait::async_trait;
use github_post_client::{
    GitHubClient, Issue, IssueComment, IssueCommentRequest, IssueRequest, IssueSearchResult,
    SearchOptions,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        issue: &IssueRequest,
    ) -> github_post_client::Result<Issue>;

    async fn search_issues(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> github_post_client::Result<IssueSearchResult>;

    async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment: &IssueCommentRequest,
    ) -> github_post_client::Result<IssueComment>;
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        issue: &IssueRequest,
    ) -> github_post_client::Result<Issue> {
        GitHubClient::create_issue(self, owner, repo, issue).await
    }

    async fn search_issues(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> github_post_client::Result<IssueSearchResult> {
        GitHubClient::search_issues(self, query, options).await
    }

    async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment: &IssueCommentRequest,
    ) -> github_post_client::Result<IssueComment> {
        GitHubClient::create_comment(self, owner, repo, number, comment).await
    }
}

/// Await a tracker call unless `cancel` fires first.
///
/// Cancellation and transport failures both become fatal [`ReportError`]s.
pub async fn cancellable<T, F>(
    cancel: &CancellationToken,
    operation: &'static str,
    subject: &str,
    call: F,
) -> Result<T, ReportError>
where
    F: Future<Output = github_post_client::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReportError::Cancelled { operation }),
        result = call => result.map_err(|source| ReportError::Tracker {
            operation,
            subject: subject.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use github_post_client::GitHubError;

    #[tokio::test]
    async fn test_cancellable_passes_through_success() {
        let cancel = CancellationToken::new();
        let value = cancellable(&cancel, "search", "q", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancellable_wraps_transport_error() {
        let cancel = CancellationToken::new();
        let err = cancellable::<(), _>(&cancel, "search", "the query", async {
            Err(GitHubError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        })
        .await
        .unwrap_err();
        match err {
            ReportError::Tracker {
                operation, subject, ..
            } => {
                assert_eq!(operation, "search");
                assert_eq!(subject, "the query");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let never = std::future::pending::<github_post_client::Result<()>>();
        let err = cancellable(&cancel, "create issue", "t", never)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Cancelled {
                operation: "create issue"
            }
        ));
    }
}
