//! # GitHub Post Client
//!
//! A minimal GitHub REST transport for the stress-failure poster. It covers exactly
//! the three calls the poster makes: opening an issue, searching issues, and
//! commenting on an existing issue.
//!
//! Non-2xx responses are reported as [`error::GitHubError::Api`] with the message
//! GitHub returned. Nothing is retried.
//!
//! ## Usage
//!
//! ```no_run
//! use github_post_client::{GitHubClient, SearchOptions};
//! use std::time::Duration;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(
//!     Url::parse("https://api.github.com")?,
//!     "ghp_token",
//!     Duration::from_secs(60),
//! )?;
//! let result = client
//!     .search_issues("\"flaky test\" repo:owner/repo is:issue is:open", SearchOptions::first_match())
//!     .await?;
//! println!("{} matching issues", result.total_count);
//! # Ok(())
//! # }
//! ```

/// REST client.
pub mod client;
/// Error types for GitHub API operations.
pub mod error;
/// Request and response payloads.
pub mod models;

pub use client::{DEFAULT_API_URL, GitHubClient};
pub use error::{GitHubError, Result};
pub use models::{
    Issue, IssueComment, IssueCommentRequest, IssueRequest, IssueSearchResult, SearchOptions,
};
