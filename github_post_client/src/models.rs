use serde::{Deserialize, Serialize};

/// Payload for `POST /repos/{owner}/{repo}/issues`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
}

/// Payload for `POST /repos/{owner}/{repo}/issues/{number}/comments`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueCommentRequest {
    pub body: String,
}

/// The subset of a GitHub issue this tool reads back.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Response of `GET /search/issues`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueSearchResult {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<Issue>,
}

/// Paging options for search requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub per_page: u32,
    pub page: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: 30,
            page: 1,
        }
    }
}

impl SearchOptions {
    /// Options asking for only the best match.
    pub fn first_match() -> Self {
        Self::first_page(1)
    }

    /// The first page, holding up to `per_page` results.
    pub fn first_page(per_page: u32) -> Self {
        Self { per_page, page: 1 }
    }
}

/// Error payload GitHub returns alongside non-2xx statuses.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
